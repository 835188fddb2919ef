//! Origin URL → mirror path rewriting.
//!
//! Every rule is a pure function of its input. Links that no rule recognises
//! are returned unchanged, except download links: those become cache keys and
//! must fail loudly instead.

pub mod errors;
pub mod package;

pub use errors::RewriteError;
pub use package::PackageRef;

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::rewrite::package::DOWNLOAD_PATH;

/// Mirror-relative prefixes. Pages are served one level deep (`/a/<id>`,
/// `/s/`), so `../` lands on the mirror root.
pub const ASSET_PREFIX: &str = "../p/";
pub const PACKAGE_PREFIX: &str = "../g/";
pub const ADDON_PREFIX: &str = "../a/";

static SRC_ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bsrc="([^"]*)""#).unwrap());

#[derive(Debug, Clone)]
pub struct LinkRewriter {
    origin: Url,
    origin_prefix: String,
}

impl LinkRewriter {
    /// `origin` must be a base URL ending in `/` (see [`crate::config::Config`]).
    pub fn new(origin: Url) -> Self {
        let origin_prefix = origin.as_str().to_string();
        Self {
            origin,
            origin_prefix,
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// `<origin>/<rest>` → `../p/<rest>`, with `<rest>` (query included) kept
    /// byte for byte. Anything else is returned as is.
    pub fn rewrite_asset_url(&self, url: &str) -> String {
        match url.strip_prefix(&self.origin_prefix) {
            Some(rest) if !rest.is_empty() => format!("{ASSET_PREFIX}{rest}"),
            _ => url.to_string(),
        }
    }

    /// `<origin>/firefox/downloads/file/<id>/<filename>` → `<id>_<filename>`.
    ///
    /// Relative links are resolved against the origin first. The query string
    /// (download source tracking) is not part of the package identity.
    pub fn rewrite_download_url(&self, url: &str) -> Result<PackageRef, RewriteError> {
        let malformed = || RewriteError::MalformedDownloadUrl(url.to_string());
        let owned = self.origin_segments(url).ok_or_else(malformed)?;
        let segments: Vec<&str> = owned.iter().map(String::as_str).collect();
        match segments.as_slice() {
            [a, b, c, id, filename] if [*a, *b, *c] == DOWNLOAD_PATH => {
                PackageRef::new(*id, *filename).map_err(|_| malformed())
            }
            _ => Err(malformed()),
        }
    }

    /// `/<locale>/firefox/addon/<id>/...` → `../a/<id>`. Other links unchanged.
    pub fn rewrite_addon_link(&self, href: &str) -> String {
        let Some(owned) = self.origin_segments(href) else {
            return href.to_string();
        };
        let segments: Vec<&str> = owned.iter().map(String::as_str).collect();
        match segments.as_slice() {
            [_locale, "firefox", "addon", id, ..] if !id.is_empty() => {
                format!("{ADDON_PREFIX}{id}")
            }
            _ => href.to_string(),
        }
    }

    /// Apply [`rewrite_asset_url`](Self::rewrite_asset_url) to every `src`
    /// attribute of a serialised HTML fragment.
    pub fn rewrite_fragment_sources(&self, html: &str) -> String {
        SRC_ATTR_REGEX
            .replace_all(html, |caps: &regex::Captures| {
                format!(r#"src="{}""#, self.rewrite_asset_url(&caps[1]))
            })
            .into_owned()
    }

    /// Path segments below the origin base, if `link` resolves onto the origin.
    fn origin_segments(&self, link: &str) -> Option<Vec<String>> {
        let url = self.origin.join(link.trim()).ok()?;
        if url.origin() != self.origin.origin() {
            return None;
        }
        let rest = url.path().strip_prefix(self.origin.path())?;
        Some(rest.split('/').map(str::to_string).collect())
    }
}
