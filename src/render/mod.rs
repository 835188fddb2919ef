//! Page templates with flat `---token---` substitution.

use anyhow::Context;
use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use crate::extractor::{AddonPage, SearchEntry};

pub const SITE_NAME: &str = "foxmirror";

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"---[a-z-]+---").unwrap());

pub mod tokens {
    pub const TITLE: &str = "---title---";
    pub const EXT_NAME: &str = "---ext-name---";
    pub const DEVELOPER: &str = "---developer---";
    pub const SUMMARY: &str = "---summary---";
    pub const DL_BUTTON: &str = "---dl-button---";
    pub const DESCRIPTION: &str = "---description---";
    pub const SCREENSHOTS: &str = "---screenshots---";
    pub const ICON: &str = "---icon---";
    pub const STARS: &str = "---stars---";
    pub const USERS: &str = "---users---";
    pub const REVIEWS: &str = "---reviews---";
    pub const MORE_INFO: &str = "---moreinfo---";
    pub const RELEASE_NOTES: &str = "---release-notes---";
    pub const QUERY: &str = "---query---";
    pub const RESULTS: &str = "---results---";
}

/// Template text, loaded once and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    source: String,
}

impl PageTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Replace every occurrence of each token in one pass over the template,
    /// so inserted values are never scanned for tokens. Unknown tokens are
    /// left as they are. No escaping happens here.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        TOKEN_REGEX
            .replace_all(&self.source, |caps: &Captures| {
                let token = &caps[0];
                values
                    .iter()
                    .find(|(name, _)| *name == token)
                    .map_or_else(|| token.to_string(), |(_, value)| value.to_string())
            })
            .into_owned()
    }
}

/// The three pages the mirror renders.
#[derive(Debug, Clone)]
pub struct Templates {
    pub home: PageTemplate,
    pub addon: PageTemplate,
    pub query: PageTemplate,
}

impl Templates {
    /// Read `home.html`, `addon.html` and `query.html` from `dir`.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let read = |name: &str| -> anyhow::Result<PageTemplate> {
            let path = dir.join(name);
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("read template: {}", path.display()))?;
            Ok(PageTemplate::new(source))
        };
        Ok(Self {
            home: read("home.html")?,
            addon: read("addon.html")?,
            query: read("query.html")?,
        })
    }
}

/// Fill the addon template. Text is escaped, serialised fragments are not.
pub fn render_addon_page(page: &AddonPage, template: &PageTemplate) -> String {
    let title = if page.name.is_empty() {
        SITE_NAME.to_string()
    } else {
        format!("{SITE_NAME} - {}", page.name)
    };
    let screenshots = page.screenshots.concat();

    template.render(&[
        (tokens::TITLE, &*encode_text(&title)),
        (tokens::EXT_NAME, &*encode_text(&page.name)),
        (tokens::DEVELOPER, &*encode_text(&page.developer)),
        (tokens::SUMMARY, &*encode_text(&page.summary)),
        (
            tokens::DL_BUTTON,
            &*encode_double_quoted_attribute(&page.install_link),
        ),
        (tokens::DESCRIPTION, &*encode_text(&page.description)),
        (tokens::SCREENSHOTS, screenshots.as_str()),
        (tokens::ICON, &*encode_double_quoted_attribute(&page.icon)),
        (tokens::STARS, &*encode_text(&page.stars)),
        (tokens::USERS, &*encode_text(&page.users)),
        (tokens::REVIEWS, &*encode_text(&page.reviews)),
        (tokens::MORE_INFO, page.more_info.as_str()),
        (tokens::RELEASE_NOTES, page.release_notes.as_str()),
    ])
}

/// One result line per entry, linking to the mirrored addon page.
pub fn render_search_entry(entry: &SearchEntry) -> String {
    format!(
        r#"<div class="SearchResult-contents"><h2 class="SearchResult-name"><a class="SearchResult-link" href="{}">{}</a></h2></div>"#,
        encode_double_quoted_attribute(&entry.link),
        encode_text(&entry.name),
    )
}

pub fn render_search_page(query: &str, entries: &[SearchEntry], template: &PageTemplate) -> String {
    let results: String = entries.iter().map(render_search_entry).collect();
    template.render(&[
        (tokens::QUERY, &*encode_double_quoted_attribute(query)),
        (tokens::RESULTS, results.as_str()),
    ])
}
