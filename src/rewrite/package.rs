use std::fmt::{Display, Formatter};

use url::Url;

use crate::cache::key::MAX_KEY_LEN;
use crate::rewrite::errors::RewriteError;

/// Path of origin package downloads, below the origin base.
pub const DOWNLOAD_PATH: [&str; 3] = ["firefox", "downloads", "file"];

/// `<id>_<filename>`: the mirror's name for an origin package download, used
/// both in `/g/` links and as the package cache filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    id: String,
    filename: String,
}

impl PackageRef {
    pub fn new(id: impl Into<String>, filename: impl Into<String>) -> Result<Self, RewriteError> {
        let id = id.into();
        let filename = filename.into();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RewriteError::MalformedPackageRef(format!("{id}_{filename}")));
        }
        // the reference doubles as a cache filename
        if !is_safe_filename(&filename) || id.len() + 1 + filename.len() > MAX_KEY_LEN {
            return Err(RewriteError::MalformedPackageRef(format!("{id}_{filename}")));
        }
        Ok(Self { id, filename })
    }

    /// Parse a key produced by [`PackageRef::key`]. The id is everything
    /// before the first `_`.
    pub fn parse(key: &str) -> Result<Self, RewriteError> {
        let (id, filename) = key
            .split_once('_')
            .ok_or_else(|| RewriteError::MalformedPackageRef(key.to_string()))?;
        Self::new(id, filename)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn key(&self) -> String {
        self.to_string()
    }

    /// `<origin>/firefox/downloads/file/<id>/<filename>`
    pub fn origin_url(&self, origin: &Url) -> Result<Url, RewriteError> {
        let raw = format!(
            "{}{}/{}/{}",
            origin,
            DOWNLOAD_PATH.join("/"),
            self.id,
            self.filename
        );
        Url::parse(&raw).map_err(|_| RewriteError::MalformedPackageRef(self.key()))
    }
}

impl Display for PackageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.id, self.filename)
    }
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0', '?', '#'])
}
