use std::fmt::{Display, Formatter};

use url::Url;

use crate::cache::errors::CacheError;

/// Longest key kept verbatim. Longer keys are cut and suffixed with a digest
/// so they stay valid filenames on every common filesystem.
pub const MAX_KEY_LEN: usize = 200;
const KEY_DELIMITER: char = '_';

/// Name of a cache entry, and of its file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Accept an already-derived key. Rejects anything that is not a single,
    /// visible path component.
    pub fn new(key: impl Into<String>) -> Result<Self, CacheError> {
        let key = key.into();
        if key.is_empty()
            || key.len() > MAX_KEY_LEN
            || key.starts_with('.')
            || key.contains(['/', '\\', '\0'])
        {
            return Err(CacheError::InvalidRequest(key));
        }
        Ok(Self(key))
    }

    /// Flatten an absolute URL into a key: every `/` becomes `_`.
    pub fn for_url(url: &Url) -> Self {
        let flat: String = url
            .as_str()
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => KEY_DELIMITER,
                c => c,
            })
            .collect();
        if flat.len() <= MAX_KEY_LEN {
            return Self(flat);
        }
        let digest = format!("{:x}", md5::compute(url.as_str().as_bytes()));
        let mut cut = MAX_KEY_LEN - digest.len() - 1;
        while !flat.is_char_boundary(cut) {
            cut -= 1;
        }
        Self(format!("{}{}{}", &flat[..cut], KEY_DELIMITER, digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
