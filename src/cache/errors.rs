use std::path::PathBuf;

use thiserror::Error;

use crate::cache::key::CacheKey;
use crate::fetcher::FetchError;
use crate::rewrite::RewriteError;

#[derive(Error, Debug)]
pub enum CacheError {
    /// The request cannot name a cache entry (bad package reference, asset
    /// path escaping the origin).
    #[error("invalid cache request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("origin fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The entry was written but could not be opened again.
    #[error("cache entry {0} vanished after write")]
    Vanished(CacheKey),

    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
