//! Flat key/value byte storage backing the caches.

use async_trait::async_trait;
use axum::body::Body;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::cache::errors::CacheError;
use crate::cache::key::CacheKey;
use crate::fetcher::AssetStream;

/// Write-once byte store. Entries are never updated or removed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Stream an entry back out, `None` if it does not exist.
    async fn open(&self, key: &CacheKey) -> Result<Option<Body>, CacheError>;

    async fn exists(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Drain `body` into the entry for `key` unless one is already there.
    /// Returns whether this call created the entry. Readers never see
    /// partial data.
    async fn put_if_absent(&self, key: &CacheKey, body: &mut AssetStream)
    -> Result<bool, CacheError>;

    /// Every stored key, in no particular order.
    async fn keys(&self) -> Result<Vec<CacheKey>, CacheError>;
}

/// A temp file that is removed when dropped, unless it was renamed into
/// place. Covers early returns and requests cancelled mid-write.
struct PartFile {
    path: PathBuf,
    kept: bool,
}

impl PartFile {
    fn new(path: PathBuf) -> Self {
        Self { path, kept: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to remove temp file");
            }
        }
    }
}

/// One directory, one file per key, no index: the listing is the membership.
///
/// Writes go to a hidden temp file in the same directory and are renamed into
/// place, so a key either does not exist or holds the complete body.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open (and create if needed) the directory at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, CacheError> {
        let root = root.as_ref().to_path_buf();
        // One-off at startup, no need for the async variant.
        std::fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(format!(".{}.part", uuid::Uuid::new_v4().simple()))
    }

    async fn write_temp(path: &Path, body: &mut AssetStream) -> Result<(), CacheError> {
        let mut file = fs::File::create(path)
            .await
            .map_err(|e| CacheError::io(path, e))?;
        while let Some(chunk) = body.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| CacheError::io(path, e))?;
        }
        file.sync_all().await.map_err(|e| CacheError::io(path, e))
    }
}

#[async_trait]
impl ByteStore for DiskStore {
    async fn open(&self, key: &CacheKey) -> Result<Option<Body>, CacheError> {
        let path = self.path(key);
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::io(path, err)),
        };
        let metadata = file
            .metadata()
            .await
            .map_err(|e| CacheError::io(&path, e))?;
        if !metadata.is_file() {
            return Err(CacheError::io(
                path,
                std::io::Error::other("cache entry is not a regular file"),
            ));
        }
        Ok(Some(Body::from_stream(ReaderStream::new(file))))
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let path = self.path(key);
        fs::try_exists(&path)
            .await
            .map_err(|e| CacheError::io(path, e))
    }

    async fn put_if_absent(
        &self,
        key: &CacheKey,
        body: &mut AssetStream,
    ) -> Result<bool, CacheError> {
        if self.exists(key).await? {
            return Ok(false);
        }

        let temp = PartFile::new(self.temp_path());
        Self::write_temp(temp.path(), body).await?;

        // Same bytes for the same key, so a concurrent writer winning the
        // rename is harmless.
        let path = self.path(key);
        fs::rename(temp.path(), &path)
            .await
            .map_err(|e| CacheError::io(&path, e))?;
        temp.keep();
        debug!(key = %key, bytes = body.bytes_read(), "stored cache entry");
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<CacheKey>, CacheError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::io(&self.root, e))?;
        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.root, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map_err(|e| CacheError::io(entry.path(), e))?
                .is_file();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_file {
                continue;
            }
            // temp files and anything else that is not a valid key
            if let Ok(key) = CacheKey::new(name) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
