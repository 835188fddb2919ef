//! Fetch-or-serve caches for origin resources.
//!
//! [`AssetCache`] and [`PackageCache`] are the same [`Cache`] over a
//! [`ByteStore`], differing only in how a request maps to a key and an origin
//! URL ([`KeyScheme`]).

pub mod errors;
pub mod key;
pub mod store;

pub use errors::CacheError;
pub use key::CacheKey;
pub use store::{ByteStore, DiskStore};

use axum::body::Body;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use url::Url;

use crate::fetcher::fetch_asset;
use crate::rewrite::PackageRef;

/// Maps a mirror request onto a cache key and the origin URL to fill it from.
pub trait KeyScheme: Send + Sync + 'static {
    const KIND: &'static str;

    fn resolve(&self, request: &str) -> Result<(CacheKey, Url), CacheError>;
}

/// `/p/<path>`: the key is the flattened absolute origin URL.
#[derive(Debug, Clone)]
pub struct AssetKeys {
    origin: Url,
}

impl AssetKeys {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }
}

impl KeyScheme for AssetKeys {
    const KIND: &'static str = "asset";

    fn resolve(&self, request: &str) -> Result<(CacheKey, Url), CacheError> {
        let path = request.trim_start_matches('/');
        if path.is_empty() {
            return Err(CacheError::InvalidRequest(request.to_string()));
        }
        let url = self
            .origin
            .join(path)
            .map_err(|_| CacheError::InvalidRequest(request.to_string()))?;
        // never let a proxied path leave the origin
        if url.origin() != self.origin.origin() {
            return Err(CacheError::InvalidRequest(request.to_string()));
        }
        Ok((CacheKey::for_url(&url), url))
    }
}

/// `/g/<id>_<filename>`: the key is the package reference itself.
#[derive(Debug, Clone)]
pub struct PackageKeys {
    origin: Url,
}

impl PackageKeys {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }
}

impl KeyScheme for PackageKeys {
    const KIND: &'static str = "package";

    fn resolve(&self, request: &str) -> Result<(CacheKey, Url), CacheError> {
        let package = PackageRef::parse(request)?;
        let url = package.origin_url(&self.origin)?;
        Ok((CacheKey::new(package.key())?, url))
    }
}

/// Body served for a cache request, streamed from the stored entry.
pub struct CachedBody {
    pub key: CacheKey,
    pub body: Body,
    /// Served from disk without contacting the origin.
    pub hit: bool,
}

impl fmt::Debug for CachedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedBody")
            .field("key", &self.key)
            .field("hit", &self.hit)
            .finish_non_exhaustive()
    }
}

type Inflight = DashMap<CacheKey, Arc<Mutex<()>>>;

/// Prunes the in-flight entry for a key once nobody else holds its lock,
/// including when the request is dropped halfway.
struct InflightSlot<'a> {
    inflight: &'a Inflight,
    key: &'a CacheKey,
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        self.inflight
            .remove_if(self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct Cache<K> {
    scheme: K,
    store: Arc<dyn ByteStore>,
    inflight: Inflight,
}

pub type AssetCache = Cache<AssetKeys>;
pub type PackageCache = Cache<PackageKeys>;

impl<K: KeyScheme> Cache<K> {
    pub fn new(scheme: K, store: Arc<dyn ByteStore>) -> Self {
        Self {
            scheme,
            store,
            inflight: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ByteStore> {
        &self.store
    }

    /// Serve `request` from disk, or fetch it from the origin once and keep it.
    ///
    /// Misses on the same key are serialised so only the first one reaches the
    /// origin; the others find the entry on disk. Different keys never wait on
    /// each other.
    #[instrument(skip(self), fields(kind = K::KIND))]
    pub async fn get_or_fetch(&self, request: &str) -> Result<CachedBody, CacheError> {
        let (key, url) = self.scheme.resolve(request)?;

        if let Some(body) = self.store.open(&key).await? {
            debug!(key = %key, "cache hit");
            return Ok(CachedBody {
                key,
                body,
                hit: true,
            });
        }

        // Declared before the lock handle so it is dropped after it.
        let slot = InflightSlot {
            inflight: &self.inflight,
            key: &key,
        };
        let lock = self.inflight.entry(key.clone()).or_default().value().clone();
        let result = {
            let _guard = lock.lock().await;
            self.fill(&key, &url).await
        };
        drop(lock);
        drop(slot);

        result.map(|(body, hit)| CachedBody { key, body, hit })
    }

    async fn fill(&self, key: &CacheKey, url: &Url) -> Result<(Body, bool), CacheError> {
        // another request may have filled it while we waited
        if let Some(body) = self.store.open(key).await? {
            debug!(key = %key, "cache hit after wait");
            return Ok((body, true));
        }

        let mut upstream = fetch_asset(url.as_str()).await?;
        self.store.put_if_absent(key, &mut upstream).await?;
        info!(key = %key, bytes = upstream.bytes_read(), "cached origin resource");

        let body = self
            .store
            .open(key)
            .await?
            .ok_or_else(|| CacheError::Vanished(key.clone()))?;
        Ok((body, false))
    }
}
