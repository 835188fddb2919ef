use anyhow::Context;
use std::sync::Arc;

use crate::cache::{AssetCache, AssetKeys, ByteStore, DiskStore, PackageCache, PackageKeys};
use crate::config::Config;
use crate::extractor::{ExtractError, Selectors};
use crate::render::Templates;
use crate::rewrite::LinkRewriter;

/// Everything a request handler needs. Built once at startup; the selector
/// tables, templates and rewriter are immutable from then on.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub selectors: Arc<Selectors>,
    pub templates: Arc<Templates>,
    pub rewriter: Arc<LinkRewriter>,
    pub assets: Arc<AssetCache>,
    pub packages: Arc<PackageCache>,
}

impl AppState {
    pub fn new(
        config: Config,
        templates: Templates,
        asset_store: Arc<dyn ByteStore>,
        package_store: Arc<dyn ByteStore>,
    ) -> Result<Self, ExtractError> {
        let origin = config.origin_url().clone();
        Ok(Self {
            selectors: Arc::new(Selectors::new()?),
            templates: Arc::new(templates),
            rewriter: Arc::new(LinkRewriter::new(origin.clone())),
            assets: Arc::new(AssetCache::new(AssetKeys::new(origin.clone()), asset_store)),
            packages: Arc::new(PackageCache::new(PackageKeys::new(origin), package_store)),
            config: Arc::new(config),
        })
    }

    /// Open the on-disk caches and load the templates named by `config`.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let asset_store = DiskStore::new(config.asset_cache_dir())
            .context("open asset cache directory")?;
        let package_store = DiskStore::new(config.package_cache_dir())
            .context("open package cache directory")?;
        let templates = Templates::load(config.template_dir())?;
        Ok(Self::new(
            config,
            templates,
            Arc::new(asset_store),
            Arc::new(package_store),
        )?)
    }
}
