//! Configuration handling for the mirror.
//!
//! Everything is read from environment variables with development defaults,
//! so a bare `foxmirror` invocation serves the public catalog from the
//! current directory. `Config::from_env` validates the values that would
//! otherwise fail much later (the origin URL, the log format).

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use url::Url;

/// Environment variable names. Public so tests and deploy scripts can refer
/// to them.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_ORIGIN_URL: &str = "ORIGIN_URL";
pub const ENV_ORIGIN_LOCALE: &str = "ORIGIN_LOCALE";
pub const ENV_ASSET_CACHE_DIR: &str = "ASSET_CACHE_DIR";
pub const ENV_PACKAGE_CACHE_DIR: &str = "PACKAGE_CACHE_DIR";
pub const ENV_TEMPLATE_DIR: &str = "TEMPLATE_DIR";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_ORIGIN_URL: &str = "https://addons.mozilla.org/";
const DEFAULT_ORIGIN_LOCALE: &str = "en-US";
const DEFAULT_ASSET_CACHE_DIR: &str = "cache";
const DEFAULT_PACKAGE_CACHE_DIR: &str = "addons";
const DEFAULT_TEMPLATE_DIR: &str = "html";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: ENV_LOG_FORMAT,
                reason: format!("unknown log format '{}'", other),
            }),
        }
    }
}

/// Mirror runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    origin_url: Url,
    origin_locale: String,
    asset_cache_dir: PathBuf,
    package_cache_dir: PathBuf,
    template_dir: PathBuf,
    log_format: LogFormat,
}

impl Config {
    /// Create a config explicitly. The origin URL is normalised to end in `/`.
    pub fn new(
        bind_addr: impl Into<String>,
        origin_url: Url,
        asset_cache_dir: impl Into<PathBuf>,
        package_cache_dir: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            origin_url: with_trailing_slash(origin_url),
            origin_locale: DEFAULT_ORIGIN_LOCALE.to_string(),
            asset_cache_dir: asset_cache_dir.into(),
            package_cache_dir: package_cache_dir.into(),
            template_dir: template_dir.into(),
            log_format: LogFormat::Text,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let origin_url = parse_origin(
            &env::var(ENV_ORIGIN_URL).unwrap_or_else(|_| DEFAULT_ORIGIN_URL.to_string()),
        )?;
        let origin_locale =
            env::var(ENV_ORIGIN_LOCALE).unwrap_or_else(|_| DEFAULT_ORIGIN_LOCALE.to_string());
        if origin_locale.is_empty() || origin_locale.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: ENV_ORIGIN_LOCALE,
                reason: format!("'{}' is not a single path segment", origin_locale),
            });
        }
        let asset_cache_dir = env::var(ENV_ASSET_CACHE_DIR)
            .unwrap_or_else(|_| DEFAULT_ASSET_CACHE_DIR.to_string());
        let package_cache_dir = env::var(ENV_PACKAGE_CACHE_DIR)
            .unwrap_or_else(|_| DEFAULT_PACKAGE_CACHE_DIR.to_string());
        let template_dir =
            env::var(ENV_TEMPLATE_DIR).unwrap_or_else(|_| DEFAULT_TEMPLATE_DIR.to_string());
        let log_format = match env::var(ENV_LOG_FORMAT) {
            Ok(value) => LogFormat::parse(&value)?,
            Err(_) => LogFormat::Text,
        };

        Ok(Self {
            bind_addr,
            origin_url,
            origin_locale,
            asset_cache_dir: asset_cache_dir.into(),
            package_cache_dir: package_cache_dir.into(),
            template_dir: template_dir.into(),
            log_format,
        })
    }

    /// Override the locale segment used for catalog page URLs.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.origin_locale = locale.into();
        self
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Base URL of the mirrored site, always ending in `/`.
    pub fn origin_url(&self) -> &Url {
        &self.origin_url
    }
    pub fn origin_locale(&self) -> &str {
        &self.origin_locale
    }
    /// Directory holding proxied assets (`/p/`).
    pub fn asset_cache_dir(&self) -> &Path {
        &self.asset_cache_dir
    }
    /// Directory holding downloaded packages (`/g/`).
    pub fn package_cache_dir(&self) -> &Path {
        &self.package_cache_dir
    }
    /// Directory holding the page templates and static files.
    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Origin URL of a catalog page, e.g. `<base>/en-US/firefox/addon/<slug>`.
    pub fn catalog_url(&self, segments: &[&str]) -> Url {
        let mut url = self.origin_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push(&self.origin_locale)
                .push("firefox")
                .extend(segments);
        }
        url
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        // the default origin is a constant, it always parses
        let origin = Url::parse(DEFAULT_ORIGIN_URL).expect("default origin url");
        Self::new(
            DEFAULT_BIND_ADDR,
            origin,
            DEFAULT_ASSET_CACHE_DIR,
            DEFAULT_PACKAGE_CACHE_DIR,
            DEFAULT_TEMPLATE_DIR,
        )
    }
}

fn parse_origin(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field: ENV_ORIGIN_URL,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            field: ENV_ORIGIN_URL,
            reason: format!("'{}' is not an http(s) URL with a host", raw),
        });
    }
    Ok(with_trailing_slash(url))
}

fn with_trailing_slash(mut url: Url) -> Url {
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
