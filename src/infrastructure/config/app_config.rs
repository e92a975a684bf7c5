//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::args::CliArgs;
use crate::domain::services::{DEFAULT_HALF_HEIGHT, DEFAULT_HALF_WIDTH};
use crate::infrastructure::flickr::FLICKR_API_BASE;
use crate::infrastructure::image::DEFAULT_MAX_CACHE_SIZE;

pub(crate) const APP_NAME: &str = "virtual-tourist";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "linuxmobile";

/// Highest result page the provider will serve for a query.
pub const PROVIDER_MAX_PAGE: u32 = 40;
/// Photos per album page.
pub const DEFAULT_PER_PAGE: u32 = 21;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, loaded from `config.toml` and merged with CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Photo provider API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Directory holding pins and the image cache.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Photo search tuning.
    #[serde(default)]
    pub search: SearchConfig,

    /// Image cache tuning.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Photo search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider endpoint.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Half-width of the search box in degrees of longitude.
    #[serde(default = "default_half_width")]
    pub half_width: f64,

    /// Half-height of the search box in degrees of latitude.
    #[serde(default = "default_half_height")]
    pub half_height: f64,

    /// Photos requested per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Highest page that may be picked at random.
    #[serde(default = "default_max_page")]
    pub max_page: u32,

    /// Ask the provider to filter unsafe content.
    #[serde(default = "default_true")]
    pub safe_search: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SearchConfig {
    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            half_width: DEFAULT_HALF_WIDTH,
            half_height: DEFAULT_HALF_HEIGHT,
            per_page: DEFAULT_PER_PAGE,
            max_page: PROVIDER_MAX_PAGE,
            safe_search: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Image cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory. Defaults to `<data_dir>/images`.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Maximum disk usage in megabytes.
    #[serde(default = "default_cache_size_mb")]
    pub max_size_mb: u64,

    /// Maximum concurrent image downloads.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,
}

impl CacheConfig {
    /// Maximum disk usage in bytes.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_size_mb: default_cache_size_mb(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
        }
    }
}

fn default_api_base_url() -> String {
    FLICKR_API_BASE.to_string()
}

const fn default_half_width() -> f64 {
    DEFAULT_HALF_WIDTH
}

const fn default_half_height() -> f64 {
    DEFAULT_HALF_HEIGHT
}

const fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

const fn default_max_page() -> u32 {
    PROVIDER_MAX_PAGE
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_cache_size_mb() -> u64 {
    DEFAULT_MAX_CACHE_SIZE / (1024 * 1024)
}

const fn default_max_concurrent_downloads() -> usize {
    4
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(api_key) = &args.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(data_dir) = &args.data_dir {
            self.data_dir = Some(data_dir.clone());
        }
        if let Some(per_page) = args.per_page {
            self.search.per_page = per_page;
        }
        if let Some(safe_search) = args.safe_search {
            self.search.safe_search = safe_search;
        }
        if let Some(half_size) = args.box_half_size {
            self.search.half_width = half_size;
            self.search.half_height = half_size;
        }
    }

    /// Clamps numeric settings into usable ranges.
    pub fn sanitize(&mut self) {
        self.search.per_page = self.search.per_page.clamp(1, 500);
        self.search.max_page = self.search.max_page.max(1);
        self.cache.max_concurrent_downloads = self.cache.max_concurrent_downloads.max(1);
        self.cache.max_size_mb = self.cache.max_size_mb.max(1);
        if !(self.search.half_width.is_finite() && self.search.half_width > 0.0) {
            self.search.half_width = DEFAULT_HALF_WIDTH;
        }
        if !(self.search.half_height.is_finite() && self.search.half_height > 0.0) {
            self.search.half_height = DEFAULT_HALF_HEIGHT;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default data directory.
    #[must_use]
    pub fn default_data_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        Self::default_data_dir().map(|dir| dir.join("virtual-tourist.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns effective data directory, falling back to a temp directory.
    #[must_use]
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(Self::default_data_dir)
            .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
    }

    /// Returns effective image cache directory.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| self.effective_data_dir().join("images"))
    }

    /// Returns the pin store file path.
    #[must_use]
    pub fn pins_path(&self) -> PathBuf {
        self.effective_data_dir().join("pins.json")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            api_key: None,
            data_dir: None,
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}
