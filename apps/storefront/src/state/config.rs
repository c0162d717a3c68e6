//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPFRONT_DB_PATH=/var/lib/shopfront/shop.db                       │
//! │     SHOPFRONT_NOTIFY_ENDPOINT=https://billing.example.com/api          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/storefront/storefront.toml (Linux)                       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     data dir from `directories`, 19% tax, local invoice endpoint       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/shopfront/shop.db"
//!
//! [tax]
//! default_rate_bps = 1900
//!
//! [cart]
//! path = "/var/lib/shopfront/cart.json"
//!
//! [storage]
//! proofs_dir = "/var/lib/shopfront/proofs"
//! public_base_url = "https://cdn.example.com/proofs"
//!
//! [notify]
//! endpoint = "https://billing.example.com/api"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use shopfront_core::{TaxRate, DEFAULT_TAX_RATE_BPS};
use shopfront_notify::NotifyConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSection {
    /// Used when the `tax_config` row is missing or unusable.
    #[serde(default = "default_tax_rate")]
    pub default_rate_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSection {
    #[serde(default = "default_cart_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory uploaded payment proofs are written to.
    #[serde(default = "default_proofs_dir")]
    pub proofs_dir: PathBuf,

    /// Prefix of the URL stored on the order. Defaults to a `file://` URL
    /// of `proofs_dir` when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

/// Complete storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub tax: TaxSection,
    #[serde(default)]
    pub cart: CartSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub notify: NotifyConfig,
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "shopfront", "storefront")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_db_path() -> PathBuf {
    data_dir().join("shopfront.db")
}

fn default_tax_rate() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_cart_path() -> PathBuf {
    data_dir().join("cart.json")
}

fn default_proofs_dir() -> PathBuf {
    data_dir().join("proofs")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: default_db_path(),
        }
    }
}

impl Default for TaxSection {
    fn default() -> Self {
        TaxSection {
            default_rate_bps: default_tax_rate(),
        }
    }
}

impl Default for CartSection {
    fn default() -> Self {
        CartSection {
            path: default_cart_path(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        StorageSection {
            proofs_dir: default_proofs_dir(),
            public_base_url: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database: DatabaseSection::default(),
            tax: TaxSection::default(),
            cart: CartSection::default(),
            storage: StorageSection::default(),
            notify: NotifyConfig::default(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl AppConfig {
    /// Loads defaults, then the TOML file, then `SHOPFRONT_*` overrides.
    ///
    /// An explicit `config_path` must exist; the default location is
    /// optional.
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading storefront config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfront", "storefront")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    /// Applies `SHOPFRONT_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SHOPFRONT_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(rate) = lookup("SHOPFRONT_TAX_RATE_BPS") {
            match rate.parse::<u32>() {
                Ok(bps) => self.tax.default_rate_bps = bps,
                Err(_) => warn!(value = %rate, "Ignoring non-numeric SHOPFRONT_TAX_RATE_BPS"),
            }
        }

        if let Some(path) = lookup("SHOPFRONT_CART_PATH") {
            self.cart.path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("SHOPFRONT_PROOFS_DIR") {
            self.storage.proofs_dir = PathBuf::from(dir);
        }

        if let Some(url) = lookup("SHOPFRONT_PROOFS_BASE_URL") {
            self.storage.public_base_url = Some(url);
        }

        if let Some(endpoint) = lookup("SHOPFRONT_NOTIFY_ENDPOINT") {
            debug!(endpoint = %endpoint, "Overriding invoice endpoint from environment");
            self.notify.endpoint = endpoint;
        }

        if let Some(secs) = lookup("SHOPFRONT_NOTIFY_POLL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.notify.poll_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric SHOPFRONT_NOTIFY_POLL_SECS"),
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.default_tax_rate().is_valid() {
            return Err(ConfigError::Invalid(format!(
                "tax.default_rate_bps must be between 1 and 10000, got {}",
                self.tax.default_rate_bps
            )));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path is empty".into()));
        }

        if self.cart.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cart.path is empty".into()));
        }

        if let Some(url) = &self.storage.public_base_url {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid("storage.public_base_url is empty".into()));
            }
        }

        self.notify
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn default_tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax.default_rate_bps)
    }
}
