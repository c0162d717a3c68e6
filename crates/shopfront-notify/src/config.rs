//! # Notify Configuration
//!
//! Settings for the invoice endpoint and the outbox poll loop. Embedded in
//! the storefront config file as the `[notify]` section.
//!
//! ## Configuration File Format
//! ```toml
//! [notify]
//! endpoint = "https://billing.example.com/api"
//! poll_interval_secs = 5
//! batch_size = 50
//! max_attempts = 10
//! request_timeout_secs = 10
//! initial_backoff_ms = 500
//! max_backoff_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{NotifyError, NotifyResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Base URL of the notification service; invoices go to `{endpoint}/invoice`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Interval between outbox poll cycles (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Outbox entries handled per poll cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Poll cycles an entry may fail before it is left alone.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Timeout of a single HTTP request (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// First retry delay within one delivery (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Longest time one delivery keeps retrying (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8787".to_string()
}
fn default_poll_interval() -> u64 {
    5
}
fn default_batch_size() -> u32 {
    50
}
fn default_max_attempts() -> i64 {
    10
}
fn default_request_timeout() -> u64 {
    10
}
fn default_initial_backoff() -> u64 {
    500
}
fn default_max_backoff() -> u64 {
    30
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            endpoint: default_endpoint(),
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl NotifyConfig {
    /// Rejects settings the processor cannot run with.
    pub fn validate(&self) -> NotifyResult<()> {
        self.invoice_url()?;

        if self.poll_interval_secs == 0 {
            return Err(NotifyError::InvalidConfig(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(NotifyError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.max_attempts < 1 {
            return Err(NotifyError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(NotifyError::InvalidConfig(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// `{endpoint}/invoice`, keeping any path prefix on the endpoint.
    pub fn invoice_url(&self) -> NotifyResult<Url> {
        let mut base = Url::parse(self.endpoint.trim())?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(NotifyError::InvalidUrl(format!(
                "endpoint must be http or https, got '{}'",
                base.scheme()
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join("invoice")?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NotifyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_attempts, 10);
    }

    #[test]
    fn test_invoice_url_keeps_prefix() {
        let config = NotifyConfig {
            endpoint: "https://billing.example.com/api".into(),
            ..NotifyConfig::default()
        };
        assert_eq!(
            config.invoice_url().unwrap().as_str(),
            "https://billing.example.com/api/invoice"
        );

        let config = NotifyConfig {
            endpoint: "https://billing.example.com".into(),
            ..NotifyConfig::default()
        };
        assert_eq!(
            config.invoice_url().unwrap().as_str(),
            "https://billing.example.com/invoice"
        );
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let config = NotifyConfig {
            endpoint: "not a url".into(),
            ..NotifyConfig::default()
        };
        assert!(config.validate().unwrap_err().is_config_error());

        let config = NotifyConfig {
            endpoint: "ftp://billing.example.com".into(),
            ..NotifyConfig::default()
        };
        assert!(matches!(config.validate(), Err(NotifyError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_zero_batch() {
        let config = NotifyConfig {
            batch_size: 0,
            ..NotifyConfig::default()
        };
        assert!(matches!(config.validate(), Err(NotifyError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: NotifyConfig =
            serde_json::from_str(r#"{"endpoint": "https://b.example"}"#).unwrap();
        assert_eq!(config.endpoint, "https://b.example");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.batch_size, 50);
    }
}
