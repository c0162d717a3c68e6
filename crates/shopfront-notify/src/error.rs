//! # Notify Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Notify Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Delivery      │  │     Internal            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  RequestFailed  │  │  Database               │ │
//! │  │  InvalidUrl     │  │  Unavailable    │  │  ChannelError           │ │
//! │  │                 │  │  Rejected       │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid notify configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Delivery Errors
    // =========================================================================
    /// Connection refused, reset, or timed out.
    #[error("Invoice request failed: {0}")]
    RequestFailed(String),

    /// 429 or 5xx from the endpoint.
    #[error("Invoice endpoint unavailable: HTTP {status}")]
    Unavailable { status: u16 },

    /// Any other non-success status.
    #[error("Invoice rejected: HTTP {status} {body}")]
    Rejected { status: u16, body: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<shopfront_db::DbError> for NotifyError {
    fn from(err: shopfront_db::DbError) -> Self {
        NotifyError::Database(err.to_string())
    }
}

impl From<url::ParseError> for NotifyError {
    fn from(err: url::ParseError) -> Self {
        NotifyError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status.is_server_error() => NotifyError::Unavailable {
                status: status.as_u16(),
            },
            _ => NotifyError::RequestFailed(err.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl NotifyError {
    /// Whether a later attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotifyError::RequestFailed(_) | NotifyError::Unavailable { .. }
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            NotifyError::InvalidConfig(_) | NotifyError::InvalidUrl(_)
        )
    }
}
