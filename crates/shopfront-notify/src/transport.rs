//! # Invoice Transport
//!
//! The seam between invoice dispatch and the network.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceTransport::send(InvoiceRequest)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HttpInvoiceTransport                                                   │
//! │    POST {endpoint}/invoice  {"order_id": "...", "attachment": "..."}    │
//! │       │                                                                 │
//! │       ├── 2xx ─────────────────────► Ok(())                             │
//! │       ├── 429 / 5xx / connect error ► retry with exponential backoff   │
//! │       │                              until max_backoff_secs elapse     │
//! │       └── other 4xx ───────────────► Rejected (no retry)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::NotifyConfig;
use crate::error::{NotifyError, NotifyResult};

/// Body of `POST /invoice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub order_id: String,

    /// Proof of payment reference, when the order has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl InvoiceRequest {
    pub fn new(order_id: impl Into<String>, attachment: Option<String>) -> Self {
        InvoiceRequest {
            order_id: order_id.into(),
            attachment,
        }
    }
}

/// Delivers one invoice notification.
///
/// Implementations report success or failure only; the endpoint has no
/// response contract beyond that.
#[async_trait]
pub trait InvoiceTransport: Send + Sync {
    async fn send(&self, request: &InvoiceRequest) -> NotifyResult<()>;
}

// =============================================================================
// HTTP Transport
// =============================================================================

pub struct HttpInvoiceTransport {
    client: Client,
    url: Url,
    initial_backoff: Duration,
    max_elapsed: Duration,
}

impl HttpInvoiceTransport {
    pub fn new(config: &NotifyConfig) -> NotifyResult<Self> {
        let url = config.invoice_url()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| NotifyError::InvalidConfig(e.to_string()))?;

        Ok(HttpInvoiceTransport {
            client,
            url,
            initial_backoff: config.initial_backoff(),
            max_elapsed: config.max_backoff(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_elapsed)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build()
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    async fn post_once(&self, request: &InvoiceRequest) -> NotifyResult<()> {
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(order_id = %request.order_id, status = %status, "Invoice accepted");
            return Ok(());
        }

        if Self::is_retryable_status(status) {
            warn!(order_id = %request.order_id, status = %status, "Invoice endpoint unavailable");
            return Err(NotifyError::Unavailable {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

#[async_trait]
impl InvoiceTransport for HttpInvoiceTransport {
    async fn send(&self, request: &InvoiceRequest) -> NotifyResult<()> {
        backoff::future::retry(self.backoff(), || async {
            self.post_once(request).await.map_err(|e| {
                if e.is_retryable() {
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }
}
