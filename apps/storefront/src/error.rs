//! # API Error Type
//!
//! Unified error type for storefront commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopfront                              │
//! │                                                                         │
//! │  CheckoutSession::commit() / OrderService::pay_cash() / ...            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ValidationError ── missing address field ──────────┐                  │
//! │  CoreError ──────── cash with proof, bad coupon ────┤                  │
//! │  DbError ────────── duplicate submission, stale ────┼──► ApiError      │
//! │  StorageError ───── proof upload failed ────────────┤   { code,        │
//! │  NotifyError ────── bad endpoint config ────────────┘     message }    │
//! │                                                                         │
//! │  {"code": "GUARD_VIOLATION",                                            │
//! │   "message": "Order … has a proof of payment; remove it …"}            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use shopfront_core::{CoreError, ValidationError};
use shopfront_db::DbError;
use shopfront_notify::NotifyError;

use crate::state::ConfigError;
use crate::storage::StorageError;

/// Error returned from every storefront command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Order not found: 5f0c…"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Business rule rejected the request (422)
    BusinessLogic,

    /// Payment-method guard rejected the request
    GuardViolation,

    /// Proof of payment could not be stored
    UploadFailed,

    /// Cart operation failed
    CartError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    /// The same checkout session was committed twice.
    pub fn duplicate_submission() -> Self {
        ApiError::business("This order has already been submitted")
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on("orders.submission_key") {
            return ApiError::duplicate_submission();
        }

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::StaleState { entity, id } => ApiError::business(format!(
                "{} {} was changed by someone else; reload and try again",
                entity, id
            )),
            DbError::ConstraintViolation(message) => {
                tracing::error!("Constraint violation: {}", message);
                ApiError::business("The change violates an order rule")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            e @ CoreError::CashWithProof { .. } => {
                ApiError::new(ErrorCode::GuardViolation, e.to_string())
            }
            e @ (CoreError::CouponRejected { .. }
            | CoreError::UnknownCoupon(_)
            | CoreError::ShippingMethodUnavailable(_)
            | CoreError::InvalidOrderStatus { .. }) => ApiError::business(e.to_string()),
            e @ CoreError::InvalidStatus(_) => ApiError::validation(e.to_string()),
            e @ CoreError::CartTooLarge { .. } => ApiError::cart(e.to_string()),
            e @ CoreError::QuantityTooLarge { .. } => ApiError::validation(e.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::new(ErrorCode::UploadFailed, err.to_string())
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        if err.is_config_error() {
            ApiError::validation(err.to_string())
        } else {
            ApiError::internal(err.to_string())
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
