use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use argon2::password_hash;

use crate::models::QueueStatus;

pub const ACTIVE_BOOKING_MESSAGE: &str =
    "You already have an active booking. Please cancel it before booking another salon.";

/// Failures raised by queue and appointment operations.
///
/// Every variant except `Store` carries a reason that is safe to show to end users.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Cannot move a {from} entry to {to}")]
    InvalidTransition { from: QueueStatus, to: QueueStatus },

    #[error("{0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures while creating a user account.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl From<AccountError> for ServiceError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Store(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Self::Conflict("Username already taken.".to_string())
            }
            AccountError::Store(err) => Self::Store(err),
            AccountError::Hash(err) => Self::Internal(err.to_string()),
        }
    }
}

impl ServiceError {
    pub fn active_booking() -> Self {
        Self::Conflict(ACTIVE_BOOKING_MESSAGE.to_string())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Forbidden".to_string())
    }

    fn user_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Internal(_) => "Operation failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Conflict(_) | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidStatus(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Store(err) => log::error!("Store failure: {err}"),
            Self::Internal(detail) => log::error!("Internal failure: {detail}"),
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.user_message() }))
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
