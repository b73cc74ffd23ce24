//! Typed errors and HTTP mapping.

use crate::entity::Key;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failures raised by an entity store. Passed through the service layer unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("constraint violated: {0}")]
    Conflict(String),
    #[error("{entity} {key} does not exist")]
    NotFound { entity: &'static str, key: Key },
    #[error("store failure: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Internal(e.to_string()),
        }
    }
}

/// Why a request was rejected before reaching the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationKind {
    MissingKey,
    KeyMismatch,
    AlreadyHasKey,
    RequiredField,
    InvalidValue,
    UnknownField,
    UnsortableField,
    NotAnAssociation,
    BadOffset,
    LimitTooLarge,
}

impl ValidationKind {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            ValidationKind::MissingKey => "idnull",
            ValidationKind::KeyMismatch => "idinvalid",
            ValidationKind::AlreadyHasKey => "idexists",
            ValidationKind::RequiredField => "required",
            ValidationKind::InvalidValue => "invalidvalue",
            ValidationKind::UnknownField => "unknownfield",
            ValidationKind::UnsortableField => "unsortable",
            ValidationKind::NotAnAssociation => "notassociation",
            ValidationKind::BadOffset => "badoffset",
            ValidationKind::LimitTooLarge => "limittoolarge",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {message}")]
    Validation {
        kind: ValidationKind,
        entity: &'static str,
        field: Option<String>,
        message: String,
    },
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: Key },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(kind: ValidationKind, entity: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            kind,
            entity,
            field: None,
            message: message.into(),
        }
    }

    pub fn field_validation(
        kind: ValidationKind,
        entity: &'static str,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AppError::Validation {
            kind,
            entity,
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Validation kind, if this is a validation failure.
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            AppError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Validation { kind, .. } => kind.code(),
            AppError::NotFound { .. } => "idnotfound",
            AppError::Conflict(_) => "conflict",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(m) => AppError::StoreUnavailable(m),
            StoreError::Conflict(m) => AppError::Conflict(m),
            StoreError::NotFound { entity, key } => AppError::NotFound { entity, key },
            StoreError::Internal(m) => AppError::Internal(m),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            AppError::Validation { entity, field, .. } => Some(serde_json::json!({
                "entity": entity,
                "field": field,
            })),
            AppError::NotFound { entity, key } => Some(serde_json::json!({
                "entity": entity,
                "key": key,
            })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}
