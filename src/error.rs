use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Form field a validation failure points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Location,
    Description,
    Coordinates,
    Timestamp,
    Status,
    TrackingNumber,
    Weight,
    Dimensions,
    Payment,
    SenderName,
    SenderAddress,
    RecipientName,
    RecipientAddress,
    Images,
    Checkpoints,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Location => "location",
            Field::Description => "description",
            Field::Coordinates => "coordinates",
            Field::Timestamp => "timestamp",
            Field::Status => "status",
            Field::TrackingNumber => "tracking_number",
            Field::Weight => "weight",
            Field::Dimensions => "dimensions",
            Field::Payment => "payment",
            Field::SenderName => "sender_name",
            Field::SenderAddress => "sender_address",
            Field::RecipientName => "recipient_name",
            Field::RecipientAddress => "recipient_address",
            Field::Images => "images",
            Field::Checkpoints => "checkpoints",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Required,
    Invalid,
    OutOfOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{} {}", .field, kind_text(.kind))]
pub struct ValidationError {
    pub field: Field,
    pub kind: ValidationKind,
}

impl ValidationError {
    pub fn required(field: Field) -> Self {
        Self {
            field,
            kind: ValidationKind::Required,
        }
    }

    pub fn invalid(field: Field) -> Self {
        Self {
            field,
            kind: ValidationKind::Invalid,
        }
    }

    pub fn out_of_order(field: Field) -> Self {
        Self {
            field,
            kind: ValidationKind::OutOfOrder,
        }
    }

    /// Machine-readable code, e.g. `location_required`.
    pub fn code(&self) -> String {
        let suffix = match self.kind {
            ValidationKind::Required => "required",
            ValidationKind::Invalid => "invalid",
            ValidationKind::OutOfOrder => "out_of_order",
        };
        format!("{}_{}", self.field.as_str(), suffix)
    }
}

fn kind_text(kind: &ValidationKind) -> &'static str {
    match kind {
        ValidationKind::Required => "is required",
        ValidationKind::Invalid => "is invalid",
        ValidationKind::OutOfOrder => "is out of order",
    }
}

/// Failures reported by a `PackageStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("package {0} not found")]
    PackageNotFound(String),

    #[error("package {0} already exists")]
    Duplicate(String),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("another change is still being saved")]
    Busy,

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PackageNotFound(tracking_number) => {
                AppError::NotFound(format!("package {tracking_number} not found"))
            }
            StoreError::Duplicate(tracking_number) => {
                AppError::Conflict(format!("package {tracking_number} already exists"))
            }
            StoreError::Backend(msg) => AppError::Persistence(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(err) => {
                let body = Json(json!({
                    "error": err.to_string(),
                    "field": err.field,
                    "code": err.code(),
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Busy => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::Persistence(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
