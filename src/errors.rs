use crate::services::{
    blob_store::StorageError, catalog_store::CatalogError, range_stream::StreamError,
};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures of the catalog services. Every variant is returned to the
/// caller; none is fatal to the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("failed to read song duration: {0}")]
    Decode(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            CatalogError::Conflict(msg) => ServiceError::Conflict(msg),
            CatalogError::Sqlx(err) => ServiceError::StorageUnavailable(err.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectNotFound { bucket, key } => {
                ServiceError::not_found("object", format!("{}/{}", bucket, key))
            }
            StorageError::BucketNotFound(bucket) => ServiceError::not_found("bucket", bucket),
            StorageError::InvalidObjectKey => ServiceError::BadRequest("invalid object key".into()),
            StorageError::InvalidBucketName { name, reason } => {
                ServiceError::BadRequest(format!("bucket `{}` invalid: {}", name, reason))
            }
            StorageError::Sqlx(err) => ServiceError::StorageUnavailable(err.to_string()),
            StorageError::Io(err) => ServiceError::StorageUnavailable(err.to_string()),
        }
    }
}

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        };
        let message = match err {
            ServiceError::Decode(_) => "Failed to read song duration".to_string(),
            other => other.to_string(),
        };
        AppError::new(status, message)
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = match &self {
            StreamError::InvalidKey(_) | StreamError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            StreamError::NotFound(_) => StatusCode::NOT_FOUND,
            StreamError::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut response = AppError::new(status, self.to_string()).into_response();
        if let StreamError::Unsatisfiable { length } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", length)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}
