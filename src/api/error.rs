//! Translation of service failures into HTTP responses.
//!
//! Every error body carries the status, a message, the request path and a
//! timestamp. DTO validation failures add a field to message map.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::dto::ValidationErrors;
use crate::service::ServiceError;

const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<ValidationErrors>,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    path: String,
    validation_errors: Option<ValidationErrors>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, req: &HttpRequest) -> Self {
        Self {
            status,
            message: message.into(),
            path: req.path().to_string(),
            validation_errors: None,
        }
    }

    pub fn from_service(err: ServiceError, req: &HttpRequest) -> Self {
        match err {
            ServiceError::InvalidArgument(message) => {
                warn!(path = req.path(), %message, "Bad request");
                Self::new(StatusCode::BAD_REQUEST, message, req)
            }
            ServiceError::NotFound(message) => {
                warn!(path = req.path(), %message, "Resource not found");
                Self::new(StatusCode::NOT_FOUND, message, req)
            }
            ServiceError::Storage(err) => {
                error!(path = req.path(), error = %err, "Unhandled storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, req)
            }
        }
    }

    pub fn validation(errors: ValidationErrors, req: &HttpRequest) -> Self {
        warn!(path = req.path(), ?errors, "Validation error");
        Self {
            validation_errors: Some(errors),
            ..Self::new(StatusCode::BAD_REQUEST, "Validation failed", req)
        }
    }

    pub fn not_found(req: &HttpRequest) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource not found", req)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorResponse {
            status: self.status.as_u16(),
            message: self.message.clone(),
            path: self.path.clone(),
            timestamp: Utc::now(),
            validation_errors: self.validation_errors.clone(),
        })
    }
}
