use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Fatal, startup-time defects. The process must not serve with any of these.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parameter 'path' can not be empty")]
    EmptyRoutePath,
    #[error("Malformed shape declaration: {0}")]
    MalformedShape(String),
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Where in the request a validation failure was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorPlace {
    Body,
    Url,
}

/// Expected, per-request validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub place: ValidationErrorPlace,
    pub errors: Vec<String>,
}

impl ValidationError {
    pub fn new(place: ValidationErrorPlace, errors: Vec<String>) -> Self {
        Self { place, errors }
    }

    pub fn single(place: ValidationErrorPlace, message: impl Into<String>) -> Self {
        Self::new(place, vec![message.into()])
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
    place: Option<ValidationErrorPlace>,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    place: Option<ValidationErrorPlace>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
    code: u16,
    timestamp: String,
    correlation_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            place: None,
            errors: Vec::new(),
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn place(&self) -> Option<ValidationErrorPlace> {
        self.place
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_validation(&self) -> bool {
        self.place.is_some()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = if err.errors.len() == 1 {
            err.errors[0].clone()
        } else {
            format!("Validation failed with {} errors", err.errors.len())
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "ValidationError".to_string(),
            message,
            place: Some(err.place),
            errors: err.errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().to_string();

        if self.status.is_server_error() {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %self.error,
                message = %self.message,
                "request failed with server fault"
            );
        } else {
            tracing::debug!(
                correlation_id = %correlation_id,
                status = self.status.as_u16(),
                error = %self.error,
                errors = ?self.errors,
                "request rejected"
            );
        }

        let payload = ErrorResponse {
            error: self.error,
            message: self.message,
            place: self.place,
            errors: self.errors,
            code: self.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id: correlation_id.clone(),
        };

        let mut response = (self.status, Json(payload)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response.headers_mut().insert(header::HeaderName::from_static("x-correlation-id"), value);
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
