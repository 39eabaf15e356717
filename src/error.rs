// src/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::reports::render::RenderError;
use crate::validator::ValidationResult;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    ValidationError(ValidationResult),
    ReferentialIntegrity { field: String, message: String },
    RenderingError(String),
    DatabaseError(sqlx::Error),
    InternalServerError(String),
    /// Any of the above, carrying the submitted payload back to the caller.
    WithInput(Box<ApiError>, serde_json::Value),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse<'a> {
    success: bool,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<&'a serde_json::Value>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::ValidationError(result) => write!(f, "Validation Error: {}", result.summary()),
            ApiError::ReferentialIntegrity { message, .. } => write!(f, "Referential Integrity: {}", message),
            ApiError::RenderingError(msg) => write!(f, "Rendering Error: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::WithInput(inner, _) => write!(f, "{}", inner),
        }
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::ReferentialIntegrity { .. } => "REFERENTIAL_INTEGRITY",
            ApiError::RenderingError(_) => "RENDERING_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalServerError(_) => "INTERNAL_ERROR",
            ApiError::WithInput(inner, _) => inner.code(),
        }
    }

    /// Attaches the submitted payload so an edit form can be re-populated.
    pub fn with_input(self, input: serde_json::Value) -> Self {
        match self {
            ApiError::WithInput(inner, _) => ApiError::WithInput(inner, input),
            other => ApiError::WithInput(Box::new(other), input),
        }
    }

    pub fn inner(&self) -> &ApiError {
        match self {
            ApiError::WithInput(inner, _) => inner.inner(),
            other => other,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ReferentialIntegrity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RenderingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::WithInput(inner, _) => inner.status_code(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let input = match self {
            ApiError::WithInput(_, input) => Some(input),
            _ => None,
        };
        let inner = self.inner();

        let error_response = ErrorResponse {
            success: false,
            code: inner.code(),
            message: inner.to_string(),
            errors: match inner {
                ApiError::ValidationError(result) => Some(&result.errors),
                _ => None,
            },
            field: match inner {
                ApiError::ReferentialIntegrity { field, .. } => Some(field.as_str()),
                _ => None,
            },
            input,
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.message().contains("FOREIGN KEY constraint failed") {
                return ApiError::ReferentialIntegrity {
                    field: "reference".to_string(),
                    message: "Referenced entity not found".to_string(),
                };
            }
        }
        ApiError::DatabaseError(err)
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::RenderingError(err.to_string())
    }
}

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{} with ID '{}' not found", entity, id))
    }

    pub fn bad_request(msg: &str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }

    pub fn missing_reference(field: &str, entity: &str, id: &str) -> Self {
        ApiError::ReferentialIntegrity {
            field: field.to_string(),
            message: format!("{} with ID '{}' not found", entity, id),
        }
    }
}
