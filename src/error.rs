use aide::OperationOutput;
use axum::{http::StatusCode, response::IntoResponse, Json};
use schemars::JsonSchema;
use serde_json::json;

/// Represent errors in the application
///
/// All `ServiceError`s can be transformed to http errors. The response body always has the
/// shape `{ "error": "<message>" }`.
#[derive(Debug, Clone, PartialEq, JsonSchema)]
pub enum ServiceError {
    InternalServerError(String),
    BadRequest(String),
    Conflict(String),
    Unauthorized(&'static str),
    Forbidden,
    NotFound,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ServiceError {}

/// Helper for `ServiceError` result
pub type ServiceResult<T> = Result<T, ServiceError>;

impl OperationOutput for ServiceError {
    type Inner = String;
}
impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceError::InternalServerError(ref cause) => {
                log::error!("Internal server error: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal server error occurred" })),
                )
            }
            ServiceError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
            }
            ServiceError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(json!({ "error": message })))
            }
            ServiceError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
            }
            ServiceError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Missing permissions",
                })),
            ),
            ServiceError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Not found",
                })),
            ),
        }
        .into_response()
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = error {
            return ServiceError::NotFound;
        }
        if let sqlx::Error::Database(ref db_error) = error {
            if db_error.is_unique_violation() {
                return ServiceError::Conflict("The record already exists".to_owned());
            }
            if db_error.is_foreign_key_violation() {
                return ServiceError::Conflict(
                    "The record is referenced by or references a missing record".to_owned(),
                );
            }
        }
        ServiceError::InternalServerError(format!("database error: {error}"))
    }
}

impl From<sqlx::migrate::MigrateError> for ServiceError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        ServiceError::InternalServerError(format!("migration error: {error}"))
    }
}

impl From<jsonwebtoken::errors::Error> for ServiceError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        ServiceError::InternalServerError(format!("session token error: {error}"))
    }
}

impl From<csv::Error> for ServiceError {
    fn from(error: csv::Error) -> Self {
        ServiceError::BadRequest(format!("Failed to parse CSV file: {error}"))
    }
}

impl From<handlebars::RenderError> for ServiceError {
    fn from(error: handlebars::RenderError) -> Self {
        ServiceError::InternalServerError(format!("template error: {error}"))
    }
}

impl From<handlebars::TemplateError> for ServiceError {
    fn from(error: handlebars::TemplateError) -> Self {
        ServiceError::InternalServerError(format!("template error: {error}"))
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(error: std::io::Error) -> Self {
        ServiceError::InternalServerError(format!("io error: {error}"))
    }
}
