use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sqlx::Error;

#[derive(Debug)]
pub enum ApiError {
    Database(sqlx::Error),
    Session(tower_sessions::session::Error),
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(&'static str),
    Internal(anyhow::Error),
}

pub type ApiResponse<T> = Result<Json<T>, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "Object not found".to_owned())
            }
            ApiError::Database(error) => {
                tracing::error!(%error, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_owned())
            }
            ApiError::Session(error) => {
                tracing::error!(%error, "session store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Session error".to_owned())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_owned())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Admin access required".to_owned()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Internal(error) => {
                tracing::error!(?error, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_owned())
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> ApiError {
        ApiError::Database(error)
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(error: tower_sessions::session::Error) -> ApiError {
        ApiError::Session(error)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> ApiError {
        ApiError::Internal(error)
    }
}
