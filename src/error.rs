use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::assets::AssetError;
use crate::store::StoreError;
use crate::system::SystemError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("card store error: {0}")]
    Store(#[from] StoreError),

    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("system stats error: {0}")]
    System(#[from] SystemError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string(), None)
            }
            AppError::Store(e) => {
                tracing::error!("Card store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to update cards".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Asset(AssetError::InvalidId(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string(), None)
            }
            AppError::Asset(AssetError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Locale not found".to_string(), None)
            }
            AppError::Asset(e) => {
                tracing::error!("Asset error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load assets".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::System(e) => {
                tracing::error!("System stats error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch system stats".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                    Some(msg.clone()),
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Failures while bringing the server up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] crate::extractor::ExtractError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}
