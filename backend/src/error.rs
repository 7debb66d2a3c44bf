use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::property::SearchError;
use crate::validation::ValidationError;

/// Everything a handler can fail with. Rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Property not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Store(e) => log::error!("Store failure: {}", e),
            other => log::info!("Rejected request: {}", other),
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Invalid(e) => AppError::Validation(e),
            SearchError::Store(e) => AppError::Store(e),
        }
    }
}

/// Maps zero affected rows to `NotFound`.
pub fn found(affected: usize) -> Result<(), AppError> {
    if affected == 0 {
        Err(AppError::NotFound)
    } else {
        Ok(())
    }
}
