use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::error::ModelError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Model(ModelError::InvalidConfiguration(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Model(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            ApiError::Model(e) => e.kind(),
            ApiError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ErrorBody { error: self.tag().to_string(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}
