pub mod config;
pub mod data_models;
pub mod infer;
mod init;
pub mod routes;
pub mod state;
#[cfg(test)]
mod testing;
pub mod utils;

pub use init::{init_router, RouterArgs};

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::server::data_models::ErrorResponse;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Model not loaded")]
    ModelNotReady,

    #[error("Failed to generate embeddings: {0:#}")]
    Inference(anyhow::Error),

    #[error("Model not found")]
    ModelNotFound,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::ModelNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{self}");
        } else {
            tracing::debug!("{self}");
        }

        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidRequest(rejection.body_text())
    }
}

/// [`Json`] extractor whose rejections are [`ServerError::InvalidRequest`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);
