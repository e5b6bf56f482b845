//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror,
//! plus the HTTP mapping applied at the service boundary.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("at least one of an image, a story, or a mood tag is required")]
    MissingInput,

    #[error("could not find a public-domain poem; the retry limit was reached")]
    PolicyExhausted,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status reported to the caller for this failure.
    ///
    /// User-correctable failures are 400-class; upstream and internal
    /// failures are 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingInput
            | Error::PolicyExhausted
            | Error::InvalidRequest(_)
            | Error::Image(_) => StatusCode::BAD_REQUEST,
            Error::AiProvider(_)
            | Error::Http(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::Invariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}
