use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::executer::ExecuteError;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Failed to generate CSRF token")]
    GenToken,
    #[error("CSRF token not matched")]
    CSRFNotMatch,
    #[error("Missing parameter in callback: {0}")]
    Callback(&'static str),
    #[error("Unknown scope: {0}")]
    UnknownScope(String),
    #[error("Failed to parse url")]
    URL,
    #[error("redirect_uri cannot be served as a callback route: {0}")]
    CallbackPath(String),
    #[error("Missing or invalid environment variable: {0}")]
    Env(&'static str),
    #[error("Session store is unavailable")]
    SessionStore,
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::CSRFNotMatch | Error::Callback(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!("Request failed: {}", self);
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}
