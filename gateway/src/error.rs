//! Error responses for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use simplenote_core::ApiError;
use thiserror::Error;

/// Everything a handler can fail with, rendered as `status` + plain text.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The note service call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The form body could not be parsed.
    #[error("Internal Server Error")]
    BadForm,

    /// The blocking task running the client call did not complete.
    #[error("Internal Server Error")]
    Task(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Api(err) => match err.status() {
                Some(status) => StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                None => match err {
                    ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                },
            },
            GatewayError::BadForm | GatewayError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            GatewayError::Task(reason) => tracing::error!(%reason, "client task failed"),
            other if status.is_server_error() => tracing::warn!(error = %other, "request failed"),
            _ => {}
        }
        (status, self.to_string()).into_response()
    }
}
