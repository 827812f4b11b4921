use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Unified request error. Every handler returns this so the status
/// mapping lives in one place.
///
/// `UpstreamUnavailable` and `UpstreamMalformed` both map to 502 but stay
/// separate variants: the first means the analysis service could not be
/// reached (client may retry), the second means it answered with something
/// we could not decode.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream returned malformed data: {0}")]
    UpstreamMalformed(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) | ApiError::UpstreamMalformed(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Never leak internal error chains to the client.
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                "internal server error".to_string()
            }
            other => {
                if status.is_server_error() {
                    error!(error = %other, %status, "request failed");
                } else {
                    warn!(error = %other, %status, "request rejected");
                }
                other.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
