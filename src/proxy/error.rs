use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors surfaced by the proxy handlers.
#[derive(Debug, thiserror::Error)]
pub(super) enum ProxyError {
    /// No refresh credential in the request cookies.
    #[error("no refresh token")]
    MissingRefreshToken,

    /// The upstream answered, but rejected the forwarded credential.
    #[error("upstream rejected the request with status {0}")]
    Rejected(StatusCode),

    /// The upstream could not be reached, or its response was unreadable.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingRefreshToken => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "no refresh token" })),
            )
                .into_response(),
            // Upstream rejections pass through with their original status.
            Self::Rejected(status) => {
                let reason = status.canonical_reason().unwrap_or("request rejected");
                (status, Json(json!({ "error": reason }))).into_response()
            }
            Self::Upstream(ref error) => {
                tracing::error!(%error, "failed to forward request to upstream");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "error forwarding the request" })),
                )
                    .into_response()
            }
        }
    }
}
