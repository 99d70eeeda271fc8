use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Failures while talking to the upstream API. All of them are reported to
/// the caller as a 500 with a small JSON body, nothing is retried.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream could not be reached or the exchange broke off.
    #[error("{0}")]
    Upstream(reqwest::Error),

    /// The inbound request could not be turned into an upstream request.
    #[error("unable to build upstream request: {0}")]
    InvalidRequest(reqwest::Error),

    /// The rewritten path did not result in a valid upstream URI.
    #[error("invalid upstream url: {0}")]
    InvalidUpstreamUrl(#[from] http::uri::InvalidUri),

    /// Building the response for the caller failed.
    #[error("unable to build response: {0}")]
    Response(#[from] http::Error),
}

impl ProxyError {
    /// Short name of the failure, reported in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(_) => "Proxy error",
            ProxyError::InvalidRequest(_) => "Invalid request",
            ProxyError::InvalidUpstreamUrl(_) => "Invalid upstream url",
            ProxyError::Response(_) => "Invalid response",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_uri_is_a_500() {
        let err: ProxyError = "http://exa mple.com"
            .parse::<http::Uri>()
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "Invalid upstream url");

        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()[http::header::CONTENT_TYPE], "application/json");
    }
}
