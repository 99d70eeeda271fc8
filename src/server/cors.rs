//! Permissive cross-origin headers for browser clients.
//!
//! The headers are set on every response, overriding whatever the upstream
//! sent, and preflight requests are answered here without reaching any route.

use crate::server::SharedConfig;
use axum::body::Body;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, Request, StatusCode};
use tracing::{trace, warn};

pub(crate) const ALLOW_ORIGIN: &str = "*";
pub(crate) const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";

pub(crate) async fn cors_middleware(
    State(config): State<SharedConfig>,
    req: Request<Body>,
    next: Next<Body>,
) -> Response {
    let mut res = if req.method() == Method::OPTIONS {
        trace!(uri=%req.uri(), "Answering preflight request");
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    apply_cors_headers(res.headers_mut(), &config.cors_allow_headers());
    res
}

/// Credentials are never allowed, browsers reject them together with the `*`
/// origin.
fn apply_cors_headers(headers: &mut HeaderMap, allow_headers: &str) {
    headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );

    match HeaderValue::from_str(allow_headers) {
        Ok(value) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
        }
        Err(err) => warn!(?err, "Invalid Access-Control-Allow-Headers value"),
    }
}
