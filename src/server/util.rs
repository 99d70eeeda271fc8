use axum::body;
use axum::response::{IntoResponse, Response};
use http::header::{self, HeaderMap, HeaderName};
use http::StatusCode;
use once_cell::sync::Lazy;
use tracing::error;

// Create a reqwest client that will be used to make HTTP requests. This allows
// for keep-alives if we are making multiple requests to the same host.
//
// Redirects are relayed to the caller as-is instead of being followed.
pub static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("notion-cors-proxy/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Unable to create reqwest client")
});

/// Headers that only apply to a single connection and must not be forwarded
/// in either direction.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Remove the hop-by-hop headers and the `Host` header from a request that is
/// about to be sent upstream. The HTTP client sets `Host` from the upstream
/// URL.
pub(crate) fn strip_request_headers(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop as well.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }

    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }

    headers.remove(header::HOST);
}

/// Convert a reqwest::Response into a axum_core::Response.
///
/// If the Response builder is unable to create a Response, then it will log the
/// error and return a http status code 500.
///
/// We cannot implement this as an Into or From trait since both types are
/// foreign to this code.
pub(crate) fn convert_response(res: reqwest::Response) -> Response {
    let mut builder = http::Response::builder().status(res.status());

    // Calling `headers_mut` is safe here because we're constructing a new
    // Response from scratch and it will only return `None` if the builder is in
    // a Error state.
    let headers = builder.headers_mut().unwrap();
    for (name, value) in res.headers() {
        if is_hop_by_hop(name) {
            continue;
        }
        // `append` keeps repeated headers such as set-cookie intact.
        headers.append(name, value.clone());
    }

    match builder.body(body::StreamBody::from(res.bytes_stream())) {
        Ok(res) => res.into_response(),
        Err(err) => {
            error!("Error converting response: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Fallback for everything that is not forwarded or served locally.
pub(crate) async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
