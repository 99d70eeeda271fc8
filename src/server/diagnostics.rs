use crate::server::error::ProxyError;
use crate::server::util::{convert_response, CLIENT};
use crate::server::SharedConfig;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

/// Check whether the upstream accepts the caller's credentials by calling the
/// `users/me` endpoint once.
///
/// The `Authorization` header is passed on verbatim, an empty one is sent when
/// the caller has none. The upstream status and body are relayed unchanged.
pub(crate) async fn handler(State(config): State<SharedConfig>, headers: HeaderMap) -> Response {
    let url = config.users_me_url();

    let authorization = headers
        .get(header::AUTHORIZATION)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(""));

    let request = CLIENT
        .get(url.as_str())
        .header(header::AUTHORIZATION, authorization);

    let request = match headers.get(&config.version_header) {
        Some(version) => request.header(config.version_header.clone(), version.clone()),
        None => request.header(config.version_header.clone(), config.notion_version.as_str()),
    };

    match request.send().await {
        Ok(res) => {
            if config.verbose {
                info!(upstream_uri=%url, status_code=%res.status(), "Connectivity test finished");
            } else {
                debug!(upstream_uri=%url, status_code=%res.status(), "Connectivity test finished");
            }
            convert_response(res)
        }
        Err(err) => {
            warn!(upstream_uri=%url, err=%err, "Connectivity test failed");
            ProxyError::Upstream(err).into_response()
        }
    }
}
