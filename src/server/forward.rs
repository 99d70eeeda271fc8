use crate::config::GatewayConfig;
use crate::server::error::ProxyError;
use crate::server::util::{convert_response, strip_request_headers, CLIENT};
use crate::server::SharedConfig;
use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::header::{self, HeaderMap};
use http::{Request, StatusCode, Uri, Version};
use tracing::{debug, info, trace, warn, Level};

/// Rewrite the path of an inbound request to the path on the upstream.
///
/// `path_and_query` has to equal `prefix` or continue it with a `/` or a query
/// string, otherwise `None` is returned. The prefix is replaced by `base`, the
/// remainder including the query string is kept as is.
pub fn rewrite_path(path_and_query: &str, prefix: &str, base: &str) -> Option<String> {
    let rest = path_and_query.strip_prefix(prefix)?;

    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')) {
        return None;
    }

    let mut rewritten = format!("{base}{rest}");
    if !rewritten.starts_with('/') {
        rewritten.insert(0, '/');
    }

    Some(rewritten)
}

pub(crate) async fn handler(
    State(config): State<SharedConfig>,
    req: Request<Body>,
) -> impl IntoResponse {
    let req_uri = req.uri().to_string();
    let method = req.method().to_string();

    match forward(&config, req).await {
        Ok(res) => res,
        Err(err) => {
            warn!(
                method=%method,
                req_uri=%req_uri,
                err=%err,
                "Unable to proxy request to upstream server",
            );
            err.into_response()
        }
    }
}

async fn forward(config: &GatewayConfig, mut req: Request<Body>) -> Result<Response, ProxyError> {
    let req_uri = req.uri().to_string();
    let method = req.method().to_string();

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let Some(upstream_path) = rewrite_path(
        path_and_query,
        &config.path_prefix,
        &config.upstream_base_path,
    ) else {
        // The router only sends requests under the prefix here.
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let upstream_uri: Uri = format!(
        "{}{}",
        config.upstream_url.as_str().trim_end_matches('/'),
        upstream_path
    )
    .parse()?;

    if config.verbose {
        info!(method=%method, req_uri=%req_uri, upstream_uri=%upstream_uri, "Proxying request");
        info!(headers=?redacted_headers(req.headers()), "Request headers");
    } else {
        trace!(method=%method, req_uri=%req_uri, upstream_uri=%upstream_uri, "Proxying request");
    }

    strip_request_headers(req.headers_mut());
    *req.uri_mut() = upstream_uri;
    *req.version_mut() = Version::HTTP_11;

    let upstream_req = reqwest::Request::try_from(req).map_err(ProxyError::InvalidRequest)?;
    let res = CLIENT
        .execute(upstream_req)
        .await
        .map_err(ProxyError::Upstream)?;

    let status = res.status();
    let message = if status.is_server_error() {
        "Response from the upstream source returned a server error status code"
    } else if status.is_client_error() {
        "Response from the upstream source returned a client error status code"
    } else {
        "Response from the upstream source"
    };

    let level = response_level(status, config.verbose);
    if level == Level::WARN {
        warn!(method=%method, req_uri=%req_uri, upstream_uri=%res.url(), status_code=%status, "{message}");
    } else if level == Level::INFO {
        info!(method=%method, req_uri=%req_uri, upstream_uri=%res.url(), status_code=%status, "{message}");
    } else if level == Level::DEBUG {
        debug!(method=%method, req_uri=%req_uri, upstream_uri=%res.url(), status_code=%status, "{message}");
    } else {
        trace!(method=%method, req_uri=%req_uri, upstream_uri=%res.url(), status_code=%status, "{message}");
    }

    Ok(convert_response(res))
}

/// Level at which the upstream response is logged. Server errors are always a
/// warning, verbose mode lifts everything else to info.
fn response_level(status: StatusCode, verbose: bool) -> Level {
    if status.is_server_error() {
        Level::WARN
    } else if verbose {
        Level::INFO
    } else if status.is_client_error() {
        Level::DEBUG
    } else {
        Level::TRACE
    }
}

/// Header pairs for logging, with the credentials left out.
fn redacted_headers(headers: &HeaderMap) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name == header::AUTHORIZATION || name == header::PROXY_AUTHORIZATION {
                "<redacted>"
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            (name.as_str(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case("/notion", "/v1")]
    #[case("/notion/", "/v1/")]
    #[case("/notion/users/me", "/v1/users/me")]
    #[case("/notion/search?query=a%20b", "/v1/search?query=a%20b")]
    #[case("/notion?page_size=10", "/v1?page_size=10")]
    #[case("/notion/databases/abc/query", "/v1/databases/abc/query")]
    fn rewrite_path_ok(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            rewrite_path(input, "/notion", "/v1").as_deref(),
            Some(expected)
        );
    }

    #[rstest]
    #[case("/notionx")]
    #[case("/health")]
    #[case("/")]
    #[case("/v1/notion")]
    fn rewrite_path_no_match(#[case] input: &str) {
        assert_eq!(rewrite_path(input, "/notion", "/v1"), None);
    }

    #[rstest]
    #[case("/notion", "/")]
    #[case("/notion/pages/1", "/pages/1")]
    #[case("/notion?x=1", "/?x=1")]
    fn rewrite_path_to_root(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(rewrite_path(input, "/notion", "").as_deref(), Some(expected));
    }

    #[rstest]
    #[case(StatusCode::OK, false, Level::TRACE)]
    #[case(StatusCode::FOUND, false, Level::TRACE)]
    #[case(StatusCode::UNAUTHORIZED, false, Level::DEBUG)]
    #[case(StatusCode::BAD_GATEWAY, false, Level::WARN)]
    #[case(StatusCode::OK, true, Level::INFO)]
    #[case(StatusCode::UNAUTHORIZED, true, Level::INFO)]
    #[case(StatusCode::BAD_GATEWAY, true, Level::WARN)]
    fn response_level_follows_verbosity(
        #[case] status: StatusCode,
        #[case] verbose: bool,
        #[case] expected: Level,
    ) {
        assert_eq!(response_level(status, verbose), expected);
    }

    #[test]
    fn redacted_headers_hides_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let redacted = redacted_headers(&headers);
        assert!(redacted.contains(&("authorization", "<redacted>")));
        assert!(redacted.contains(&("accept", "application/json")));
    }
}
