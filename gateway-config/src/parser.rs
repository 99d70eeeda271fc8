use anyhow::{bail, Context, Result};
use http::header::HeaderName;
use url::Url;

/// Parses the input string into the upstream origin. This uses a custom parser
/// to allow for some more flexible input.
///
/// Parsing adheres to the following rules:
/// - The protocol should only allow for http and https, where https is the
///   default.
/// - Only an origin is accepted. The path is taken from the base path setting,
///   so anything besides `/` is rejected, as are query strings and fragments.
pub fn upstream_parser(input: &str) -> Result<Url> {
    let mut input = input.trim().to_owned();

    // Prepend https:// if the input does not contain ://. This is a rather
    // naive check, but it should suffice for our purposes.
    if !input.contains("://") {
        input = format!("https://{}", input);
    }

    let url = Url::parse(&input).with_context(|| format!("Unable to parse upstream {}", input))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("unsupported protocol {}", url.scheme());
    }

    if url.host_str().is_none() {
        bail!("upstream {} has no host", input);
    }

    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        bail!(
            "upstream {} must be an origin only, use the upstream base path for the path",
            input
        );
    }

    Ok(url)
}

/// Paths served by the gateway itself, which a prefix must not take over.
const RESERVED_PATHS: [&str; 2] = ["/health", "/test-notion"];

/// Parses the local path prefix under which requests get forwarded.
///
/// The prefix must start with a `/`, a trailing `/` is dropped. The root is
/// not accepted since that would shadow the health and test endpoints.
pub fn path_prefix_parser(input: &str) -> Result<String> {
    let prefix = normalize_path(input)?;

    if prefix.is_empty() {
        bail!("path prefix must not be the root");
    }

    if prefix.contains(['*', ':', '?', '#']) {
        bail!("path prefix {} contains a reserved character", input);
    }

    if RESERVED_PATHS.contains(&prefix.as_str()) {
        bail!("path prefix {} is already served by the proxy itself", input);
    }

    Ok(prefix)
}

/// Parses the path on the upstream that replaces the local prefix.
///
/// Unlike the prefix, the root is accepted and is stored as an empty string so
/// that it can be concatenated with the remainder of the request path.
pub fn base_path_parser(input: &str) -> Result<String> {
    let base = normalize_path(input)?;

    if base.contains(['?', '#']) {
        bail!("upstream base path {} must not contain a query or fragment", input);
    }

    Ok(base)
}

/// Parses a header name, such as the version header of the upstream API.
pub fn header_name_parser(input: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(input.trim().as_bytes())
        .with_context(|| format!("invalid header name {:?}", input))
}

/// Validates a header name like [`header_name_parser`], but keeps the
/// spelling of the input since it is echoed in the CORS headers.
pub fn header_spelling_parser(input: &str) -> Result<String> {
    header_name_parser(input)?;
    Ok(input.trim().to_owned())
}

fn normalize_path(input: &str) -> Result<String> {
    let input = input.trim();

    if !input.starts_with('/') {
        bail!("path {} must start with a /", input);
    }

    Ok(input.trim_end_matches('/').to_owned())
}
