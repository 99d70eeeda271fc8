use anyhow::Result;
use gateway_config::config::{
    DEFAULT_LISTEN_ADDRESS, DEFAULT_NOTION_VERSION, DEFAULT_PATH_PREFIX,
    DEFAULT_UPSTREAM_BASE_PATH, DEFAULT_UPSTREAM_URL, DEFAULT_VERSION_HEADER,
};
use gateway_config::parser::{
    base_path_parser, header_name_parser, path_prefix_parser, upstream_parser,
};
use http::header::HeaderName;
use std::net::SocketAddr;
use url::Url;

/// The fully resolved settings of the gateway. This is immutable once the
/// server has started and is shared by all requests.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_address: SocketAddr,

    /// Origin of the upstream API, e.g. `https://api.notion.com/`.
    pub upstream_url: Url,

    /// Local path prefix without trailing slash, e.g. `/notion`.
    pub path_prefix: String,

    /// Upstream path replacing the prefix, e.g. `/v1`. Empty for the root.
    pub upstream_base_path: String,

    /// Header carrying the API version.
    pub version_header: HeaderName,

    /// Human readable spelling of `version_header`, used in the CORS headers.
    pub version_header_display: String,

    /// API version the connectivity test sends when the caller sends none.
    pub notion_version: String,

    pub verbose: bool,
}

impl GatewayConfig {
    /// Full upstream URL of the "who am I" endpoint used by the connectivity
    /// test.
    pub fn users_me_url(&self) -> Url {
        let mut url = self.upstream_url.clone();
        url.set_path(&format!("{}/users/me", self.upstream_base_path));
        url
    }

    /// Value of the `Access-Control-Allow-Headers` header.
    pub fn cors_allow_headers(&self) -> String {
        format!(
            "Content-Type, Authorization, {}, Accept",
            self.version_header_display
        )
    }

    pub fn with_version_header(mut self, name: &str) -> Result<Self> {
        self.version_header = header_name_parser(name)?;
        self.version_header_display = name.trim().to_owned();
        Ok(self)
    }
}

impl Default for GatewayConfig {
    /// The defaults match the Notion API. The `.expect`s are safe because the
    /// inputs are constants.
    fn default() -> Self {
        GatewayConfig {
            listen_address: DEFAULT_LISTEN_ADDRESS
                .parse()
                .expect("default listen address is valid"),
            upstream_url: upstream_parser(DEFAULT_UPSTREAM_URL)
                .expect("default upstream is valid"),
            path_prefix: path_prefix_parser(DEFAULT_PATH_PREFIX)
                .expect("default prefix is valid"),
            upstream_base_path: base_path_parser(DEFAULT_UPSTREAM_BASE_PATH)
                .expect("default base path is valid"),
            version_header: HeaderName::from_static("notion-version"),
            version_header_display: DEFAULT_VERSION_HEADER.to_owned(),
            notion_version: DEFAULT_NOTION_VERSION.to_owned(),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_notion() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_address.port(), 3001);
        assert!(config.listen_address.ip().is_unspecified());
        assert_eq!(config.upstream_url.as_str(), "https://api.notion.com/");
        assert_eq!(config.path_prefix, "/notion");
        assert_eq!(config.upstream_base_path, "/v1");
        assert_eq!(config.notion_version, "2022-06-28");
        assert!(!config.verbose);
    }

    #[test]
    fn users_me_url_uses_base_path() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.users_me_url().as_str(),
            "https://api.notion.com/v1/users/me"
        );

        let config = GatewayConfig {
            upstream_base_path: String::new(),
            ..GatewayConfig::default()
        };
        assert_eq!(
            config.users_me_url().as_str(),
            "https://api.notion.com/users/me"
        );
    }

    #[test]
    fn cors_allow_headers_lists_version_header() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.cors_allow_headers(),
            "Content-Type, Authorization, Notion-Version, Accept"
        );

        let config = GatewayConfig::default()
            .with_version_header("X-Api-Version")
            .unwrap();
        assert_eq!(config.version_header.as_str(), "x-api-version");
        assert_eq!(
            config.cors_allow_headers(),
            "Content-Type, Authorization, X-Api-Version, Accept"
        );
    }
}
