use crate::parser::{
    base_path_parser, header_spelling_parser, path_prefix_parser, upstream_parser,
};
use anyhow::{Context, Result};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::net::SocketAddr;
use std::path::Path;
use url::Url;

/// File that is picked up from the working directory when no config file was
/// passed explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "notion-proxy.toml";

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:3001";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.notion.com";
pub const DEFAULT_PATH_PREFIX: &str = "/notion";
pub const DEFAULT_UPSTREAM_BASE_PATH: &str = "/v1";
pub const DEFAULT_VERSION_HEADER: &str = "Notion-Version";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// This struct represents the notion-proxy.toml configuration. All properties
/// in here are optional so that the user only specifies the ones that they
/// want in that file.
#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProxyConfig {
    /// Address the gateway listens on.
    pub listen_address: Option<SocketAddr>,

    /// Origin all forwarded requests are sent to.
    #[serde(default, deserialize_with = "parse_upstream")]
    pub upstream_url: Option<Url>,

    /// Local prefix that gets forwarded, e.g. `/notion`.
    #[serde(default, deserialize_with = "parse_path_prefix")]
    pub path_prefix: Option<String>,

    /// Path on the upstream that replaces the prefix, e.g. `/v1`.
    #[serde(default, deserialize_with = "parse_base_path")]
    pub upstream_base_path: Option<String>,

    /// Name of the API version header, allowed in CORS preflights.
    #[serde(default, deserialize_with = "parse_header_name")]
    pub version_header: Option<String>,

    /// Version sent by the connectivity test when the caller sends none.
    pub notion_version: Option<String>,

    /// Log every forwarded request and its upstream response at info level.
    pub verbose: Option<bool>,
}

impl ProxyConfig {
    /// Load the configuration file.
    ///
    /// If `path` is set the file has to exist. Otherwise the default file in
    /// the working directory is used when present, and an empty config when
    /// it is not.
    pub fn load(path: Option<&Path>) -> Result<ProxyConfig> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(ProxyConfig::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<ProxyConfig> {
        Ok(toml::from_str(contents)?)
    }
}

fn parse_upstream<'de, D: Deserializer<'de>>(input: D) -> Result<Option<Url>, D::Error> {
    let input_str: String = Deserialize::deserialize(input)?;
    upstream_parser(&input_str).map(Some).map_err(Error::custom)
}

fn parse_path_prefix<'de, D: Deserializer<'de>>(input: D) -> Result<Option<String>, D::Error> {
    let input_str: String = Deserialize::deserialize(input)?;
    path_prefix_parser(&input_str).map(Some).map_err(Error::custom)
}

fn parse_base_path<'de, D: Deserializer<'de>>(input: D) -> Result<Option<String>, D::Error> {
    let input_str: String = Deserialize::deserialize(input)?;
    base_path_parser(&input_str).map(Some).map_err(Error::custom)
}

fn parse_header_name<'de, D: Deserializer<'de>>(input: D) -> Result<Option<String>, D::Error> {
    let input_str: String = Deserialize::deserialize(input)?;
    header_spelling_parser(&input_str).map(Some).map_err(Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ProxyConfig::from_toml("").unwrap();
        assert!(config.listen_address.is_none());
        assert!(config.upstream_url.is_none());
        assert!(config.path_prefix.is_none());
        assert!(config.verbose.is_none());
    }

    #[test]
    fn parses_all_keys() {
        let config = ProxyConfig::from_toml(
            r#"
            listen-address = "127.0.0.1:4000"
            upstream-url = "http://localhost:9000"
            path-prefix = "/api/notion/"
            upstream-base-path = "/v2"
            version-header = "X-Api-Version"
            notion-version = "2025-09-03"
            verbose = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config.listen_address,
            Some("127.0.0.1:4000".parse().unwrap())
        );
        assert_eq!(
            config.upstream_url.unwrap().as_str(),
            "http://localhost:9000/"
        );
        assert_eq!(config.path_prefix.as_deref(), Some("/api/notion"));
        assert_eq!(config.upstream_base_path.as_deref(), Some("/v2"));
        assert_eq!(config.version_header.as_deref(), Some("X-Api-Version"));
        assert_eq!(config.notion_version.as_deref(), Some("2025-09-03"));
        assert_eq!(config.verbose, Some(true));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ProxyConfig::from_toml(r#"path-prefix = "/""#).is_err());
        assert!(ProxyConfig::from_toml(r#"upstream-url = "ftp://example.com""#).is_err());
        assert!(ProxyConfig::from_toml(r#"unknown-key = 1"#).is_err());
        assert!(ProxyConfig::from_toml(r#"version-header = "bad header""#).is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "path-prefix = \"/n\"").unwrap();

        let config = ProxyConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.path_prefix.as_deref(), Some("/n"));
    }

    #[test]
    fn load_fails_for_missing_explicit_file() {
        let err = ProxyConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("Unable to read config file"));
    }
}
