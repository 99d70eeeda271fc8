use crate::terminal;
use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::Parser;
use gateway_config::config::ProxyConfig;
use gateway_config::parser::{
    base_path_parser, header_spelling_parser, path_prefix_parser, upstream_parser,
};
use notion_cors_proxy::{start_web_server, GatewayConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use tracing::{info, warn};
use url::Url;

#[derive(Parser, Clone, Debug, Default)]
pub struct CliArguments {
    /// The listen address of the proxy. Defaults to all interfaces on port
    /// 3001.
    #[clap(short, long, env)]
    listen_address: Option<SocketAddr>,

    /// The upstream API that requests are forwarded to.
    ///
    /// Only an origin is accepted, `https://` is assumed when no protocol is
    /// given. Defaults to `https://api.notion.com`.
    #[clap(long, env, value_parser = upstream_parser)]
    upstream_url: Option<Url>,

    /// Local path prefix of the requests that get forwarded. Defaults to
    /// `/notion`.
    #[clap(long, env, value_parser = path_prefix_parser)]
    path_prefix: Option<String>,

    /// Path on the upstream that replaces the local prefix. Defaults to `/v1`.
    #[clap(long, env, value_parser = base_path_parser)]
    upstream_base_path: Option<String>,

    /// Name of the API version header. Defaults to `Notion-Version`.
    #[clap(long, env, value_parser = header_spelling_parser)]
    version_header: Option<String>,

    /// API version the connectivity test sends when the caller does not send
    /// one. Defaults to `2022-06-28`.
    #[clap(long, env)]
    notion_version: Option<String>,

    /// Log every forwarded request, its headers and the upstream status.
    ///
    /// The environment variable accepts the usual spellings such as `1`,
    /// `yes` or `on`.
    #[clap(short, long, env, value_parser = BoolishValueParser::new())]
    verbose: bool,
}

/// Merge the command line arguments with the config file.
///
/// If the user specified a value using args, then use that. Otherwise use the
/// value configured in the config file. And fallback to the default if neither
/// are configured.
fn resolve(args: CliArguments, config: ProxyConfig) -> Result<GatewayConfig> {
    let defaults = GatewayConfig::default();

    let gateway = GatewayConfig {
        listen_address: args
            .listen_address
            .or(config.listen_address)
            .unwrap_or(defaults.listen_address),
        upstream_url: args
            .upstream_url
            .or(config.upstream_url)
            .unwrap_or(defaults.upstream_url),
        path_prefix: args
            .path_prefix
            .or(config.path_prefix)
            .unwrap_or(defaults.path_prefix),
        upstream_base_path: args
            .upstream_base_path
            .or(config.upstream_base_path)
            .unwrap_or(defaults.upstream_base_path),
        notion_version: args
            .notion_version
            .or(config.notion_version)
            .unwrap_or(defaults.notion_version),
        verbose: args.verbose || config.verbose.unwrap_or(false),
        ..defaults
    };

    match args.version_header.or(config.version_header) {
        Some(name) => gateway.with_version_header(&name),
        None => Ok(gateway),
    }
}

pub async fn handle_command(args: CliArguments, config: ProxyConfig) -> Result<()> {
    let gateway = resolve(args, config)?;

    info!(
        upstream = %gateway.upstream_url,
        prefix = %gateway.path_prefix,
        base_path = %gateway.upstream_base_path,
        "Forwarding {}/* to {}{}/*",
        gateway.path_prefix,
        gateway.upstream_url.as_str().trim_end_matches('/'),
        gateway.upstream_base_path,
    );

    let prefix = gateway.path_prefix.clone();
    let on_bound = move |addr: SocketAddr| {
        let urls = endpoint_urls(addr, &prefix);
        if let Err(err) = terminal::print_urls(&urls) {
            warn!(?err, "failed to print the endpoint urls");
        }
    };

    start_web_server(gateway, on_bound, shutdown_signal())
        .await
        .context("Web server exited with an error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("SIGINT signal received, exiting..."),
        Err(err) => warn!(?err, "unable to listen for the shutdown signal"),
    }
}

/// The URLs that are printed at startup. Listening on all interfaces is shown
/// as localhost, since that is what the browser client uses.
fn endpoint_urls(addr: SocketAddr, prefix: &str) -> HashMap<&'static str, String> {
    let host = if addr.ip().is_unspecified() || addr.ip().is_loopback() {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    };

    HashMap::from([
        ("Proxy", format!("http://{host}{prefix}/...")),
        ("Health check", format!("http://{host}/health")),
        ("Connectivity test", format!("http://{host}/test-notion")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_args_or_config() {
        let gateway = resolve(CliArguments::default(), ProxyConfig::default()).unwrap();
        assert_eq!(gateway.listen_address, "0.0.0.0:3001".parse().unwrap());
        assert_eq!(gateway.upstream_url.as_str(), "https://api.notion.com/");
        assert_eq!(gateway.path_prefix, "/notion");
        assert_eq!(gateway.upstream_base_path, "/v1");
        assert_eq!(gateway.version_header.as_str(), "notion-version");
        assert!(!gateway.verbose);
    }

    #[test]
    fn args_take_precedence_over_config() {
        let args = CliArguments::try_parse_from([
            "start",
            "--path-prefix",
            "/api",
            "--listen-address",
            "127.0.0.1:4000",
        ])
        .unwrap();
        let config = ProxyConfig::from_toml(
            r#"
            path-prefix = "/from-file"
            upstream-base-path = "/v2"
            version-header = "X-Api-Version"
            verbose = true
            "#,
        )
        .unwrap();

        let gateway = resolve(args, config).unwrap();
        assert_eq!(gateway.path_prefix, "/api");
        assert_eq!(gateway.listen_address, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(gateway.upstream_base_path, "/v2");
        assert_eq!(gateway.version_header_display, "X-Api-Version");
        assert!(gateway.verbose);
    }

    #[test]
    fn invalid_args_are_rejected() {
        assert!(CliArguments::try_parse_from(["start", "--path-prefix", "/"]).is_err());
        assert!(CliArguments::try_parse_from(["start", "--upstream-url", "ftp://x"]).is_err());
        assert!(
            CliArguments::try_parse_from(["start", "--version-header", "bad header"]).is_err()
        );
    }

    #[test]
    fn verbose_accepts_boolish_values() {
        let args = CliArguments::try_parse_from(["start", "-v"]).unwrap();
        assert!(args.verbose);

        std::env::set_var("VERBOSE", "1");
        let from_env = CliArguments::try_parse_from(["start"]);
        std::env::set_var("VERBOSE", "off");
        let off_env = CliArguments::try_parse_from(["start"]);
        std::env::remove_var("VERBOSE");

        assert!(from_env.unwrap().verbose);
        assert!(!off_env.unwrap().verbose);
    }

    #[test]
    fn endpoint_urls_use_localhost_for_all_interfaces() {
        let urls = endpoint_urls("0.0.0.0:3001".parse().unwrap(), "/notion");
        assert_eq!(urls["Proxy"], "http://localhost:3001/notion/...");
        assert_eq!(urls["Health check"], "http://localhost:3001/health");
        assert_eq!(urls["Connectivity test"], "http://localhost:3001/test-notion");

        let urls = endpoint_urls("192.168.1.2:8080".parse().unwrap(), "/n");
        assert_eq!(urls["Health check"], "http://192.168.1.2:8080/health");
    }
}
