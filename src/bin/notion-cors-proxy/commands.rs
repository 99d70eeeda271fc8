use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gateway_config::config::ProxyConfig;
use std::path::PathBuf;

pub mod start;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Application {
    #[command(subcommand)]
    pub command: Option<SubCommands>,

    /// Configuration file to use. Defaults to `notion-proxy.toml` in the
    /// working directory, when it exists.
    #[clap(long, env, global = true)]
    pub config_file: Option<PathBuf>,

    /// Format of the log output written to stderr.
    #[clap(long, env, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum SubCommands {
    /// Start the proxy, forwarding requests to the Notion API with permissive
    /// CORS headers. This is the default when no subcommand is given.
    Start(start::CliArguments),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

pub async fn handle_command(app: Application) -> Result<()> {
    let config = ProxyConfig::load(app.config_file.as_deref())?;

    match app.command {
        Some(SubCommands::Start(args)) => start::handle_command(args, config).await,
        None => {
            // Still picks up the options that are set through the environment.
            let args = start::CliArguments::try_parse_from([env!("CARGO_BIN_NAME")])?;
            start::handle_command(args, config).await
        }
    }
}
