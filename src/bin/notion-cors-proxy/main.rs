use anyhow::{Context, Result};
use clap::Parser;
use commands::{handle_command, Application, LogFormat};
use std::io;
use tracing::{debug, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

mod commands;
mod terminal;

#[tokio::main]
async fn main() {
    let app = Application::parse();

    if let Err(err) = init_logging(app.log_format) {
        eprintln!("Unable to initialize logging: {:#}", err);
        std::process::exit(1);
    }

    let result = handle_command(app).await;

    match result {
        Ok(_) => debug!("Command completed successfully"),
        Err(err) => {
            error!("Command failed: {:?}", err);
            std::process::exit(1);
        }
    }
}

/// Initialize logging for the application.
///
/// Everything that is level info and higher is logged to stderr. Users are
/// able to influence this by exporting the `RUST_LOG` environment variable.
///
/// For example: to see every request that passes through the proxy set the
/// environment variable to `RUST_LOG=notion_cors_proxy=trace,info`.
fn init_logging(format: LogFormat) -> Result<()> {
    // The filter layer controls which log levels to display.
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (text_layer, json_layer) = match format {
        LogFormat::Text => (
            Some(tracing_subscriber::fmt::layer().with_writer(io::stderr)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(io::stderr)),
        ),
    };

    Registry::default()
        .with(filter_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .context("unable to initialize logger")?;

    Ok(())
}
