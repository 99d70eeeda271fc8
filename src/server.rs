use crate::config::GatewayConfig;
use anyhow::{Context, Result};
use axum::routing::{any, get};
use axum::{middleware, Router, Server};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

mod cors;
mod diagnostics;
mod error;
mod forward;
mod health;
mod util;

pub use error::ProxyError;
pub use forward::rewrite_path;

/// State shared by all handlers. Read-only after startup.
pub type SharedConfig = Arc<GatewayConfig>;

/// Build the router of the gateway.
///
/// Every response passes through the CORS layer, which also answers all
/// preflight requests before they reach any of the routes.
pub fn app(config: GatewayConfig) -> Router {
    let config: SharedConfig = Arc::new(config);
    let prefix = config.path_prefix.clone();

    Router::new()
        .route("/health", get(health::handler))
        .route("/test-notion", get(diagnostics::handler))
        .route(&prefix, any(forward::handler))
        // `*path` does not match an empty tail.
        .route(&format!("{prefix}/"), any(forward::handler))
        .route(&format!("{prefix}/*path"), any(forward::handler))
        .fallback(util::not_found)
        .layer(middleware::from_fn_with_state(
            config.clone(),
            cors::cors_middleware,
        ))
        .with_state(config)
}

/// Bind to the configured listen address and serve the gateway until
/// `shutdown` completes.
///
/// `on_bound` is called once with the address that is actually being listened
/// on.
pub async fn start_web_server<F, S>(config: GatewayConfig, on_bound: F, shutdown: S) -> Result<()>
where
    F: FnOnce(SocketAddr),
    S: Future<Output = ()>,
{
    let listen_address = config.listen_address;
    let app = app(config);

    let server = Server::try_bind(&listen_address)
        .with_context(|| format!("failed to bind to {}", listen_address))?
        .serve(app.into_make_service());

    let local_addr = server.local_addr();
    debug!("Web server listening on {}", local_addr);
    on_bound(local_addr);

    server.with_graceful_shutdown(shutdown).await?;

    info!("Web server stopped");
    Ok(())
}
