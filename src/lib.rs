//! A local development gateway that forwards requests from browser clients to
//! the Notion API and adds permissive CORS headers to every response.

pub mod config;
pub mod server;

pub use config::GatewayConfig;
pub use server::{app, start_web_server};
