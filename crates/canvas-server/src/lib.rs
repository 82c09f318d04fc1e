//! canvas-server - the `/api/messages` proxy
//!
//! Holds no conversation state. Each request is forwarded upstream with the
//! server-configured model name and the caller's API key.

pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod state;

pub use error::{ProxyError, GENERIC_FAILURE};
pub use server::{app_config, build_cors, run_server, ServerConfig};
pub use state::AppState;
