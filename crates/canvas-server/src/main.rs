use clap::Parser;

use canvas_server::logging::init_logging;
use canvas_server::server::{
    run_server, ServerConfig, DEFAULT_CORS_ORIGIN, DEFAULT_PORT,
};
use canvas_server::state::{DEFAULT_MODEL, DEFAULT_UPSTREAM_URL};

#[derive(Parser, Debug, Clone)]
#[command(name = "canvas-server")]
#[command(about = "Messages proxy for the chat canvas")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Model name injected into every forwarded request
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL)]
    model: String,

    /// Browser origin allowed to call the proxy
    #[arg(long, env = "CORS_ORIGIN", default_value = DEFAULT_CORS_ORIGIN)]
    cors_origin: String,

    /// Base URL of the upstream messages API
    #[arg(long, env = "UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.debug);

    if cli.debug {
        tracing::debug!(?cli, "Debug mode enabled");
    }

    run_server(ServerConfig {
        port: cli.port,
        model: cli.model,
        cors_origin: cli.cors_origin,
        upstream_url: cli.upstream_url,
    })
    .await?;
    Ok(())
}
