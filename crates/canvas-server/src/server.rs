use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::handlers::messages;
use crate::middleware::RequestSpan;
use crate::state::{AppState, DEFAULT_MODEL, DEFAULT_UPSTREAM_URL};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub model: String,
    pub cors_origin: String,
    pub upstream_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            model: DEFAULT_MODEL.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
        }
    }
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/messages")
            .route(web::post().to(messages::handler))
            .default_service(web::route().to(messages::method_not_allowed)),
    );
}

/// CORS for browser callers: one origin, `POST` only, and just the headers
/// the client sends.
pub fn build_cors(origin: &str) -> Cors {
    let cors = if origin == "*" {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin(origin)
    };
    cors.allowed_methods(vec!["POST"])
        .allowed_headers(vec!["Content-Type", "x-api-key", "anthropic-version"])
        .max_age(3600)
}

pub async fn run_server(config: ServerConfig) -> io::Result<()> {
    tracing::info!(
        port = config.port,
        model = %config.model,
        cors_origin = %config.cors_origin,
        upstream = %config.upstream_url,
        "Starting messages proxy"
    );

    let state = web::Data::new(AppState::new(
        config.upstream_url.clone(),
        config.model.clone(),
    ));
    let origin = config.cors_origin.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(build_cors(&origin))
            .wrap(RequestSpan)
            .configure(app_config)
    })
    .bind(("0.0.0.0", config.port))?
    .run();

    tracing::info!("Proxy server running on http://localhost:{}", config.port);
    server.await
}
