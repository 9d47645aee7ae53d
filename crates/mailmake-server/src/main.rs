//! Mailmake HTTP API Server
//!
//! Provides REST endpoints for template management and preview rendering,
//! plus a WebSocket endpoint that drives a live editor session.

use axum::{
    Router,
    http::HeaderValue,
    response::Json,
    routing::get,
};
use mailmake::RenderPipeline;
use mailmake_registry::{Delayed, FileSystemStorage, MemoryStorage, Registry, TemplateStore};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

mod config;
mod error;
mod models;
mod routes;

use config::{ServerConfig, StorageBackend};
use error::Result;

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TemplateStore>,
    pub pipeline: RenderPipeline,
    pub config: ServerConfig,
}

impl AppState {
    pub fn from_config(config: ServerConfig) -> Self {
        let latency = Duration::from_millis(config.save_latency_ms);
        let store = match config.storage_backend {
            StorageBackend::Memory => with_latency(Registry::new(MemoryStorage::new()), latency),
            StorageBackend::Fs => with_latency(
                Registry::new(FileSystemStorage::new(&config.data_dir)),
                latency,
            ),
        };

        Self {
            store,
            pipeline: RenderPipeline::new().with_cache(config.render_cache_size),
            config,
        }
    }
}

fn with_latency<T: TemplateStore + 'static>(store: T, latency: Duration) -> Arc<dyn TemplateStore> {
    if latency.is_zero() {
        Arc::new(store)
    } else {
        Arc::new(Delayed::new(store, latency))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    let default_filter = if config.debug {
        "mailmake_server=debug,mailmake_editor=debug,mailmake_registry=debug,mailmake=debug,tower_http=debug"
    } else {
        "mailmake_server=debug,tower_http=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()),
        )
        .init();

    info!(
        backend = ?config.storage_backend,
        data_dir = %config.data_dir.display(),
        "Starting Mailmake Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::from_config(config.clone());
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes
        .nest("/api", api_routes())
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// API routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/templates", routes::templates::router())
        .nest("/render", routes::render::router())
        .nest("/editor", routes::editor::router())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint
async fn health_check() -> Result<Json<Value>> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "mailmake-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": time::OffsetDateTime::now_utc()
    })))
}
