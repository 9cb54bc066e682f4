use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::storage::Dispatcher;

pub mod routes;

/// Largest accepted request body. Forms carry images inline as data URLs.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Server state
pub struct AppState {
    pub storage: Dispatcher,
    pub ping_message: String,
}

impl AppState {
    pub fn new(storage: Dispatcher, ping_message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            storage,
            ping_message: ping_message.into(),
        })
    }
}

/// Build the `/api` router. With `static_dir` set, unmatched paths are
/// served from that directory.
pub fn router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/ping", get(routes::ping))
        .route("/demo", get(routes::demo))
        .route("/forms", get(routes::list_forms).post(routes::create_form))
        .route(
            "/forms/{id}",
            get(routes::get_form).put(routes::update_form).delete(routes::delete_form),
        )
        .route("/responses", get(routes::list_responses).post(routes::submit_response))
        .route("/responses/form/{form_id}", get(routes::responses_for_form))
        .route(
            "/responses/{id}",
            get(routes::get_response).delete(routes::delete_response),
        );

    let app = Router::new().nest("/api", api);
    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: &ServerConfig, storage: Dispatcher) -> anyhow::Result<()> {
    let backend = storage.backend();
    let state = AppState::new(storage, config.ping_message.clone());
    let static_dir = config.production.then(|| config.static_dir.clone());
    let app = router(state, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {} with {} storage", addr, backend);
    crate::ui::header(&format!("Server running at http://{}", addr));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
