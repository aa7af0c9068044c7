//! HTTP server setup and routing

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::PlayerConfig;
use crate::content_store::ContentStore;
use crate::playback::Scheduler;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub scheduler: Arc<Scheduler>,
    pub store: ContentStore,
    pub config: Arc<PlayerConfig>,
    /// Cancelled on shutdown; ends open event streams
    pub shutdown: CancellationToken,
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let upload_limit = ctx.config.max_upload_bytes();

    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Content management
        .route("/api/content", get(super::handlers::list_content))
        .route(
            "/api/content/upload",
            post(super::handlers::upload_content).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/content/web", post(super::handlers::add_web_content))
        .route("/api/content/:id", delete(super::handlers::delete_content))

        // Playlist and player
        .route("/api/playlist", get(super::handlers::get_playlist))
        .route("/api/playlist", post(super::handlers::set_playlist))
        .route("/api/player", get(super::handlers::get_player_state))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
