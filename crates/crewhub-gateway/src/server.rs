//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crewhub_core::config::GatewayConfig;
use crewhub_core::error::{CrewHubError, Result};
use crewhub_store::NotificationStore;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub gateway_config: GatewayConfig,
    /// Notification records — the only mutable resource this API touches.
    pub store: Arc<NotificationStore>,
    pub start_time: std::time::Instant,
}

/// Assemble the router with all notification accessor routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(super::routes::health_check))
        .route(
            "/api/users/{user_id}/notifications",
            get(super::routes::list_notifications),
        )
        .route(
            "/api/users/{user_id}/notifications/unread-count",
            get(super::routes::unread_count),
        )
        .route(
            "/api/users/{user_id}/notifications/read-all",
            post(super::routes::mark_all_read),
        )
        .route(
            "/api/notifications/{id}/read",
            post(super::routes::mark_read),
        )
        .route(
            "/api/notifications/{id}",
            delete(super::routes::delete_notification),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process terminates.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = format!(
        "{}:{}",
        state.gateway_config.host, state.gateway_config.port
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CrewHubError::Config(format!("Bind {addr}: {e}")))?;
    tracing::info!("🌐 Gateway listening on http://{addr}");

    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| CrewHubError::Config(format!("Serve: {e}")))?;
    Ok(())
}
