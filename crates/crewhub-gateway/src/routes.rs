//! API route handlers for the notification accessor surface.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crewhub_core::error::CrewHubError;

use super::server::AppState;

type ApiResult = Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)>;

fn api_error(e: CrewHubError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &e {
        CrewHubError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "crewhub-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
}

/// List a user's notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(50).min(500);
    let notifications = state
        .store
        .list_for_user(&user_id, query.unread_only, limit)
        .map_err(api_error)?;
    Ok(Json(serde_json::json!({ "notifications": notifications })))
}

/// Unread count for a user.
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult {
    let count = state.store.unread_count(&user_id).map_err(api_error)?;
    Ok(Json(serde_json::json!({ "unread": count })))
}

/// Mark one notification read.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.store.mark_read(&id).map_err(api_error)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Mark all of a user's notifications read.
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult {
    let changed = state.store.mark_all_read(&user_id).map_err(api_error)?;
    Ok(Json(serde_json::json!({ "ok": true, "marked": changed })))
}

/// Delete one notification.
pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.store.delete(&id).map_err(api_error)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewhub_core::config::GatewayConfig;
    use crewhub_core::model::{Notification, Severity};
    use crewhub_core::traits::NotificationSink;
    use crewhub_store::NotificationStore;

    fn temp_state(name: &str) -> (Arc<AppState>, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).ok();
        let store = Arc::new(NotificationStore::open(&dir.join("test.db")).unwrap());
        let state = Arc::new(AppState {
            gateway_config: GatewayConfig::default(),
            store,
            start_time: std::time::Instant::now(),
        });
        (state, dir)
    }

    #[tokio::test]
    async fn test_list_and_unread_count() {
        let (state, dir) = temp_state("crewhub-gw-list");
        let n = Notification::new("u1", "Hello", "msg", Severity::Info, None);
        state.store.insert(&n).await.unwrap();

        let resp = list_notifications(
            State(state.clone()),
            Path("u1".into()),
            Query(ListQuery { unread_only: false, limit: None }),
        )
        .await
        .unwrap();
        assert_eq!(resp.0["notifications"].as_array().unwrap().len(), 1);

        let resp = unread_count(State(state.clone()), Path("u1".into())).await.unwrap();
        assert_eq!(resp.0["unread"], 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_mark_read_flow() {
        let (state, dir) = temp_state("crewhub-gw-read");
        let n = Notification::new("u1", "Hello", "msg", Severity::Info, None);
        state.store.insert(&n).await.unwrap();

        mark_read(State(state.clone()), Path(n.id.clone())).await.unwrap();
        let resp = unread_count(State(state.clone()), Path("u1".into())).await.unwrap();
        assert_eq!(resp.0["unread"], 0);

        // Unknown id maps to 404
        let err = mark_read(State(state.clone()), Path("nope".into())).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let (state, dir) = temp_state("crewhub-gw-delete");
        let n = Notification::new("u1", "Hello", "msg", Severity::Info, None);
        state.store.insert(&n).await.unwrap();

        delete_notification(State(state.clone()), Path(n.id.clone())).await.unwrap();
        let err = delete_notification(State(state), Path(n.id)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        std::fs::remove_dir_all(&dir).ok();
    }
}
