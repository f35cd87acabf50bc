use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use releasesync_core::errors::SyncError;
use releasesync_core::releases::{ReleaseRecord, ReleaseRepositoryTrait};
use releasesync_core::sync::{SyncPhase, SyncReport, SyncTrigger};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub sync_enabled: bool,
    pub running: bool,
    pub scheduler_running: bool,
    #[serde(flatten)]
    pub phase: SyncPhase,
    pub current_trigger: Option<SyncTrigger>,
    pub last_report: Option<SyncReport>,
}

/// Runs a sync immediately and returns its report.
async fn sync_releases(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncReport>> {
    let synchronizer = state.synchronizer.clone().ok_or_else(|| {
        SyncError::NotConfigured("catalog client credentials are not set".to_string())
    })?;
    info!("[ReleaseSync] Manual sync requested");
    let report = synchronizer.run(SyncTrigger::Manual).await?;
    Ok(Json(report))
}

async fn get_sync_status(State(state): State<Arc<AppState>>) -> Json<SyncStatusResponse> {
    let snapshot = state.sync_status.snapshot();
    Json(SyncStatusResponse {
        sync_enabled: state.synchronizer.is_some(),
        running: state
            .synchronizer
            .as_ref()
            .is_some_and(|synchronizer| synchronizer.is_running()),
        scheduler_running: state.scheduler_running().await,
        phase: snapshot.phase,
        current_trigger: snapshot.current_trigger,
        last_report: snapshot.last_report,
    })
}

async fn list_releases(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ReleaseRecord>>> {
    Ok(Json(state.release_repository.load_releases()?))
}

async fn get_release(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ReleaseRecord>> {
    state
        .release_repository
        .get_release(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Release {}", id)))
}

/// Serves the stored cover image bytes.
async fn get_release_image(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let media = state
        .release_repository
        .get_featured_media(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("Image for release {}", id)))?;
    let (content_type, bytes) = state
        .release_repository
        .get_media_data(&media.id)?
        .ok_or_else(|| ApiError::NotFound(format!("Media {}", media.id)))?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/releases", get(list_releases))
        .route("/releases/sync", post(sync_releases))
        .route("/releases/sync/status", get(get_sync_status))
        .route("/releases/{id}", get(get_release))
        .route("/releases/{id}/image", get(get_release_image))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use tokio::sync::Notify;

    use crate::api::app_router;
    use crate::api::test_http::send;
    use crate::test_support::{scripted_state, unconfigured_state, ScriptedSource};

    #[tokio::test]
    async fn manual_sync_creates_release_and_reports() {
        let (state, _dir) = scripted_state(ScriptedSource::healthy());
        let app = app_router(state.clone());

        let (status, report) = send(&app, "POST", "/api/v1/releases/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["trigger"], "manual");
        assert_eq!(report["createdCount"], 1);
        assert_eq!(report["pruned"], true);

        let (status, releases) = send(&app, "GET", "/api/v1/releases", None).await;
        assert_eq!(status, StatusCode::OK);
        let releases = releases.as_array().expect("array");
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0]["externalId"], "A1");
        assert_eq!(releases[0]["genre"], "Dance");

        let id = releases[0]["id"].as_str().expect("id").to_string();
        let (status, release) = send(&app, "GET", &format!("/api/v1/releases/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(release["title"], "Night Drive");

        let (status, _) = send(&app, "GET", &format!("/api/v1/releases/{}/image", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, sync_status) = send(&app, "GET", "/api/v1/releases/sync/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sync_status["syncEnabled"], true);
        assert_eq!(sync_status["running"], false);
        assert_eq!(sync_status["phase"], "done");
        assert_eq!(sync_status["lastReport"]["createdCount"], 1);
    }

    #[tokio::test]
    async fn repeated_manual_sync_updates_in_place() {
        let (state, _dir) = scripted_state(ScriptedSource::healthy());
        let app = app_router(state);

        send(&app, "POST", "/api/v1/releases/sync", None).await;
        let (status, second) = send(&app, "POST", "/api/v1/releases/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["createdCount"], 0);
        assert_eq!(second["updatedCount"], 1);

        let (_, releases) = send(&app, "GET", "/api/v1/releases", None).await;
        assert_eq!(releases.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn unknown_release_is_not_found() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, body) = send(&app, "GET", "/api/v1/releases/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn sync_without_credentials_is_unavailable() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, body) = send(&app, "POST", "/api/v1/releases/sync", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "NOT_CONFIGURED");

        let (_, sync_status) = send(&app, "GET", "/api/v1/releases/sync/status", None).await;
        assert_eq!(sync_status["syncEnabled"], false);
        assert_eq!(sync_status["lastReport"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn auth_failure_is_bad_gateway_and_stores_nothing() {
        let (state, _dir) = scripted_state(ScriptedSource::failing_auth(Some(401)));
        let app = app_router(state);

        let (status, body) = send(&app, "POST", "/api/v1/releases/sync", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("Authentication failed"));

        let (_, releases) = send(&app, "GET", "/api/v1/releases", None).await;
        assert_eq!(releases.as_array().map(Vec::len), Some(0));

        let (_, sync_status) = send(&app, "GET", "/api/v1/releases/sync/status", None).await;
        assert_eq!(sync_status["phase"], "failed");
        assert_eq!(sync_status["lastReport"]["status"], "failed");
    }

    #[tokio::test]
    async fn overlapping_sync_is_rejected_with_conflict() {
        let release = std::sync::Arc::new(Notify::new());
        let source = ScriptedSource::blocked(release.clone());
        let (state, _dir) = scripted_state(source);
        let app = app_router(state.clone());

        let synchronizer = state.synchronizer.clone().expect("sync configured");
        let background = tokio::spawn(async move {
            synchronizer
                .run(releasesync_core::sync::SyncTrigger::Periodic)
                .await
        });
        for _ in 0..50 {
            if state.synchronizer.as_ref().is_some_and(|s| s.is_running()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (status, body) = send(&app, "POST", "/api/v1/releases/sync", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (_, sync_status) = send(&app, "GET", "/api/v1/releases/sync/status", None).await;
        assert_eq!(sync_status["running"], true);
        assert_eq!(sync_status["currentTrigger"], "periodic");

        release.notify_one();
        let report = background.await.expect("join").expect("background run");
        assert_eq!(report.created_count, 1);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_without_pruning() {
        let source = ScriptedSource::failing_fetch(Some(503));
        let (state, _dir) = scripted_state(source);
        let app = app_router(state.clone());

        let (status, _) = send(&app, "POST", "/api/v1/releases/sync", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let last = state.sync_status.snapshot().last_report.expect("report");
        assert!(!last.pruned);
        assert_eq!(last.error.as_deref().map(|e| e.contains("genre:dance")), Some(true));
    }
}
