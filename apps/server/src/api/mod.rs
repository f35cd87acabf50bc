use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::main_lib::AppState;

pub mod events;
pub mod releases;

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(releases::router())
        .merge(events::router());

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_http::send;
    use super::*;
    use crate::test_support::unconfigured_state;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, body) = send(&app, "GET", "/api/v1/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, _) = send(&app, "GET", "/api/v1/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
