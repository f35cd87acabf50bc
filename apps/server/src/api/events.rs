use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use releasesync_catalog_client::UpcomingEvent;
use releasesync_core::events::{EventRecord, EventServiceTrait, EventUpdate, NewEvent};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

async fn list_events(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<EventRecord>>> {
    Ok(Json(state.event_service.list_events()?))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(new_event): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<EventRecord>)> {
    let created = state.event_service.create_event(new_event).await?;
    info!("[Events] Created event {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<EventRecord>> {
    Ok(Json(state.event_service.get_event(&id)?))
}

/// Replaces every editable field; fields missing from the body are cleared.
async fn update_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewEvent>,
) -> ApiResult<Json<EventRecord>> {
    let update = EventUpdate {
        id,
        title: body.title,
        description: body.description,
        event_date: body.event_date,
        city: body.city,
        venue: body.venue,
        ticket_url: body.ticket_url,
        status: body.status,
    };
    Ok(Json(state.event_service.update_event(update).await?))
}

async fn delete_event(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.event_service.delete_event(&id).await?;
    info!("[Events] Deleted event {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_upcoming_events(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<UpcomingEvent>>> {
    let client = state.ticketmaster.as_ref().ok_or_else(|| {
        ApiError::Unavailable("upcoming events feed is not configured".to_string())
    })?;
    let events = client.list_events().await?;
    debug!("[Events] Upcoming feed returned {} events", events.len());
    Ok(Json(events))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/upcoming", get(list_upcoming_events))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::app_router;
    use crate::api::test_http::send;
    use crate::test_support::unconfigured_state;

    #[tokio::test]
    async fn event_crud_round_trip() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/events",
            Some(json!({
                "title": "  Summer <b>Tour</b> ",
                "eventDate": "2026-07-14",
                "city": "Lisbon",
                "venue": "Arena",
                "ticketUrl": "https://tickets.example.com/42"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Summer Tour");
        assert_eq!(created["eventDate"], "2026-07-14");
        let id = created["id"].as_str().expect("id").to_string();
        let path = format!("/api/v1/events/{}", id);

        let (status, fetched) = send(&app, "GET", &path, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["venue"], "Arena");

        let (status, updated) = send(
            &app,
            "PUT",
            &path,
            Some(json!({ "title": "Summer Tour", "city": "Porto" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["city"], "Porto");
        assert_eq!(updated["venue"], serde_json::Value::Null);
        assert_eq!(updated["eventDate"], serde_json::Value::Null);

        let (status, listed) = send(&app, "GET", "/api/v1/events", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, _) = send(&app, "DELETE", &path, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_event_is_rejected() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/events",
            Some(json!({ "title": "Show", "ticketUrl": "javascript:alert(1)" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/events",
            Some(json!({ "title": "Show", "eventDate": "14/07/2026" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn updating_missing_event_is_not_found() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/events/missing",
            Some(json!({ "title": "Ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upcoming_feed_requires_api_key() {
        let (state, _dir) = unconfigured_state();
        let app = app_router(state);

        let (status, body) = send(&app, "GET", "/api/v1/events/upcoming", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "NOT_CONFIGURED");
    }
}
