//! Wire types for the catalog and events APIs.

use releasesync_core::sync::CatalogItem;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Catalog API
// ─────────────────────────────────────────────────────────────────────────────

/// Token endpoint response. `access_token` is optional so a body without it
/// surfaces as an auth error instead of a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
}

/// OAuth-style error body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

/// Error body returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackEntry>,
    pub total: Option<u32>,
    pub next: Option<String>,
}

/// One element of `tracks.items`. Elements that do not decode as a track
/// (null, wrong type, mistyped fields) are kept as raw JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrackEntry {
    Track(TrackItem),
    Invalid(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub external_urls: Option<ExternalUrls>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl From<TrackItem> for CatalogItem {
    fn from(track: TrackItem) -> Self {
        let Some(album) = track.album else {
            return CatalogItem::default();
        };
        CatalogItem {
            album_id: album.id,
            album_name: album.name,
            artist_name: album.artists.into_iter().next().and_then(|a| a.name),
            streaming_url: album.external_urls.and_then(|u| u.spotify),
            cover_image_url: album.images.into_iter().next().and_then(|i| i.url),
        }
    }
}

/// Undecodable entries become an empty item, which the synchronizer skips
/// as malformed.
impl From<TrackEntry> for CatalogItem {
    fn from(entry: TrackEntry) -> Self {
        match entry {
            TrackEntry::Track(track) => track.into(),
            TrackEntry::Invalid(_) => CatalogItem::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events API (Discovery)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryEventsResponse {
    #[serde(rename = "_embedded")]
    pub embedded: Option<DiscoveryEmbeddedEvents>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryEmbeddedEvents {
    #[serde(default)]
    pub events: Vec<DiscoveryEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryEvent {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub dates: Option<DiscoveryDates>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<DiscoveryEventEmbedded>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDates {
    pub start: Option<DiscoveryStart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryStart {
    pub local_date: Option<String>,
    pub local_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryEventEmbedded {
    #[serde(default)]
    pub venues: Vec<DiscoveryVenue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryVenue {
    pub name: Option<String>,
    pub city: Option<NamedValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedValue {
    pub name: Option<String>,
}

/// Index of the preferred listing image in an event's image list.
pub const LISTING_IMAGE_INDEX: usize = 3;

/// Upcoming event as exposed to API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub local_date: Option<String>,
    pub local_time: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
}

impl From<DiscoveryEvent> for UpcomingEvent {
    fn from(event: DiscoveryEvent) -> Self {
        let image_url = event
            .images
            .get(LISTING_IMAGE_INDEX)
            .or_else(|| event.images.first())
            .and_then(|image| image.url.clone());
        let start = event.dates.and_then(|d| d.start);
        let venue = event
            .embedded
            .and_then(|e| e.venues.into_iter().next());
        UpcomingEvent {
            id: event.id,
            name: event.name,
            url: event.url,
            image_url,
            local_date: start.as_ref().and_then(|s| s.local_date.clone()),
            local_time: start.and_then(|s| s.local_time),
            venue: venue.as_ref().and_then(|v| v.name.clone()),
            city: venue.and_then(|v| v.city).and_then(|c| c.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_maps_album_fields() {
        let json = r#"{"tracks":{"items":[{"id":"t1","name":"Track","album":{
            "id":"A1","name":"Night Drive",
            "artists":[{"name":"Lumen"},{"name":"Guest"}],
            "external_urls":{"spotify":"https://open.spotify.com/album/A1"},
            "images":[{"url":"https://i.scdn.co/image/big","width":640,"height":640},
                      {"url":"https://i.scdn.co/image/small","width":64,"height":64}]}}],
            "total":1,"next":null}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let items: Vec<CatalogItem> = response
            .tracks
            .unwrap()
            .items
            .into_iter()
            .map(CatalogItem::from)
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].album_id.as_deref(), Some("A1"));
        assert_eq!(items[0].album_name.as_deref(), Some("Night Drive"));
        assert_eq!(items[0].artist_name.as_deref(), Some("Lumen"));
        assert_eq!(
            items[0].streaming_url.as_deref(),
            Some("https://open.spotify.com/album/A1")
        );
        assert_eq!(
            items[0].cover_image_url.as_deref(),
            Some("https://i.scdn.co/image/big")
        );
    }

    #[test]
    fn track_without_album_maps_to_empty_item() {
        let json = r#"{"tracks":{"items":[{"id":"t1","album":null}]}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let track = response.tracks.unwrap().items.into_iter().next().unwrap();
        let item = CatalogItem::from(track);
        assert_eq!(item, CatalogItem::default());
    }

    #[test]
    fn undecodable_entries_do_not_fail_the_page() {
        let json = r#"{"tracks":{"items":[null,"oops",{"id":"t2","album":{"id":7}},
            {"id":"t1","album":{"id":"A1","name":"Night Drive","artists":[{"name":"Lumen"}]}}]}}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let items: Vec<CatalogItem> = response
            .tracks
            .unwrap()
            .items
            .into_iter()
            .map(CatalogItem::from)
            .collect();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], CatalogItem::default());
        assert_eq!(items[1], CatalogItem::default());
        assert_eq!(items[2], CatalogItem::default());
        assert_eq!(items[3].album_id.as_deref(), Some("A1"));
        assert_eq!(items[3].artist_name.as_deref(), Some("Lumen"));
    }

    #[test]
    fn token_response_without_token_parses() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"token_type":"Bearer","expires_in":3600}"#).unwrap();
        assert!(response.access_token.is_none());
    }

    #[test]
    fn discovery_event_prefers_fourth_image() {
        let json = r#"{"_embedded":{"events":[{"id":"E1","name":"Summer Tour","url":"https://t.example/E1",
            "images":[{"url":"https://img/0"},{"url":"https://img/1"},{"url":"https://img/2"},{"url":"https://img/3"}],
            "dates":{"start":{"localDate":"2026-07-14","localTime":"20:00:00"}},
            "_embedded":{"venues":[{"name":"Arena","city":{"name":"Lisbon"}}]}}]}}"#;
        let response: DiscoveryEventsResponse = serde_json::from_str(json).unwrap();
        let event = response.embedded.unwrap().events.into_iter().next().unwrap();
        let event = UpcomingEvent::from(event);
        assert_eq!(event.image_url.as_deref(), Some("https://img/3"));
        assert_eq!(event.local_date.as_deref(), Some("2026-07-14"));
        assert_eq!(event.venue.as_deref(), Some("Arena"));
        assert_eq!(event.city.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn discovery_event_falls_back_to_first_image() {
        let json = r#"{"id":"E2","name":"Club Night","images":[{"url":"https://img/only"}]}"#;
        let event: DiscoveryEvent = serde_json::from_str(json).unwrap();
        let event = UpcomingEvent::from(event);
        assert_eq!(event.image_url.as_deref(), Some("https://img/only"));
        assert_eq!(event.venue, None);
    }

    #[test]
    fn discovery_response_without_embedded_is_empty() {
        let response: DiscoveryEventsResponse =
            serde_json::from_str(r#"{"page":{"size":20,"totalElements":0}}"#).unwrap();
        assert!(response.embedded.is_none());
    }
}
