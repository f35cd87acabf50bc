//! Upcoming events feed from the Ticketmaster Discovery API.

use std::fmt;
use std::time::Duration;

use log::debug;

use crate::error::{CatalogClientError, Result};
use crate::types::{DiscoveryEventsResponse, UpcomingEvent};

pub const DEFAULT_EVENTS_URL: &str = "https://app.ticketmaster.com/discovery/v2/events.json";

#[derive(Clone)]
pub struct TicketmasterConfig {
    pub events_url: String,
    pub api_key: String,
    pub keyword: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for TicketmasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketmasterConfig")
            .field("events_url", &self.events_url)
            .field("api_key", &"<redacted>")
            .field("keyword", &self.keyword)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TicketmasterClient {
    client: reqwest::Client,
    config: TicketmasterConfig,
}

impl TicketmasterClient {
    pub fn new(config: TicketmasterConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    /// Lists upcoming events. A response without `_embedded` yields no events.
    ///
    /// GET {events_url}?apikey={key}[&keyword={keyword}]
    pub async fn list_events(&self) -> Result<Vec<UpcomingEvent>> {
        let mut query: Vec<(&str, &str)> = vec![("apikey", self.config.api_key.as_str())];
        if let Some(keyword) = self.config.keyword.as_deref() {
            query.push(("keyword", keyword));
        }

        let response = self
            .client
            .get(&self.config.events_url)
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CatalogClientError::api(
                status.as_u16(),
                "There was an error retrieving events",
            ));
        }

        let parsed: DiscoveryEventsResponse = serde_json::from_str(&body)?;
        let events: Vec<UpcomingEvent> = parsed
            .embedded
            .map(|embedded| embedded.events)
            .unwrap_or_default()
            .into_iter()
            .map(UpcomingEvent::from)
            .collect();
        debug!("[ReleaseSync] Fetched {} upcoming events", events.len());
        Ok(events)
    }
}
