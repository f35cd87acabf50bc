use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::releases::PublishStatus;
use crate::utils::text::{is_http_url, sanitize_optional, sanitize_text_field};

/// Date format accepted for `event_date`.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub ticket_url: Option<String>,
    pub status: PublishStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Submission for a new event. Absent optional fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub ticket_url: Option<String>,
    pub status: Option<PublishStatus>,
}

/// Full replacement of an event's editable fields.
///
/// A field missing from the submission is cleared on the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<String>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub ticket_url: Option<String>,
    pub status: Option<PublishStatus>,
}

/// Sanitized, validated event fields ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub ticket_url: Option<String>,
    pub status: PublishStatus,
}

fn parse_event_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, EVENT_DATE_FORMAT)
            .map(Some)
            .map_err(|_| Error::validation(format!("Invalid event date '{}'", raw))),
        None => Ok(None),
    }
}

fn validate_ticket_url(value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(url) if is_http_url(url) => Ok(Some(url.to_string())),
        Some(url) => Err(Error::validation(format!("Invalid ticket URL '{}'", url))),
        None => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_fields(
    title: &str,
    description: Option<&str>,
    event_date: Option<&str>,
    city: Option<&str>,
    venue: Option<&str>,
    ticket_url: Option<&str>,
    status: Option<PublishStatus>,
) -> Result<EventFields> {
    let title = sanitize_text_field(title);
    if title.is_empty() {
        return Err(Error::validation("Event title is required"));
    }
    Ok(EventFields {
        title,
        description: description
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
        event_date: parse_event_date(event_date)?,
        city: sanitize_optional(city),
        venue: sanitize_optional(venue),
        ticket_url: validate_ticket_url(ticket_url)?,
        status: status.unwrap_or(PublishStatus::Publish),
    })
}

impl NewEvent {
    pub fn validate(&self) -> Result<EventFields> {
        build_fields(
            &self.title,
            self.description.as_deref(),
            self.event_date.as_deref(),
            self.city.as_deref(),
            self.venue.as_deref(),
            self.ticket_url.as_deref(),
            self.status,
        )
    }
}

impl EventUpdate {
    pub fn validate(&self) -> Result<EventFields> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("Event id is required"));
        }
        build_fields(
            &self.title,
            self.description.as_deref(),
            self.event_date.as_deref(),
            self.city.as_deref(),
            self.venue.as_deref(),
            self.ticket_url.as_deref(),
            self.status,
        )
    }
}
