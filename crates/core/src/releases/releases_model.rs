use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Meta key holding the last time a record was seen by a sync run.
pub const META_LAST_SYNCED_AT: &str = "last_synced_at";

/// Meta key holding the search query that produced the record.
pub const META_SYNC_QUERY: &str = "sync_query";

/// Genre tag attached to every synced release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenreLabel {
    #[serde(rename = "R&B")]
    RnB,
    #[serde(rename = "Dance")]
    Dance,
    #[serde(rename = "Hip Hop")]
    HipHop,
}

impl GenreLabel {
    pub const ALL: [GenreLabel; 3] = [GenreLabel::RnB, GenreLabel::Dance, GenreLabel::HipHop];

    pub fn as_str(&self) -> &'static str {
        match self {
            GenreLabel::RnB => "R&B",
            GenreLabel::Dance => "Dance",
            GenreLabel::HipHop => "Hip Hop",
        }
    }
}

impl fmt::Display for GenreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenreLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenreLabel::ALL
            .into_iter()
            .find(|genre| genre.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("Unknown genre label '{}'", s)))
    }
}

/// Publication state of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Publish,
    Draft,
    Trash,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Publish => "publish",
            PublishStatus::Draft => "draft",
            PublishStatus::Trash => "trash",
        }
    }
}

impl FromStr for PublishStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(PublishStatus::Publish),
            "draft" => Ok(PublishStatus::Draft),
            "trash" => Ok(PublishStatus::Trash),
            other => Err(Error::validation(format!("Unknown status '{}'", other))),
        }
    }
}

/// A locally stored release, keyed remotely by `external_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub id: String,
    pub external_id: String,
    pub title: String,
    pub artist_name: String,
    pub genre: GenreLabel,
    pub streaming_url: String,
    pub cover_image_url: String,
    pub status: PublishStatus,
    pub featured_media_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields written by an upsert. Status is always set explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseFields {
    pub external_id: String,
    pub title: String,
    pub artist_name: String,
    pub genre: GenreLabel,
    pub streaming_url: String,
    pub cover_image_url: String,
    pub status: PublishStatus,
}

/// Image stored as a release's primary image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub id: String,
    pub release_id: String,
    pub source_url: String,
    pub content_type: String,
    pub byte_len: i64,
    pub created_at: NaiveDateTime,
}

/// Raw image bytes downloaded from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_labels_serialize_with_display_names() {
        let actual = GenreLabel::ALL
            .iter()
            .map(|genre| serde_json::to_string(genre).expect("serialize genre"))
            .collect::<Vec<_>>();
        assert_eq!(actual, vec!["\"R&B\"", "\"Dance\"", "\"Hip Hop\""]);
    }

    #[test]
    fn genre_label_parses_case_insensitively() {
        assert_eq!("hip hop".parse::<GenreLabel>().unwrap(), GenreLabel::HipHop);
        assert_eq!(" R&B ".parse::<GenreLabel>().unwrap(), GenreLabel::RnB);
        assert!("Jazz".parse::<GenreLabel>().is_err());
    }

    #[test]
    fn publish_status_round_trips_through_str() {
        for status in [PublishStatus::Publish, PublishStatus::Draft, PublishStatus::Trash] {
            assert_eq!(status.as_str().parse::<PublishStatus>().unwrap(), status);
        }
    }
}
