//! Database models for releases, their meta rows and attached media.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use releasesync_core::errors::Error;
use releasesync_core::releases::{MediaAttachment, ReleaseFields, ReleaseRecord};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::releases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReleaseDB {
    pub id: String,
    pub external_id: String,
    pub title: String,
    pub artist_name: String,
    pub genre: String,
    pub streaming_url: String,
    pub cover_image_url: String,
    pub status: String,
    pub featured_media_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReleaseDB {
    pub fn new(id: String, fields: ReleaseFields, now: NaiveDateTime) -> Self {
        Self {
            id,
            external_id: fields.external_id,
            title: fields.title,
            artist_name: fields.artist_name,
            genre: fields.genre.as_str().to_string(),
            streaming_url: fields.streaming_url,
            cover_image_url: fields.cover_image_url,
            status: fields.status.as_str().to_string(),
            featured_media_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<ReleaseDB> for ReleaseRecord {
    type Error = Error;

    fn try_from(db: ReleaseDB) -> Result<Self, Self::Error> {
        Ok(ReleaseRecord {
            genre: db.genre.parse()?,
            status: db.status.parse()?,
            id: db.id,
            external_id: db.external_id,
            title: db.title,
            artist_name: db.artist_name,
            streaming_url: db.streaming_url,
            cover_image_url: db.cover_image_url,
            featured_media_id: db.featured_media_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::release_meta)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReleaseMetaDB {
    pub release_id: String,
    pub meta_key: String,
    pub meta_value: String,
    pub updated_at: NaiveDateTime,
}

/// Full media row including the image bytes.
#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::release_media)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReleaseMediaDB {
    pub id: String,
    pub release_id: String,
    pub source_url: String,
    pub content_type: String,
    pub byte_len: i64,
    pub data: Vec<u8>,
    pub created_at: NaiveDateTime,
}

/// Media row without the blob.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::release_media)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReleaseMediaInfoDB {
    pub id: String,
    pub release_id: String,
    pub source_url: String,
    pub content_type: String,
    pub byte_len: i64,
    pub created_at: NaiveDateTime,
}

impl From<ReleaseMediaInfoDB> for MediaAttachment {
    fn from(db: ReleaseMediaInfoDB) -> Self {
        MediaAttachment {
            id: db.id,
            release_id: db.release_id,
            source_url: db.source_url,
            content_type: db.content_type,
            byte_len: db.byte_len,
            created_at: db.created_at,
        }
    }
}
