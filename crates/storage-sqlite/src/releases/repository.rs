use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use releasesync_core::errors::Error;
use releasesync_core::releases::{
    ImageFetcher, MediaAttachment, PublishStatus, ReleaseFields, ReleaseRecord,
    ReleaseRepositoryTrait,
};
use releasesync_core::Result;
use uuid::Uuid;

use super::model::{ReleaseDB, ReleaseMediaDB, ReleaseMediaInfoDB, ReleaseMetaDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{release_media, release_meta, releases};

pub struct ReleaseRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
    image_fetcher: Arc<dyn ImageFetcher>,
}

impl ReleaseRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
        image_fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            pool,
            writer,
            image_fetcher,
        }
    }

    /// Stored image bytes for a media id, as `(content_type, bytes)`.
    pub fn get_media_data(&self, media_id: &str) -> Result<Option<(String, Vec<u8>)>> {
        let mut conn = get_connection(&self.pool)?;
        let row = release_media::table
            .find(media_id)
            .select(ReleaseMediaDB::as_select())
            .first::<ReleaseMediaDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(|media| (media.content_type, media.data)))
    }
}

#[async_trait]
impl ReleaseRepositoryTrait for ReleaseRepository {
    fn find_by_external_id(&self, external_id: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let ids = releases::table
            .filter(releases::external_id.eq(external_id))
            .order((releases::created_at.asc(), releases::id.asc()))
            .select(releases::id)
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(ids)
    }

    fn list_ids_with_external_id(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let ids = releases::table
            .filter(releases::external_id.ne(""))
            .select(releases::id)
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(ids)
    }

    fn get_release(&self, release_id: &str) -> Result<Option<ReleaseRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = releases::table
            .find(release_id)
            .first::<ReleaseDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(ReleaseRecord::try_from).transpose()
    }

    fn get_external_id(&self, release_id: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let external_id = releases::table
            .find(release_id)
            .select(releases::external_id)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(external_id)
    }

    fn load_releases(&self) -> Result<Vec<ReleaseRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = releases::table
            .order((releases::created_at.desc(), releases::title.asc()))
            .load::<ReleaseDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(ReleaseRecord::try_from).collect()
    }

    fn get_meta(&self, release_id: &str, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let value = release_meta::table
            .find((release_id, key))
            .select(release_meta::meta_value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    fn get_featured_media(&self, release_id: &str) -> Result<Option<MediaAttachment>> {
        let mut conn = get_connection(&self.pool)?;
        let featured = releases::table
            .find(release_id)
            .select(releases::featured_media_id)
            .first::<Option<String>>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .flatten();
        let Some(media_id) = featured else {
            return Ok(None);
        };
        let media = release_media::table
            .find(media_id)
            .select(ReleaseMediaInfoDB::as_select())
            .first::<ReleaseMediaInfoDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(media.map(MediaAttachment::from))
    }

    async fn upsert_release(
        &self,
        release_id: Option<String>,
        fields: ReleaseFields,
    ) -> Result<String> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<String> {
                let now = Utc::now().naive_utc();
                match release_id {
                    Some(existing_id) => {
                        let affected = diesel::update(releases::table.find(existing_id.as_str()))
                            .set((
                                releases::title.eq(fields.title),
                                releases::artist_name.eq(fields.artist_name),
                                releases::genre.eq(fields.genre.as_str()),
                                releases::streaming_url.eq(fields.streaming_url),
                                releases::cover_image_url.eq(fields.cover_image_url),
                                releases::status.eq(fields.status.as_str()),
                                releases::updated_at.eq(now),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        if affected == 0 {
                            return Err(Error::not_found(format!(
                                "Release {} not found",
                                existing_id
                            )));
                        }
                        Ok(existing_id)
                    }
                    None => {
                        let row = ReleaseDB::new(Uuid::new_v4().to_string(), fields, now);
                        diesel::insert_into(releases::table)
                            .values(&row)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(row.id)
                    }
                }
            })
            .await
    }

    async fn set_meta(&self, release_id: &str, key: &str, value: &str) -> Result<()> {
        let row = ReleaseMetaDB {
            release_id: release_id.to_string(),
            meta_key: key.to_string(),
            meta_value: value.to_string(),
            updated_at: Utc::now().naive_utc(),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(release_meta::table)
                    .values(&row)
                    .on_conflict((release_meta::release_id, release_meta::meta_key))
                    .do_update()
                    .set((
                        release_meta::meta_value.eq(&row.meta_value),
                        release_meta::updated_at.eq(row.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn attach_image_from_url(&self, release_id: &str, url: &str) -> Result<String> {
        if let Some(current) = self.get_featured_media(release_id)? {
            if current.source_url == url {
                debug!(
                    "[Storage] Release {} already has image from {}",
                    release_id, url
                );
                return Ok(current.id);
            }
        }

        let image = self.image_fetcher.fetch_image(url).await?;
        let row = ReleaseMediaDB {
            id: Uuid::new_v4().to_string(),
            release_id: release_id.to_string(),
            source_url: url.to_string(),
            content_type: image.content_type,
            byte_len: image.bytes.len() as i64,
            data: image.bytes,
            created_at: Utc::now().naive_utc(),
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<String> {
                let exists = releases::table
                    .find(row.release_id.as_str())
                    .select(releases::id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                if exists.is_none() {
                    return Err(Error::not_found(format!(
                        "Release {} not found",
                        row.release_id
                    )));
                }

                diesel::delete(
                    release_media::table.filter(release_media::release_id.eq(&row.release_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                diesel::insert_into(release_media::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::update(releases::table.find(row.release_id.as_str()))
                    .set(releases::featured_media_id.eq(Some(row.id.as_str())))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(row.id)
            })
            .await
    }

    async fn delete_release(&self, release_id: &str, hard: bool) -> Result<usize> {
        let release_id = release_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                if !hard {
                    let affected = diesel::update(releases::table.find(release_id.as_str()))
                        .set((
                            releases::status.eq(PublishStatus::Trash.as_str()),
                            releases::updated_at.eq(Utc::now().naive_utc()),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    return Ok(affected);
                }

                diesel::delete(release_meta::table.filter(release_meta::release_id.eq(&release_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::delete(
                    release_media::table.filter(release_media::release_id.eq(&release_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let affected = diesel::delete(releases::table.find(release_id.as_str()))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
