use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use releasesync_core::errors::Error;
use releasesync_core::events::{EventFields, EventRecord, EventRepositoryTrait};
use releasesync_core::Result;
use uuid::Uuid;

use super::model::EventDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::events;
use crate::schema::events::dsl::*;

pub struct EventRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl EventRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        EventRepository { pool, writer }
    }
}

#[async_trait]
impl EventRepositoryTrait for EventRepository {
    fn load_events(&self) -> Result<Vec<EventRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = events
            .order((event_date.is_null().asc(), event_date.asc(), title.asc()))
            .load::<EventDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(EventRecord::try_from).collect()
    }

    fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = events
            .find(event_id)
            .first::<EventDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(EventRecord::try_from).transpose()
    }

    async fn insert_event(&self, fields: EventFields) -> Result<EventRecord> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<EventRecord> {
                let now = Utc::now().naive_utc();
                let row = EventDB::from_fields(Uuid::new_v4().to_string(), fields, now, now);
                let inserted = diesel::insert_into(events::table)
                    .values(&row)
                    .returning(EventDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                EventRecord::try_from(inserted)
            })
            .await
    }

    async fn update_event(&self, event_id: String, fields: EventFields) -> Result<EventRecord> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<EventRecord> {
                let created = events
                    .find(event_id.as_str())
                    .select(created_at)
                    .first::<chrono::NaiveDateTime>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found(format!("Event {}", event_id)))?;

                let row = EventDB::from_fields(
                    event_id.clone(),
                    fields,
                    created,
                    Utc::now().naive_utc(),
                );
                let updated = diesel::update(events.find(event_id.as_str()))
                    .set(&row)
                    .returning(EventDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                EventRecord::try_from(updated)
            })
            .await
    }

    async fn delete_event(&self, event_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let affected = diesel::delete(events.find(event_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(affected)
            })
            .await
    }
}
