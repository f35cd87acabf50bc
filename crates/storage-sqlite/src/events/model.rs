use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use releasesync_core::errors::Error;
use releasesync_core::events::{EventFields, EventRecord};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
// Cleared optional fields must be written as NULL, not skipped.
#[diesel(treat_none_as_null = true)]
pub struct EventDB {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub venue: Option<String>,
    pub ticket_url: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl EventDB {
    pub fn from_fields(
        id: String,
        fields: EventFields,
        created_at: NaiveDateTime,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            event_date: fields.event_date,
            city: fields.city,
            venue: fields.venue,
            ticket_url: fields.ticket_url,
            status: fields.status.as_str().to_string(),
            created_at,
            updated_at,
        }
    }
}

impl TryFrom<EventDB> for EventRecord {
    type Error = Error;

    fn try_from(db: EventDB) -> Result<Self, Self::Error> {
        Ok(EventRecord {
            status: db.status.parse()?,
            id: db.id,
            title: db.title,
            description: db.description,
            event_date: db.event_date,
            city: db.city,
            venue: db.venue,
            ticket_url: db.ticket_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
