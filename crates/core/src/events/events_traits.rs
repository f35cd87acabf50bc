use async_trait::async_trait;

use super::events_model::{EventFields, EventRecord, EventUpdate, NewEvent};
use crate::errors::Result;

/// Persistence contract for events.
#[async_trait]
pub trait EventRepositoryTrait: Send + Sync {
    fn load_events(&self) -> Result<Vec<EventRecord>>;

    fn get_event(&self, event_id: &str) -> Result<Option<EventRecord>>;

    async fn insert_event(&self, fields: EventFields) -> Result<EventRecord>;

    async fn update_event(&self, event_id: String, fields: EventFields) -> Result<EventRecord>;

    async fn delete_event(&self, event_id: String) -> Result<usize>;
}

#[async_trait]
pub trait EventServiceTrait: Send + Sync {
    fn list_events(&self) -> Result<Vec<EventRecord>>;

    fn get_event(&self, event_id: &str) -> Result<EventRecord>;

    async fn create_event(&self, new_event: NewEvent) -> Result<EventRecord>;

    async fn update_event(&self, update: EventUpdate) -> Result<EventRecord>;

    async fn delete_event(&self, event_id: &str) -> Result<usize>;
}
