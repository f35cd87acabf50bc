use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::events_model::{EventRecord, EventUpdate, NewEvent};
use super::events_traits::{EventRepositoryTrait, EventServiceTrait};
use crate::errors::{Error, Result};

pub struct EventService {
    repository: Arc<dyn EventRepositoryTrait>,
}

impl EventService {
    pub fn new(repository: Arc<dyn EventRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl EventServiceTrait for EventService {
    fn list_events(&self) -> Result<Vec<EventRecord>> {
        self.repository.load_events()
    }

    fn get_event(&self, event_id: &str) -> Result<EventRecord> {
        self.repository
            .get_event(event_id)?
            .ok_or_else(|| Error::not_found(format!("Event {}", event_id)))
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<EventRecord> {
        let fields = new_event.validate()?;
        let event = self.repository.insert_event(fields).await?;
        debug!("[Events] Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    async fn update_event(&self, update: EventUpdate) -> Result<EventRecord> {
        let fields = update.validate()?;
        if self.repository.get_event(&update.id)?.is_none() {
            return Err(Error::not_found(format!("Event {}", update.id)));
        }
        self.repository.update_event(update.id, fields).await
    }

    async fn delete_event(&self, event_id: &str) -> Result<usize> {
        let deleted = self.repository.delete_event(event_id.to_string()).await?;
        if deleted == 0 {
            return Err(Error::not_found(format!("Event {}", event_id)));
        }
        Ok(deleted)
    }
}
