use async_trait::async_trait;

use super::releases_model::{FetchedImage, MediaAttachment, ReleaseFields, ReleaseRecord};
use crate::errors::Result;

/// Content store contract the catalog synchronizer writes through.
#[async_trait]
pub trait ReleaseRepositoryTrait: Send + Sync {
    /// Ids of all records carrying `external_id`. More than one id means the
    /// store has drifted into a duplicate state.
    fn find_by_external_id(&self, external_id: &str) -> Result<Vec<String>>;

    /// Ids of all records with a non-empty external id.
    fn list_ids_with_external_id(&self) -> Result<Vec<String>>;

    fn get_release(&self, release_id: &str) -> Result<Option<ReleaseRecord>>;

    fn get_external_id(&self, release_id: &str) -> Result<Option<String>>;

    fn load_releases(&self) -> Result<Vec<ReleaseRecord>>;

    fn get_meta(&self, release_id: &str, key: &str) -> Result<Option<String>>;

    fn get_featured_media(&self, release_id: &str) -> Result<Option<MediaAttachment>>;

    /// Inserts when `release_id` is `None`, updates in place otherwise.
    async fn upsert_release(&self, release_id: Option<String>, fields: ReleaseFields)
        -> Result<String>;

    async fn set_meta(&self, release_id: &str, key: &str, value: &str) -> Result<()>;

    /// Downloads `url` and stores it as the primary image. Returns the media id.
    async fn attach_image_from_url(&self, release_id: &str, url: &str) -> Result<String>;

    /// `hard` removes the row with its meta and media; otherwise the record is trashed.
    async fn delete_release(&self, release_id: &str, hard: bool) -> Result<usize>;
}

/// Downloads images for attachment.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage>;
}
