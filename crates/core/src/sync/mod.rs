//! Release sync domain models and services.

mod catalog_sync_model;
mod catalog_sync_scheduler;
mod catalog_synchronizer;

pub use catalog_sync_model::*;
pub use catalog_sync_scheduler::*;
pub use catalog_synchronizer::*;
