//! Live events (shows) managed alongside synced releases.

mod events_model;
mod events_service;
mod events_traits;

pub use events_model::*;
pub use events_service::*;
pub use events_traits::*;
