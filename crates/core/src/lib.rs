//! Domain models, ports and services for the release catalog sync.

pub mod errors;
pub mod events;
pub mod releases;
pub mod sync;
pub mod utils;

pub use errors::{Error, Result};
