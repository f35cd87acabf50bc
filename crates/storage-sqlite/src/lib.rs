//! SQLite storage for synced releases and managed events.
//!
//! Reads go through the r2d2 pool; every write is funneled through the
//! single writer thread behind [`db::WriteHandle`].

pub mod db;
pub mod errors;
pub mod events;
pub mod releases;
pub mod schema;

pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool, WriteHandle};
pub use errors::StorageError;
pub use events::EventRepository;
pub use releases::ReleaseRepository;
