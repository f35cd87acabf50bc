mod model;
mod repository;

pub use model::{ReleaseDB, ReleaseMediaDB, ReleaseMediaInfoDB, ReleaseMetaDB};
pub use repository::ReleaseRepository;
