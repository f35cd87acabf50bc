mod model;
mod repository;

pub use model::EventDB;
pub use repository::EventRepository;
