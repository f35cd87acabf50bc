//! Release records synchronized from the remote music catalog.

mod releases_model;
mod releases_traits;

pub use releases_model::*;
pub use releases_traits::*;
