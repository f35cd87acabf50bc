//! HTTP clients for the remote music catalog and the upcoming events feed.
//!
//! [`CatalogClient`] implements the core `CatalogSource` port and
//! [`HttpImageFetcher`] implements `ImageFetcher`, so the synchronizer never
//! sees reqwest directly.

pub mod client;
pub mod error;
pub mod images;
pub mod ticketmaster;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{CatalogClient, CatalogClientConfig};
pub use error::{CatalogClientError, Result};
pub use images::HttpImageFetcher;
pub use ticketmaster::{TicketmasterClient, TicketmasterConfig};
pub use types::UpcomingEvent;
