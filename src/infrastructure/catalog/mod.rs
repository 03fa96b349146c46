//! Catalog infrastructure - Character metadata clients

mod jikan;

pub use jikan::{DEFAULT_JIKAN_BASE_URL, JikanCatalogClient};
