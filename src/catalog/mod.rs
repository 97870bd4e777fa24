//! Catalog entities and the remote data service.

mod beer;
mod service;

pub use beer::{Beer, BeerId};
pub use service::{CatalogService, RemoteCatalog};
