//! Favorite set store, its persistence and activity tracking.

mod persistence;
mod store;
mod tracker;

pub use persistence::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError};
pub use store::{FavoriteStore, FavoritesEvent, FAVORITES_KEY};
pub use tracker::{Activity, ActivityTracker, LogActivityTracker};
