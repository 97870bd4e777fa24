//! Configuration loading and defaults.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{
    BackendConfig, BrowsingConfig, Config, FavoritesConfig, LoggingConfig, RetryConfig,
};
