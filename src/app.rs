//! Explicit wiring of the data layer.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{CatalogService, RemoteCatalog};
use crate::config::{Config, ConfigError};
use crate::favorites::{FavoriteStore, FileKeyValueStore, LogActivityTracker};
use crate::net::{HttpTransport, Retrier, TransportSetupError};
use crate::report::{ErrorHandler, ErrorReporter};
use crate::session::{
    browser, detail, favorites, random, BrowsingSession, DetailParams, DetailSession,
    FavoritesSession, RandomSession,
};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportSetupError),
}

/// Shared collaborators. Sessions are spawned from here on demand.
#[derive(Clone)]
pub struct Services {
    config: Config,
    catalog: Arc<dyn CatalogService>,
    favorites: FavoriteStore,
    errors: ErrorReporter,
}

impl Services {
    pub fn from_config(config: Config) -> Result<Self, SetupError> {
        config.validate()?;

        let retrier = Retrier::from(&config.retry);
        let transport = HttpTransport::new(&config.backend, retrier)?;
        let catalog = RemoteCatalog::new(Arc::new(transport), config.browsing.page_size);

        let backing = FileKeyValueStore::new(config.favorites.resolved_path());
        tracing::debug!(path = %backing.path().display(), "Using favorites file");
        let favorites = FavoriteStore::new(Arc::new(backing), Arc::new(LogActivityTracker));

        Ok(Self::new(
            config,
            Arc::new(catalog),
            favorites,
            ErrorReporter::new(),
        ))
    }

    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogService>,
        favorites: FavoriteStore,
        errors: ErrorReporter,
    ) -> Self {
        Self {
            config,
            catalog,
            favorites,
            errors,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogService> {
        &self.catalog
    }

    pub fn favorites(&self) -> &FavoriteStore {
        &self.favorites
    }

    pub fn errors(&self) -> &ErrorReporter {
        &self.errors
    }

    fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::new(self.errors.clone())
    }

    pub fn browsing_session(&self) -> BrowsingSession {
        browser::spawn(
            Arc::clone(&self.catalog),
            self.error_handler(),
            self.config.browsing.search_debounce(),
        )
    }

    pub fn favorites_session(&self) -> FavoritesSession {
        favorites::spawn(
            Arc::clone(&self.catalog),
            self.error_handler(),
            self.favorites.clone(),
        )
    }

    pub fn detail_session(&self, params: DetailParams) -> DetailSession {
        detail::spawn(params, self.favorites.clone(), self.error_handler())
    }

    pub fn random_session(&self) -> RandomSession {
        random::spawn(Arc::clone(&self.catalog), self.error_handler())
    }
}
