//! Catalog queries over a [`Transport`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::beer::{Beer, BeerId};
use crate::error::ErrorKind;
use crate::net::{Endpoint, Transport};

/// The four catalog queries sessions rely on.
///
/// Pages are 0-based. Each call resolves exactly once.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn all_beers(&self, page: u32) -> Result<Vec<Beer>, ErrorKind>;

    async fn beers_by_name(&self, query: &str, page: u32) -> Result<Vec<Beer>, ErrorKind>;

    async fn beers_by_ids(&self, ids: &[BeerId], page: u32) -> Result<Vec<Beer>, ErrorKind>;

    /// An empty answer is a [`ErrorKind::Deserialization`] failure.
    async fn random_beer(&self) -> Result<Beer, ErrorKind>;

    /// Items requested per page. A shorter page is the last one.
    fn page_size(&self) -> usize;
}

/// [`CatalogService`] backed by the remote API.
pub struct RemoteCatalog {
    transport: Arc<dyn Transport>,
    page_size: usize,
}

impl RemoteCatalog {
    pub fn new(transport: Arc<dyn Transport>, page_size: usize) -> Self {
        Self {
            transport,
            page_size,
        }
    }

    async fn list(
        &self,
        page: u32,
        name: Option<String>,
        ids: Option<Vec<BeerId>>,
    ) -> Result<Vec<Beer>, ErrorKind> {
        let endpoint = Endpoint::Beers {
            page: Some(page),
            per_page: Some(self.page_size),
            name,
            ids,
        };
        let payload = self.transport.fetch(&endpoint).await?;
        let beers = decode_beers(payload).await?;
        tracing::debug!(page, count = beers.len(), "Received beers");
        Ok(beers)
    }
}

#[async_trait]
impl CatalogService for RemoteCatalog {
    async fn all_beers(&self, page: u32) -> Result<Vec<Beer>, ErrorKind> {
        self.list(page, None, None).await
    }

    async fn beers_by_name(&self, query: &str, page: u32) -> Result<Vec<Beer>, ErrorKind> {
        self.list(page, Some(query.to_string()), None).await
    }

    async fn beers_by_ids(&self, ids: &[BeerId], page: u32) -> Result<Vec<Beer>, ErrorKind> {
        self.list(page, None, Some(ids.to_vec())).await
    }

    async fn random_beer(&self) -> Result<Beer, ErrorKind> {
        let payload = self.transport.fetch(&Endpoint::RandomBeer).await?;
        let beers = decode_beers(payload).await?;
        match beers.into_iter().next() {
            Some(beer) => {
                tracing::debug!(id = beer.id, "Received a random beer");
                Ok(beer)
            }
            None => {
                tracing::error!("Unexpectedly received an empty array for a random beer");
                Err(ErrorKind::Deserialization)
            }
        }
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Decode a JSON array of beers on the blocking pool, away from both the
/// caller and the transport.
async fn decode_beers(payload: Vec<u8>) -> Result<Vec<Beer>, ErrorKind> {
    let decoded = tokio::task::spawn_blocking(move || serde_json::from_slice::<Vec<Beer>>(&payload))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Decode task failed");
            ErrorKind::Unknown
        })?;

    decoded.map_err(|e| {
        tracing::error!(error = %e, "Could not deserialize beers data");
        ErrorKind::Deserialization
    })
}
