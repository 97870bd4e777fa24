//! Materialised list of favorite beers, kept in step with the store.
//!
//! The session fetches every favorite once on start, then only the delta
//! each store change introduces. Removals are pruned locally without a
//! network call.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::{Beer, BeerId, CatalogService};
use crate::channel::Channel;
use crate::error::ErrorKind;
use crate::favorites::{FavoriteStore, FavoritesEvent};
use crate::report::ErrorHandler;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesIntent {
    Start,
    SelectedBeer(BeerId),
    /// The user removed a row. Pruned locally, then removed from the store.
    RemovedBeer(BeerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesRequest {
    /// The whole materialised list. `supplementary` is set when the change
    /// only appended newly favorited beers.
    PopulateList { beers: Vec<Beer>, supplementary: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesSessionEvent {
    LoadingStarted,
    LoadingEnded,
    SelectedBeer(Beer),
}

pub type FavoritesSession = Session<FavoritesIntent, FavoritesRequest, FavoritesSessionEvent>;

struct BatchLoaded {
    batch: u64,
    ids: Vec<BeerId>,
    supplementary: bool,
    beers: Vec<Beer>,
    error: Option<ErrorKind>,
}

pub fn spawn(
    catalog: Arc<dyn CatalogService>,
    errors: Arc<dyn ErrorHandler>,
    store: FavoriteStore,
) -> FavoritesSession {
    FavoritesSession::spawn("favorites", move |mut inbox, requests, events| {
        let mut store_events = store.subscribe();
        async move {
            let (internal, mut results) = mpsc::unbounded_channel();
            let mut aggregator = Aggregator {
                catalog,
                errors,
                store,
                requests,
                events,
                internal,
                started: false,
                items: Vec::new(),
                favorite_ids: BTreeSet::new(),
                pending: BTreeSet::new(),
                batches: HashMap::new(),
                next_batch: 0,
            };

            loop {
                tokio::select! {
                    intent = inbox.next() => match intent {
                        Some(intent) => aggregator.on_intent(intent),
                        None => break,
                    },
                    Some(event) = store_events.recv() => aggregator.on_store_event(event),
                    Some(loaded) = results.recv() => aggregator.on_batch_loaded(loaded),
                }
            }
            store_events.cancel();
            aggregator.cancel_batches();
        }
    })
}

struct Aggregator {
    catalog: Arc<dyn CatalogService>,
    errors: Arc<dyn ErrorHandler>,
    store: FavoriteStore,
    requests: Channel<FavoritesRequest>,
    events: Channel<FavoritesSessionEvent>,
    internal: mpsc::UnboundedSender<BatchLoaded>,

    started: bool,
    items: Vec<Beer>,
    /// Latest id set seen from the store.
    favorite_ids: BTreeSet<BeerId>,
    /// Ids with a fetch in flight. Count as known when computing deltas.
    pending: BTreeSet<BeerId>,
    batches: HashMap<u64, JoinHandle<()>>,
    next_batch: u64,
}

impl Aggregator {
    fn on_intent(&mut self, intent: FavoritesIntent) {
        match intent {
            FavoritesIntent::Start => self.start(),
            FavoritesIntent::SelectedBeer(id) => {
                if let Some(beer) = self.items.iter().find(|b| b.id == id) {
                    self.events
                        .publish(FavoritesSessionEvent::SelectedBeer(beer.clone()));
                }
            }
            FavoritesIntent::RemovedBeer(id) => {
                self.items.retain(|b| b.id != id);
                self.favorite_ids.remove(&id);
                self.pending.remove(&id);
                if let Err(e) = self.store.remove(id) {
                    tracing::error!(beer_id = id, error = %e, "Failed to remove favorite");
                    self.errors.handle(ErrorKind::Unknown);
                }
            }
        }
    }

    fn start(&mut self) {
        self.cancel_batches();
        self.items.clear();
        self.pending.clear();
        self.started = true;

        let ids = match self.store.list() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read favorites");
                self.errors.handle(ErrorKind::Unknown);
                Vec::new()
            }
        };
        self.favorite_ids = ids.iter().copied().collect();

        if ids.is_empty() {
            self.requests.publish(FavoritesRequest::PopulateList {
                beers: Vec::new(),
                supplementary: false,
            });
            return;
        }
        self.fetch(ids, false);
    }

    fn on_store_event(&mut self, event: FavoritesEvent) {
        if !self.started {
            return;
        }
        let FavoritesEvent::Changed { ids } = event;
        let latest: BTreeSet<BeerId> = ids.into_iter().collect();
        let materialized: BTreeSet<BeerId> = self.items.iter().map(|b| b.id).collect();

        let removed: BTreeSet<BeerId> = materialized.difference(&latest).copied().collect();
        if !removed.is_empty() {
            self.items.retain(|b| !removed.contains(&b.id));
            tracing::debug!(removed = ?removed, "Pruned unfavorited beers");
            self.requests.publish(FavoritesRequest::PopulateList {
                beers: self.items.clone(),
                supplementary: false,
            });
        }

        self.pending.retain(|id| latest.contains(id));
        let added: Vec<BeerId> = latest
            .iter()
            .filter(|id| !materialized.contains(*id) && !self.pending.contains(*id))
            .copied()
            .collect();
        self.favorite_ids = latest;

        if !added.is_empty() {
            self.fetch(added, true);
        }
    }

    fn fetch(&mut self, ids: Vec<BeerId>, supplementary: bool) {
        self.pending.extend(ids.iter().copied());
        self.events.publish(FavoritesSessionEvent::LoadingStarted);

        let batch = self.next_batch;
        self.next_batch += 1;
        tracing::debug!(batch, ids = ?ids, supplementary, "Fetching favorites");

        let catalog = Arc::clone(&self.catalog);
        let internal = self.internal.clone();
        let handle = tokio::spawn(async move {
            let (beers, error) = fetch_all_pages(catalog.as_ref(), &ids).await;
            let _ = internal.send(BatchLoaded {
                batch,
                ids,
                supplementary,
                beers,
                error,
            });
        });
        self.batches.insert(batch, handle);
    }

    fn on_batch_loaded(&mut self, loaded: BatchLoaded) {
        if self.batches.remove(&loaded.batch).is_none() {
            tracing::trace!(batch = loaded.batch, "Dropping stale favorites batch");
            return;
        }
        for id in &loaded.ids {
            self.pending.remove(id);
        }
        if let Some(kind) = loaded.error {
            self.errors.handle(kind);
        }

        for beer in loaded.beers {
            // Unfavorited while the fetch was in flight, or already listed.
            if !self.favorite_ids.contains(&beer.id) || self.items.iter().any(|b| b.id == beer.id)
            {
                continue;
            }
            self.items.push(beer);
        }

        self.requests.publish(FavoritesRequest::PopulateList {
            beers: self.items.clone(),
            supplementary: loaded.supplementary,
        });
        self.events.publish(FavoritesSessionEvent::LoadingEnded);
    }

    fn cancel_batches(&mut self) {
        for (_, handle) in self.batches.drain() {
            handle.abort();
            self.events.publish(FavoritesSessionEvent::LoadingEnded);
        }
    }
}

/// Page through `ids` until a short page. A failed page ends the walk with
/// whatever was already fetched.
async fn fetch_all_pages(
    catalog: &dyn CatalogService,
    ids: &[BeerId],
) -> (Vec<Beer>, Option<ErrorKind>) {
    let page_size = catalog.page_size();
    let mut beers = Vec::new();
    let mut page = 0;
    loop {
        match catalog.beers_by_ids(ids, page).await {
            Ok(batch) => {
                let is_last_page = batch.is_empty() || batch.len() < page_size;
                beers.extend(batch);
                if is_last_page {
                    return (beers, None);
                }
                page += 1;
            }
            Err(kind) => {
                tracing::debug!(page, fetched = beers.len(), error = kind.error_type(), "Favorites page failed");
                return (beers, Some(kind));
            }
        }
    }
}
