//! A single beer with its favorite toggle.

use std::convert::Infallible;
use std::sync::Arc;

use crate::catalog::Beer;
use crate::channel::{Channel, Subscription};
use crate::error::ErrorKind;
use crate::favorites::{FavoriteStore, FavoritesEvent};
use crate::report::ErrorHandler;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailParams {
    pub beer: Beer,
    /// Embedded in another screen. Embedded details show content only: no
    /// favorite status and no toggle.
    pub is_subview: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailIntent {
    Start,
    ToggleFavorite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRequest {
    ShowContent {
        image_url: Option<String>,
        name: String,
        description: String,
        is_subview: bool,
    },
    /// Published only when the status differs from the last one published.
    FavoriteStatus(bool),
}

pub type DetailSession = Session<DetailIntent, DetailRequest, Infallible>;

pub fn spawn(
    params: DetailParams,
    store: FavoriteStore,
    errors: Arc<dyn ErrorHandler>,
) -> DetailSession {
    DetailSession::spawn("detail", move |mut inbox, requests, _events| {
        let mut store_events = (!params.is_subview).then(|| store.subscribe());
        async move {
            let mut detail = Detail {
                params,
                store,
                errors,
                requests,
                started: false,
                is_favorite: None,
            };

            loop {
                tokio::select! {
                    intent = inbox.next() => match intent {
                        Some(intent) => detail.on_intent(intent),
                        None => break,
                    },
                    Some(event) = next_change(&mut store_events) => detail.on_store_event(event),
                }
            }
            if let Some(subscription) = store_events.take() {
                subscription.cancel();
            }
        }
    })
}

async fn next_change(
    subscription: &mut Option<Subscription<FavoritesEvent>>,
) -> Option<FavoritesEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

struct Detail {
    params: DetailParams,
    store: FavoriteStore,
    errors: Arc<dyn ErrorHandler>,
    requests: Channel<DetailRequest>,

    started: bool,
    /// Last published status.
    is_favorite: Option<bool>,
}

impl Detail {
    fn on_intent(&mut self, intent: DetailIntent) {
        match intent {
            DetailIntent::Start => {
                self.started = true;
                let beer = &self.params.beer;
                self.requests.publish(DetailRequest::ShowContent {
                    image_url: beer.image_url.clone(),
                    name: beer.name.clone(),
                    description: beer.description.clone(),
                    is_subview: self.params.is_subview,
                });
                if self.params.is_subview {
                    return;
                }

                let is_favorite = match self.store.contains(beer.id) {
                    Ok(is_favorite) => is_favorite,
                    Err(e) => {
                        tracing::error!(beer_id = beer.id, error = %e, "Failed to read favorites");
                        self.errors.handle(ErrorKind::Unknown);
                        false
                    }
                };
                self.set_favorite(is_favorite);
            }
            DetailIntent::ToggleFavorite => self.toggle(),
        }
    }

    fn on_store_event(&mut self, event: FavoritesEvent) {
        if !self.started {
            return;
        }
        let FavoritesEvent::Changed { ids } = event;
        self.set_favorite(ids.contains(&self.params.beer.id));
    }

    fn toggle(&mut self) {
        // Nothing shown yet, or embedded.
        let Some(was_favorite) = self.is_favorite else {
            tracing::trace!(is_subview = self.params.is_subview, "Ignoring favorite toggle");
            return;
        };
        let id = self.params.beer.id;
        let is_favorite = !was_favorite;
        self.set_favorite(is_favorite);

        // No rollback: the displayed state stays as toggled.
        let committed = if is_favorite {
            self.store.add(id)
        } else {
            self.store.remove(id)
        };
        if let Err(e) = committed {
            tracing::error!(beer_id = id, is_favorite, error = %e, "Failed to update favorites");
            self.errors.handle(ErrorKind::Unknown);
        }
    }

    fn set_favorite(&mut self, is_favorite: bool) {
        if self.is_favorite == Some(is_favorite) {
            return;
        }
        self.is_favorite = Some(is_favorite);
        self.requests
            .publish(DetailRequest::FavoriteStatus(is_favorite));
    }
}
