//! One random beer, reloadable on demand.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::catalog::{Beer, CatalogService};
use crate::channel::Channel;
use crate::error::ErrorKind;
use crate::report::ErrorHandler;
use crate::session::Session;
use crate::task::{TaskSlot, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomIntent {
    Start,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomRequest {
    ShowContent(Beer),
}

/// Every trigger is bracketed by one started/ended pair, including a
/// trigger superseded by the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomEvent {
    LoadingStarted,
    LoadingEnded,
}

pub type RandomSession = Session<RandomIntent, RandomRequest, RandomEvent>;

struct Loaded {
    ticket: Ticket,
    result: Result<Beer, ErrorKind>,
}

pub fn spawn(catalog: Arc<dyn CatalogService>, errors: Arc<dyn ErrorHandler>) -> RandomSession {
    RandomSession::spawn("random", move |mut inbox, requests, events| async move {
        let (internal, mut results) = mpsc::unbounded_channel();
        let mut random = Random {
            catalog,
            errors,
            requests,
            events,
            internal,
            load: TaskSlot::new(),
        };

        loop {
            tokio::select! {
                intent = inbox.next() => match intent {
                    Some(RandomIntent::Start | RandomIntent::Reload) => random.trigger(),
                    None => break,
                },
                Some(loaded) = results.recv() => random.on_loaded(loaded),
            }
        }
        random.cancel();
    })
}

struct Random {
    catalog: Arc<dyn CatalogService>,
    errors: Arc<dyn ErrorHandler>,
    requests: Channel<RandomRequest>,
    events: Channel<RandomEvent>,
    internal: mpsc::UnboundedSender<Loaded>,
    load: TaskSlot,
}

impl Random {
    fn trigger(&mut self) {
        self.cancel();
        self.events.publish(RandomEvent::LoadingStarted);

        let catalog = Arc::clone(&self.catalog);
        let internal = self.internal.clone();
        self.load.start(move |ticket| async move {
            let result = catalog.random_beer().await;
            let _ = internal.send(Loaded { ticket, result });
        });
    }

    fn on_loaded(&mut self, loaded: Loaded) {
        if !self.load.accept(loaded.ticket) {
            tracing::trace!("Dropping superseded random beer");
            return;
        }
        match loaded.result {
            Ok(beer) => self.requests.publish(RandomRequest::ShowContent(beer)),
            Err(kind) => self.errors.handle(kind),
        }
        self.events.publish(RandomEvent::LoadingEnded);
    }

    fn cancel(&mut self) {
        if self.load.cancel() {
            self.events.publish(RandomEvent::LoadingEnded);
        }
    }
}
