//! Listing and name-search pagination.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::catalog::{Beer, BeerId, CatalogService};
use crate::channel::Channel;
use crate::error::ErrorKind;
use crate::report::ErrorHandler;
use crate::session::Session;
use crate::task::{TaskSlot, Ticket};

/// What the session is paging through. Pages are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowsingMode {
    Listing { page: u32 },
    Searching { query: String, page: u32 },
}

impl BrowsingMode {
    pub fn page(&self) -> u32 {
        match self {
            BrowsingMode::Listing { page } | BrowsingMode::Searching { page, .. } => *page,
        }
    }

    fn with_page(&self, page: u32) -> Self {
        match self {
            BrowsingMode::Listing { .. } => BrowsingMode::Listing { page },
            BrowsingMode::Searching { query, .. } => BrowsingMode::Searching {
                query: query.clone(),
                page,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserIntent {
    /// The screen is ready; load the first listing page.
    Start,
    /// Raw search field contents, on every keystroke.
    SearchTextChanged(String),
    ScrolledToEnd,
    SelectedBeer(BeerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserRequest {
    /// The whole accumulated list for the current mode.
    PopulateList { beers: Vec<Beer>, is_last_page: bool },
    ClearList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    InitialLoadingStarted,
    InitialLoadingEnded,
    NextPageLoadingStarted,
    NextPageLoadingEnded,
    ModeChanged(BrowsingMode),
    SelectedBeer(Beer),
}

pub type BrowsingSession = Session<BrowserIntent, BrowserRequest, BrowserEvent>;

enum Internal {
    PageLoaded {
        ticket: Ticket,
        result: Result<Vec<Beer>, ErrorKind>,
    },
    SearchDebounced {
        ticket: Ticket,
        query: String,
    },
}

pub fn spawn(
    catalog: Arc<dyn CatalogService>,
    errors: Arc<dyn ErrorHandler>,
    search_debounce: Duration,
) -> BrowsingSession {
    BrowsingSession::spawn("browser", move |mut inbox, requests, events| async move {
        let (internal, mut results) = mpsc::unbounded_channel();
        let mut browser = Browser {
            catalog,
            errors,
            search_debounce,
            requests,
            events,
            internal,
            started: false,
            mode: BrowsingMode::Listing { page: 0 },
            items: Vec::new(),
            is_last_page: false,
            first_page_loaded: false,
            load: TaskSlot::new(),
            search_timer: TaskSlot::new(),
        };

        loop {
            tokio::select! {
                intent = inbox.next() => match intent {
                    Some(intent) => browser.on_intent(intent),
                    None => break,
                },
                Some(result) = results.recv() => browser.on_internal(result),
            }
        }
        browser.teardown();
    })
}

struct Browser {
    catalog: Arc<dyn CatalogService>,
    errors: Arc<dyn ErrorHandler>,
    search_debounce: Duration,
    requests: Channel<BrowserRequest>,
    events: Channel<BrowserEvent>,
    internal: mpsc::UnboundedSender<Internal>,

    started: bool,
    mode: BrowsingMode,
    items: Vec<Beer>,
    is_last_page: bool,
    first_page_loaded: bool,
    load: TaskSlot,
    search_timer: TaskSlot,
}

impl Browser {
    fn on_intent(&mut self, intent: BrowserIntent) {
        match intent {
            BrowserIntent::Start => {
                self.started = true;
                self.search_timer.cancel();
                self.enter(BrowsingMode::Listing { page: 0 });
            }
            BrowserIntent::SearchTextChanged(text) => self.on_search_text(text),
            BrowserIntent::ScrolledToEnd => self.next_page(),
            BrowserIntent::SelectedBeer(id) => {
                if let Some(beer) = self.items.iter().find(|b| b.id == id) {
                    self.events.publish(BrowserEvent::SelectedBeer(beer.clone()));
                }
            }
        }
    }

    fn on_internal(&mut self, message: Internal) {
        match message {
            Internal::PageLoaded { ticket, result } => self.on_page_loaded(ticket, result),
            Internal::SearchDebounced { ticket, query } => {
                if !self.search_timer.accept(ticket) {
                    tracing::trace!("Dropping stale search debounce");
                    return;
                }
                self.enter(BrowsingMode::Searching { query, page: 0 });
            }
        }
    }

    fn on_search_text(&mut self, text: String) {
        if !self.started {
            return;
        }
        if text.is_empty() {
            self.search_timer.cancel();
            self.enter(BrowsingMode::Listing { page: 0 });
            return;
        }
        self.search_timer
            .schedule(self.search_debounce, &self.internal, move |ticket| {
                Internal::SearchDebounced {
                    ticket,
                    query: text,
                }
            });
    }

    /// Switch mode: drop the in-flight load, clear the list, start at page 0.
    fn enter(&mut self, mode: BrowsingMode) {
        self.cancel_load();
        self.items.clear();
        self.is_last_page = false;
        self.first_page_loaded = false;
        self.requests.publish(BrowserRequest::ClearList);

        tracing::debug!(mode = ?mode, "Browsing mode changed");
        self.mode = mode;
        self.events
            .publish(BrowserEvent::ModeChanged(self.mode.clone()));
        self.load();
    }

    fn next_page(&mut self) {
        if !self.started || self.load.is_pending() || self.is_last_page {
            tracing::trace!(
                loading = self.load.is_pending(),
                is_last_page = self.is_last_page,
                "Ignoring scroll to end"
            );
            return;
        }
        // A failed first page is fetched again rather than skipped.
        if self.first_page_loaded {
            self.mode = self.mode.with_page(self.mode.page() + 1);
        }
        self.load();
    }

    fn load(&mut self) {
        let page = self.mode.page();
        self.events.publish(if page == 0 {
            BrowserEvent::InitialLoadingStarted
        } else {
            BrowserEvent::NextPageLoadingStarted
        });

        let catalog = Arc::clone(&self.catalog);
        let internal = self.internal.clone();
        let mode = self.mode.clone();
        self.load.start(move |ticket| async move {
            let result = match &mode {
                BrowsingMode::Listing { page } => catalog.all_beers(*page).await,
                BrowsingMode::Searching { query, page } => {
                    catalog.beers_by_name(query, *page).await
                }
            };
            let _ = internal.send(Internal::PageLoaded { ticket, result });
        });
    }

    fn on_page_loaded(&mut self, ticket: Ticket, result: Result<Vec<Beer>, ErrorKind>) {
        if !self.load.accept(ticket) {
            tracing::trace!("Dropping stale page result");
            return;
        }

        let page = self.mode.page();
        match result {
            Ok(beers) => {
                self.is_last_page = beers.len() < self.catalog.page_size();
                self.first_page_loaded = true;
                self.items.extend(beers);
                tracing::debug!(
                    page,
                    total = self.items.len(),
                    is_last_page = self.is_last_page,
                    "Page loaded"
                );
                self.requests.publish(BrowserRequest::PopulateList {
                    beers: self.items.clone(),
                    is_last_page: self.is_last_page,
                });
            }
            Err(kind) => {
                self.errors.handle(kind);
                // Stay on the last good page so the next scroll retries this one.
                if page > 0 {
                    self.mode = self.mode.with_page(page - 1);
                }
            }
        }
        self.publish_loading_ended(page);
    }

    fn cancel_load(&mut self) {
        if self.load.cancel() {
            self.publish_loading_ended(self.mode.page());
        }
    }

    fn publish_loading_ended(&self, page: u32) {
        self.events.publish(if page == 0 {
            BrowserEvent::InitialLoadingEnded
        } else {
            BrowserEvent::NextPageLoadingEnded
        });
    }

    fn teardown(&mut self) {
        self.search_timer.cancel();
        self.cancel_load();
    }
}
