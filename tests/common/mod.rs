//! Shared test utilities and fakes.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use async_trait::async_trait;
use parking_lot::Mutex;
use punkr::catalog::{Beer, BeerId, CatalogService};
use punkr::channel::Subscription;
use punkr::error::ErrorKind;
use punkr::favorites::{FavoriteStore, LogActivityTracker, MemoryKeyValueStore};
use punkr::report::ErrorHandler;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

/// Find an available port for testing.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}

// -- Entities -----------------------------------------------------------------

pub fn beer(id: BeerId) -> Beer {
    Beer {
        id,
        name: format!("Beer {}", id),
        description: format!("Description of beer {}", id),
        image_url: Some(format!("https://images.punkapi.com/v2/{}.png", id)),
    }
}

pub fn beers(ids: impl IntoIterator<Item = BeerId>) -> Vec<Beer> {
    ids.into_iter().map(beer).collect()
}

pub fn beers_json(ids: impl IntoIterator<Item = BeerId>) -> String {
    serde_json::to_string(&beers(ids)).unwrap()
}

pub fn ids_of(beers: &[Beer]) -> Vec<BeerId> {
    beers.iter().map(|b| b.id).collect()
}

// -- Fake catalog -------------------------------------------------------------

/// One call made against [`FakeCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    All { page: u32 },
    ByName { query: String, page: u32 },
    ByIds { ids: Vec<BeerId>, page: u32 },
    Random,
}

/// How [`FakeCatalog`] answers one call.
#[derive(Debug, Clone)]
pub struct Reply {
    pub result: Result<Vec<Beer>, ErrorKind>,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(beers: Vec<Beer>) -> Self {
        Self {
            result: Ok(beers),
            delay: Duration::ZERO,
        }
    }

    pub fn err(kind: ErrorKind) -> Self {
        Self {
            result: Err(kind),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = Box<dyn Fn(&Call) -> Reply + Send + Sync>;

/// In-memory [`CatalogService`] that records calls and answers through a
/// responder closure.
pub struct FakeCatalog {
    page_size: usize,
    calls: Mutex<Vec<Call>>,
    responder: Responder,
}

impl FakeCatalog {
    pub fn new(
        page_size: usize,
        responder: impl Fn(&Call) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            page_size,
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answers calls with `replies` in order, then with empty pages.
    pub fn scripted(page_size: usize, replies: Vec<Reply>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::new(page_size, move |_| {
            queue.lock().pop_front().unwrap_or_else(|| Reply::ok(Vec::new()))
        })
    }

    /// Serves `ids` lookups by slicing the requested ids into pages.
    pub fn by_ids(page_size: usize) -> Arc<Self> {
        Self::new(page_size, move |call| match call {
            Call::ByIds { ids, page } => Reply::ok(
                ids.iter()
                    .skip(*page as usize * page_size)
                    .take(page_size)
                    .copied()
                    .map(beer)
                    .collect(),
            ),
            _ => Reply::ok(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    async fn answer(&self, call: Call) -> Result<Vec<Beer>, ErrorKind> {
        let reply = (self.responder)(&call);
        self.calls.lock().push(call);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn all_beers(&self, page: u32) -> Result<Vec<Beer>, ErrorKind> {
        self.answer(Call::All { page }).await
    }

    async fn beers_by_name(&self, query: &str, page: u32) -> Result<Vec<Beer>, ErrorKind> {
        self.answer(Call::ByName {
            query: query.to_string(),
            page,
        })
        .await
    }

    async fn beers_by_ids(&self, ids: &[BeerId], page: u32) -> Result<Vec<Beer>, ErrorKind> {
        self.answer(Call::ByIds {
            ids: ids.to_vec(),
            page,
        })
        .await
    }

    async fn random_beer(&self) -> Result<Beer, ErrorKind> {
        self.answer(Call::Random)
            .await?
            .into_iter()
            .next()
            .ok_or(ErrorKind::Deserialization)
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

// -- Error handler ------------------------------------------------------------

#[derive(Default)]
pub struct RecordingErrorHandler {
    kinds: Mutex<Vec<ErrorKind>>,
}

impl RecordingErrorHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.kinds.lock().clone()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn handle(&self, kind: ErrorKind) {
        self.kinds.lock().push(kind);
    }
}

// -- Store --------------------------------------------------------------------

/// Memory-backed store pre-filled with `ids`.
pub fn memory_store(ids: &[BeerId]) -> FavoriteStore {
    let store = FavoriteStore::new(
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(LogActivityTracker),
    );
    for id in ids {
        store.add(*id).unwrap();
    }
    store
}

// -- Channel helpers ----------------------------------------------------------

/// Next message, failing the test if none arrives in time.
///
/// Under paused time the runtime auto-advances to pending timers first.
pub async fn next<T>(subscription: &mut Subscription<T>) -> T {
    tokio::time::timeout(Duration::from_secs(30), subscription.recv())
        .await
        .expect("Timed out waiting for message")
        .expect("Channel closed")
}

/// Receive until `wanted` shows up; returns everything received before it.
pub async fn until<T: PartialEq + Debug>(subscription: &mut Subscription<T>, wanted: T) -> Vec<T> {
    let mut seen = Vec::new();
    loop {
        let message = next(subscription).await;
        if message == wanted {
            return seen;
        }
        seen.push(message);
    }
}

/// Everything already delivered.
pub fn drain<T>(subscription: &mut Subscription<T>) -> Vec<T> {
    let mut seen = Vec::new();
    while let Some(message) = subscription.try_recv() {
        seen.push(message);
    }
    seen
}

/// Let spawned tasks run without advancing the clock.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
