//! Screen sessions.
//!
//! Each session runs on its own worker task. Intents from the presentation
//! layer and results of the session's own background work arrive in that
//! task's inboxes and are applied one at a time, so session state needs no
//! locking. Output leaves through two channels: requests (what to display)
//! and events (what happened).
//!
//! ```text
//! intent ──→ worker ──→ requests / events ──→ presentation
//!              ↑  │
//!              │  └──→ catalog / store (spawned)
//!              └────── results (internal inbox)
//! ```

pub mod browser;
pub mod detail;
pub mod favorites;
pub mod random;

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::channel::{Channel, Subscription};

pub use browser::{BrowserEvent, BrowserIntent, BrowserRequest, BrowsingMode, BrowsingSession};
pub use detail::{DetailIntent, DetailParams, DetailRequest, DetailSession};
pub use favorites::{FavoritesIntent, FavoritesRequest, FavoritesSession, FavoritesSessionEvent};
pub use random::{RandomEvent, RandomIntent, RandomRequest, RandomSession};

enum Command<I> {
    Intent(I),
    Shutdown,
}

/// Worker side of a session's intent queue.
pub(crate) struct Inbox<I> {
    receiver: mpsc::UnboundedReceiver<Command<I>>,
}

impl<I> Inbox<I> {
    /// Next intent, or `None` once the session is shut down or dropped.
    pub(crate) async fn next(&mut self) -> Option<I> {
        match self.receiver.recv().await {
            Some(Command::Intent(intent)) => Some(intent),
            Some(Command::Shutdown) | None => None,
        }
    }
}

/// Handle to a running session.
///
/// Dropping the handle also stops the worker, but only
/// [`shutdown`](Session::shutdown) waits for its teardown to finish.
pub struct Session<I, R, E> {
    name: &'static str,
    commands: mpsc::UnboundedSender<Command<I>>,
    requests: Channel<R>,
    events: Channel<E>,
    worker: JoinHandle<()>,
}

impl<I, R, E> Session<I, R, E>
where
    I: Send + 'static,
    R: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn spawn<F, Fut>(name: &'static str, run: F) -> Self
    where
        F: FnOnce(Inbox<I>, Channel<R>, Channel<E>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let requests = Channel::new();
        let events = Channel::new();

        let worker = tokio::spawn(run(Inbox { receiver }, requests.clone(), events.clone()));
        tracing::debug!(session = name, "Session started");

        Self {
            name,
            commands,
            requests,
            events,
            worker,
        }
    }

    /// Queue an intent for the worker. Never blocks.
    pub fn send(&self, intent: I) {
        if self.commands.send(Command::Intent(intent)).is_err() {
            tracing::trace!(session = self.name, "Session closed, intent dropped");
        }
    }

    /// Subscribe to display requests. Only requests published after this
    /// call are delivered.
    pub fn requests(&self) -> Subscription<R> {
        self.requests.subscribe()
    }

    pub fn events(&self) -> Subscription<E> {
        self.events.subscribe()
    }

    /// Stop the worker and wait until it has cancelled its in-flight work and
    /// released its subscriptions.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(e) = self.worker.await {
            tracing::error!(session = self.name, error = %e, "Session worker failed");
        } else {
            tracing::debug!(session = self.name, "Session stopped");
        }
    }
}
