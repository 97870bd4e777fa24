//! Cancellable background work owned by a session worker.
//!
//! Aborting a tokio task is best-effort: the task may already have finished
//! and queued its result in the worker's inbox. Every start of a
//! [`TaskSlot`] therefore hands out a [`Ticket`], and results are applied
//! only if [`TaskSlot::accept`] still recognises the ticket.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one start of a [`TaskSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Holds at most one running task.
#[derive(Debug, Default)]
pub struct TaskSlot {
    generation: u64,
    running: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is running and spawn `make(ticket)` in its place.
    pub fn start<F, Fut>(&mut self, make: F) -> Ticket
    where
        F: FnOnce(Ticket) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.running = Some(tokio::spawn(make(ticket)));
        ticket
    }

    /// Single-shot timer: after `delay`, post `make(ticket)` to `outbox`.
    pub fn schedule<M, F>(&mut self, delay: Duration, outbox: &mpsc::UnboundedSender<M>, make: F) -> Ticket
    where
        M: Send + 'static,
        F: FnOnce(Ticket) -> M + Send + 'static,
    {
        let outbox = outbox.clone();
        self.start(move |ticket| async move {
            tokio::time::sleep(delay).await;
            let _ = outbox.send(make(ticket));
        })
    }

    /// Abort the running task and invalidate its ticket.
    ///
    /// Returns `false` if nothing was pending (including after the result
    /// was accepted).
    pub fn cancel(&mut self) -> bool {
        match self.running.take() {
            Some(handle) => {
                handle.abort();
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Claim the result for `ticket`. True once, and only for the live ticket.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if self.running.is_some() && ticket.0 == self.generation {
            self.running = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
