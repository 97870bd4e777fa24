//! Typed publish/subscribe channel.
//!
//! A [`Channel`] fans each published message out to the subscribers active
//! at publish time, in subscription order. There is no buffering for late
//! subscribers and no replay. Delivery happens on whatever task the
//! subscriber reads from, never on the publisher's.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Subscribers<T> {
    next_id: u64,
    senders: Vec<(u64, mpsc::UnboundedSender<T>)>,
}

/// Cloneable handle to a pub/sub channel.
pub struct Channel<T> {
    inner: Arc<Mutex<Subscribers<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Channel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Subscribers {
                next_id: 0,
                senders: Vec::new(),
            })),
        }
    }

    /// Deliver `message` to every active subscriber.
    ///
    /// Never blocks: each subscriber has its own unbounded queue.
    pub fn publish(&self, message: T) {
        let mut subscribers = self.inner.lock();
        subscribers
            .senders
            .retain(|(_, sender)| sender.send(message.clone()).is_ok());
    }

    /// Register a new subscriber. Only messages published after this call
    /// are delivered to it.
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut subscribers = self.inner.lock();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.senders.push((id, sender));

        Subscription {
            id,
            receiver,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Run `on_message` for every message on a task spawned on `runtime`.
    pub fn observe<F>(&self, runtime: &Handle, mut on_message: F) -> Observer
    where
        F: FnMut(T) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let task = runtime.spawn(async move {
            while let Some(message) = subscription.recv().await {
                on_message(message);
            }
        });
        Observer { task }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().senders.len()
    }
}

/// Receiving end of one subscription.
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::UnboundedReceiver<T>,
    channel: Weak<Mutex<Subscribers<T>>>,
}

impl<T> Subscription<T> {
    /// Wait for the next message. Returns `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Take the next already-delivered message, if any.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Stop delivery. Messages still queued for this subscriber are dropped.
    pub fn cancel(self) {
        drop(self);
    }

    fn detach(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.lock().senders.retain(|(id, _)| *id != self.id);
        }
        self.receiver.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Callback subscription created by [`Channel::observe`].
pub struct Observer {
    task: JoinHandle<()>,
}

impl Observer {
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
