//! The favorite set: a persisted, synchronised set of beer ids.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::BeerId;
use crate::channel::{Channel, Subscription};
use crate::favorites::persistence::{KeyValueStore, StoreError};
use crate::favorites::tracker::{Activity, ActivityTracker};

/// Key the id list is persisted under.
pub const FAVORITES_KEY: &str = "favoriteBeers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesEvent {
    /// Membership changed. `ids` is the full post-mutation set, ascending.
    Changed { ids: Vec<BeerId> },
}

struct Inner {
    backing: Arc<dyn KeyValueStore>,
    tracker: Arc<dyn ActivityTracker>,
    events: Channel<FavoritesEvent>,
    // Serialises every read-modify-write on this store.
    lock: Mutex<()>,
}

/// Cloneable handle; clones share the same set.
#[derive(Clone)]
pub struct FavoriteStore {
    inner: Arc<Inner>,
}

impl FavoriteStore {
    pub fn new(backing: Arc<dyn KeyValueStore>, tracker: Arc<dyn ActivityTracker>) -> Self {
        Self {
            inner: Arc::new(Inner {
                backing,
                tracker,
                events: Channel::new(),
                lock: Mutex::new(()),
            }),
        }
    }

    /// Current ids, ascending, without duplicates.
    pub fn list(&self) -> Result<Vec<BeerId>, StoreError> {
        let _guard = self.inner.lock.lock();
        Ok(self.read()?.into_iter().collect())
    }

    pub fn contains(&self, id: BeerId) -> Result<bool, StoreError> {
        let _guard = self.inner.lock.lock();
        Ok(self.read()?.contains(&id))
    }

    /// Add `id`. Returns whether membership changed.
    pub fn add(&self, id: BeerId) -> Result<bool, StoreError> {
        let changed = self.mutate("add", id, |ids| ids.insert(id))?;
        self.inner
            .tracker
            .track(Activity::AddedBeerToFavorites { id });
        Ok(changed)
    }

    /// Remove `id`. Returns whether membership changed.
    pub fn remove(&self, id: BeerId) -> Result<bool, StoreError> {
        self.mutate("remove", id, |ids| ids.remove(&id))
    }

    /// Change notifications published after this call.
    pub fn subscribe(&self) -> Subscription<FavoritesEvent> {
        self.inner.events.subscribe()
    }

    fn read(&self) -> Result<BTreeSet<BeerId>, StoreError> {
        Ok(self
            .inner
            .backing
            .get_ids(FAVORITES_KEY)?
            .into_iter()
            .collect())
    }

    fn mutate(
        &self,
        op: &'static str,
        id: BeerId,
        apply: impl FnOnce(&mut BTreeSet<BeerId>) -> bool,
    ) -> Result<bool, StoreError> {
        let _guard = self.inner.lock.lock();
        let before = self.read()?;
        let mut after = before.clone();
        apply(&mut after);

        let ids: Vec<BeerId> = after.iter().copied().collect();
        // Written even when nothing changed.
        self.inner.backing.set_ids(FAVORITES_KEY, &ids)?;

        let changed = before != after;
        tracing::debug!(op, beer_id = id, changed, count = ids.len(), "Favorites updated");
        if changed {
            self.inner.events.publish(FavoritesEvent::Changed { ids });
        }
        Ok(changed)
    }
}
