use crate::catalog::BeerId;

/// Something the user did that analytics cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    AddedBeerToFavorites { id: BeerId },
}

/// Fire-and-forget activity sink. Must not block.
pub trait ActivityTracker: Send + Sync {
    fn track(&self, activity: Activity);
}

/// Records activity as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogActivityTracker;

impl ActivityTracker for LogActivityTracker {
    fn track(&self, activity: Activity) {
        match activity {
            Activity::AddedBeerToFavorites { id } => {
                tracing::info!(beer_id = id, "User added beer to favorites");
            }
        }
    }
}
