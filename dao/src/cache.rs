//! Per-id activity cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crowd_types::Activity;

/// How long a fetched activity is served without refetching.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5);

/// Successful fetches keyed by activity id. Failures are never cached.
#[derive(Debug)]
pub struct ActivityCache {
    stale_after: Duration,
    entries: Mutex<HashMap<u64, (Instant, Activity)>>,
}

impl ActivityCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached activity if it is younger than the stale time.
    pub fn fresh(&self, id: u64) -> Option<Activity> {
        self.fresh_at(id, Instant::now())
    }

    pub(crate) fn fresh_at(&self, id: u64, now: Instant) -> Option<Activity> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(&id)
            .filter(|(fetched, _)| now.saturating_duration_since(*fetched) < self.stale_after)
            .map(|(_, activity)| activity.clone())
    }

    pub fn insert(&self, activity: Activity) {
        self.insert_at(activity, Instant::now());
    }

    pub(crate) fn insert_at(&self, activity: Activity, fetched: Instant) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(activity.id, (fetched, activity));
        }
    }

    pub fn invalidate(&self, id: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&id);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Default for ActivityCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}
