//! Batched activity reads with aggregate loading and error flags.

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

use crowd_types::Activity;

use crate::cache::ActivityCache;
use crate::error::DaoError;
use crate::reader::DaoReader;

/// Aggregate state of a batch: loading until every fetch settles, errored
/// as soon as any fetch fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStatus {
    pub loading: bool,
    pub error: bool,
}

/// Per-id outcomes in request order, plus the final status.
#[derive(Debug)]
pub struct BatchResult {
    pub results: Vec<(u64, Result<Activity, DaoError>)>,
    pub status: BatchStatus,
}

impl BatchResult {
    /// The activities that loaded, in request order.
    pub fn activities(&self) -> Vec<&Activity> {
        self.results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .collect()
    }
}

pub struct ActivityQueries {
    reader: DaoReader,
    cache: Arc<ActivityCache>,
    status: watch::Sender<BatchStatus>,
}

impl ActivityQueries {
    pub fn new(reader: DaoReader) -> Self {
        Self::with_cache(reader, Arc::new(ActivityCache::default()))
    }

    pub fn with_cache(reader: DaoReader, cache: Arc<ActivityCache>) -> Self {
        let (status, _) = watch::channel(BatchStatus::default());
        Self {
            reader,
            cache,
            status,
        }
    }

    pub fn cache(&self) -> &ActivityCache {
        &self.cache
    }

    /// Watch the status of the current batch.
    pub fn subscribe(&self) -> watch::Receiver<BatchStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> BatchStatus {
        *self.status.borrow()
    }

    /// Fetch every id concurrently. Fresh cache entries are served without a
    /// network call; each fetch settles independently.
    pub async fn fetch_batch(&self, ids: &[u64]) -> BatchResult {
        self.status.send_replace(BatchStatus {
            loading: !ids.is_empty(),
            error: false,
        });

        let mut pending: FuturesUnordered<_> = ids
            .iter()
            .enumerate()
            .map(|(index, &id)| async move {
                let result = match self.cache.fresh(id) {
                    Some(activity) => Ok(activity),
                    None => self.reader.fetch_activity(id).await,
                };
                (index, id, result)
            })
            .collect();

        let mut slots: Vec<Option<(u64, Result<Activity, DaoError>)>> =
            (0..ids.len()).map(|_| None).collect();
        while let Some((index, id, result)) = pending.next().await {
            match &result {
                Ok(activity) => self.cache.insert(activity.clone()),
                Err(e) => {
                    warn!(id, error = %e, "activity fetch failed");
                    self.status.send_modify(|s| s.error = true);
                }
            }
            slots[index] = Some((id, result));
        }
        self.status.send_modify(|s| s.loading = false);

        BatchResult {
            results: slots.into_iter().flatten().collect(),
            status: self.status(),
        }
    }
}
