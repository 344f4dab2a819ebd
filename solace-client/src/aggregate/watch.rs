//! Live watchers over the mood and sentiment collections
//!
//! Each watcher holds one store subscription, recomputes its aggregate
//! on every snapshot, caches the latest value in a `tokio::sync::watch`
//! cell and broadcasts the recomputed value as an event. Stopping the
//! watcher (or dropping it) aborts the task, which drops the
//! subscription and cancels the remote registration.

use crate::aggregate::{mood, sentiment};
use crate::gateway::{DataGateway, Direction, DocPath, Query};
use crate::Result;
use solace_common::events::{MoodStats, SentimentStats, SolaceEvent};
use solace_common::model::{MoodEntry, SentimentRecord};
use solace_common::time;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Recomputes [`MoodStats`] on every change to the user's mood history
pub struct MoodWatcher {
    latest: watch::Receiver<Option<MoodStats>>,
    task: JoinHandle<()>,
}

impl MoodWatcher {
    /// Subscribe to the user's moods and start recomputing
    pub async fn spawn(
        gateway: Arc<dyn DataGateway>,
        uid: &str,
        events: broadcast::Sender<SolaceEvent>,
    ) -> Result<Self> {
        let query = Query::default().order_by("createdAt", Direction::Descending);
        let mut sub = gateway.subscribe(&DocPath::moods(uid), query).await?;
        let (tx, rx) = watch::channel(None);
        let uid = uid.to_string();

        let task = tokio::spawn(async move {
            while let Some(snapshot) = sub.next().await {
                let entries: Vec<MoodEntry> = snapshot
                    .iter()
                    .filter_map(|doc| match doc.deserialize() {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            warn!("Skipping malformed mood entry: {}", e);
                            None
                        }
                    })
                    .collect();
                let now = time::now();
                let stats = mood::stats(&entries, now);
                debug!(uid = %uid, entries = entries.len(), "Mood stats recomputed");
                let _ = tx.send(Some(stats.clone()));
                let _ = events.send(SolaceEvent::MoodStatsChanged {
                    stats,
                    timestamp: now,
                });
            }
        });

        Ok(MoodWatcher { latest: rx, task })
    }

    /// Most recent stats; `None` before the first snapshot arrives
    pub fn latest(&self) -> Option<MoodStats> {
        self.latest.borrow().clone()
    }

    /// Wait until a snapshot newer than the last observed one lands
    pub async fn changed(&mut self) -> Option<MoodStats> {
        if self.latest.changed().await.is_err() {
            return None;
        }
        self.latest.borrow_and_update().clone()
    }

    /// Stop recomputing and release the subscription
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for MoodWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Recomputes [`SentimentStats`] on every change to a sentiment
/// collection (free-form or assessment, chosen at spawn time)
pub struct SentimentWatcher {
    latest: watch::Receiver<Option<SentimentStats>>,
    task: JoinHandle<()>,
}

impl SentimentWatcher {
    /// Watch the user's free-form sentiment records
    pub async fn spawn(
        gateway: Arc<dyn DataGateway>,
        uid: &str,
        events: broadcast::Sender<SolaceEvent>,
    ) -> Result<Self> {
        Self::spawn_at(gateway, DocPath::sentiments(uid), events).await
    }

    /// Watch the assessment-flow sentiment records instead
    pub async fn spawn_assessment(
        gateway: Arc<dyn DataGateway>,
        uid: &str,
        events: broadcast::Sender<SolaceEvent>,
    ) -> Result<Self> {
        Self::spawn_at(gateway, DocPath::assessment_sentiments(uid), events).await
    }

    async fn spawn_at(
        gateway: Arc<dyn DataGateway>,
        path: DocPath,
        events: broadcast::Sender<SolaceEvent>,
    ) -> Result<Self> {
        let query = Query::default().order_by("createdAt", Direction::Descending);
        let mut sub = gateway.subscribe(&path, query).await?;
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(async move {
            while let Some(snapshot) = sub.next().await {
                let records: Vec<SentimentRecord> = snapshot
                    .iter()
                    .filter_map(|doc| match doc.deserialize() {
                        Ok(record) => Some(record),
                        Err(e) => {
                            warn!("Skipping malformed sentiment record: {}", e);
                            None
                        }
                    })
                    .collect();
                debug!(path = %path, records = records.len(), "Sentiment stats recomputed");
                let stats = sentiment::stats(&records);
                let _ = tx.send(stats.clone());
                if let Some(stats) = stats {
                    let _ = events.send(SolaceEvent::SentimentSummaryChanged {
                        stats,
                        timestamp: time::now(),
                    });
                }
            }
        });

        Ok(SentimentWatcher { latest: rx, task })
    }

    /// Most recent stats; `None` before the first non-empty snapshot
    pub fn latest(&self) -> Option<SentimentStats> {
        self.latest.borrow().clone()
    }

    /// Wait until a snapshot newer than the last observed one lands
    pub async fn changed(&mut self) -> Option<SentimentStats> {
        if self.latest.changed().await.is_err() {
            return None;
        }
        self.latest.borrow_and_update().clone()
    }

    /// Stop recomputing and release the subscription
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SentimentWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
