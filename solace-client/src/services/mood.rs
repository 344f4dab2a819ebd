//! Daily mood check-in

use crate::gateway::{DataGateway, Direction, DocPath, Query, Subscription};
use crate::services::SessionState;
use crate::{Error, Result};
use serde_json::json;
use solace_common::events::SolaceEvent;
use solace_common::model::{MoodEntry, MoodLabel};
use solace_common::time;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct MoodService {
    data: Arc<dyn DataGateway>,
    session: Arc<SessionState>,
}

impl MoodService {
    pub fn new(data: Arc<dyn DataGateway>, session: Arc<SessionState>) -> Self {
        MoodService { data, session }
    }

    /// Whether today still lacks a mood record
    ///
    /// Advisory only; nothing stops a second record for the same day,
    /// the aggregates just dedup it.
    pub async fn needs_mood_today(&self) -> Result<bool> {
        let uid = self.session.require_uid().await?;
        let cutoff = time::trailing_window(time::now(), 1);
        let recent = self
            .data
            .get_once(&DocPath::moods(&uid), Query::default().since("createdAt", cutoff))
            .await?;

        let today = time::today();
        for doc in &recent {
            match doc.deserialize::<MoodEntry>() {
                Ok(entry) if entry.date == today => return Ok(false),
                Ok(_) => {}
                Err(e) => warn!("skipping malformed mood entry: {}", e),
            }
        }
        Ok(true)
    }

    /// Record today's mood
    pub async fn record_mood(&self, mood: MoodLabel) -> Result<String> {
        let uid = self.session.require_uid().await?;
        let now = time::now();
        let entry = MoodEntry {
            uid: uid.clone(),
            date: time::day_of(now),
            mood,
            created_at: now,
        };
        let mut fields = serde_json::to_value(&entry)
            .map_err(|e| Error::Internal(format!("serializing mood entry: {}", e)))?;
        // Stored alongside for display, derived from the label
        fields["emoji"] = json!(mood.emoji());

        let id = self.data.add(&DocPath::moods(&uid), fields).await?;
        debug!(id = %id, mood = %mood, "mood recorded");
        self.session.broadcast(SolaceEvent::MoodRecorded {
            mood: mood.to_string(),
            timestamp: now,
        });
        Ok(id)
    }

    /// Live view of the user's mood history, newest first
    pub async fn history(&self) -> Result<Subscription> {
        let uid = self.session.require_uid().await?;
        let query = Query::default().order_by("createdAt", Direction::Descending);
        self.data.subscribe(&DocPath::moods(&uid), query).await
    }
}
