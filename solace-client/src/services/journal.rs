//! Journal entries
//!
//! Saving persists the entry first; the analysis request is a
//! fire-and-forget side effect. A failed analysis call never rolls the
//! entry back — the entry is the user's, the score is decoration.

use crate::gateway::{
    AnalysisGateway, DataGateway, Direction, DocPath, Query, Subscription,
};
use crate::services::SessionState;
use crate::{Error, Result};
use solace_common::model::JournalEntry;
use solace_common::time;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::capture::WavClip;

pub struct JournalService {
    data: Arc<dyn DataGateway>,
    analysis: Arc<dyn AnalysisGateway>,
    session: Arc<SessionState>,
}

impl JournalService {
    pub fn new(
        data: Arc<dyn DataGateway>,
        analysis: Arc<dyn AnalysisGateway>,
        session: Arc<SessionState>,
    ) -> Self {
        JournalService {
            data,
            analysis,
            session,
        }
    }

    /// Persist a text entry and request its sentiment analysis
    ///
    /// Returns the new entry's id.
    pub async fn save_entry(&self, content: &str) -> Result<String> {
        let uid = self.session.require_uid().await?;
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("journal entry cannot be empty".to_string()));
        }

        let entry = JournalEntry {
            uid: uid.clone(),
            content: content.to_string(),
            has_audio: false,
            created_at: time::now(),
        };
        let fields = serde_json::to_value(&entry)
            .map_err(|e| Error::Internal(format!("serializing journal entry: {}", e)))?;
        let id = self.data.add(&DocPath::journal(&uid), fields).await?;
        debug!(id = %id, "journal entry saved");

        if let Err(e) = self.analysis.analyze_note(&uid, &id).await {
            warn!("note analysis request failed: {}", e);
        }
        Ok(id)
    }

    /// Persist a voice entry and submit its clip for audio analysis
    ///
    /// The optional text becomes the entry's content; the clip itself is
    /// not stored by this client, only analyzed.
    pub async fn save_audio_entry(&self, content: Option<&str>, clip: WavClip) -> Result<String> {
        let uid = self.session.require_uid().await?;
        let content = content.map(str::trim).unwrap_or_default();

        let entry = JournalEntry {
            uid: uid.clone(),
            content: content.to_string(),
            has_audio: true,
            created_at: time::now(),
        };
        let fields = serde_json::to_value(&entry)
            .map_err(|e| Error::Internal(format!("serializing journal entry: {}", e)))?;
        let id = self.data.add(&DocPath::journal(&uid), fields).await?;
        debug!(id = %id, samples = clip.sample_count, "audio journal entry saved");

        if let Err(e) = self.analysis.analyze_audio(&uid, false, clip.bytes).await {
            warn!("audio analysis request failed: {}", e);
        }
        Ok(id)
    }

    /// Live view of the user's entries, newest first
    pub async fn entries(&self) -> Result<Subscription> {
        let uid = self.session.require_uid().await?;
        let query = Query::default().order_by("createdAt", Direction::Descending);
        self.data.subscribe(&DocPath::journal(&uid), query).await
    }
}
