//! Peer-support forum
//!
//! Discussions live in a shared collection; replies are append-only
//! subcollections. Counters on the discussion document are maintained by
//! this client: `support_count` moves in lockstep with the `supporters`
//! list (recomputed from the mutated list, never incremented blind),
//! while `reply_count` is a best-effort read-plus-one that can drift
//! under concurrent writers.

use crate::gateway::{
    AnalysisGateway, DataGateway, Direction, DocPath, Query, Snapshot, Subscription,
};
use crate::services::session::{default_pseudonym, SessionState};
use crate::{Error, Result};
use serde_json::json;
use solace_common::events::{Severity, SolaceEvent};
use solace_common::model::{
    Discussion, DiscussionCategory, Message, ReplyRef, UserProfile,
};
use solace_common::time;
use std::sync::Arc;
use tracing::{debug, warn};

/// Author identity as it appears on forum content
struct ForumIdentity {
    name: String,
    photo_url: Option<String>,
    anonymous_name: String,
}

/// Resolve the posting identity, minting a fallback pseudonym when the
/// profile is anonymous but has never chosen one
fn forum_identity(user: &UserProfile) -> ForumIdentity {
    let anonymous_name = if user.anonymous_name.is_empty() {
        default_pseudonym()
    } else {
        user.anonymous_name.clone()
    };
    if user.is_anonymous {
        ForumIdentity {
            name: anonymous_name.clone(),
            photo_url: None,
            anonymous_name,
        }
    } else {
        ForumIdentity {
            name: if user.display_name.is_empty() {
                "Anonymous User".to_string()
            } else {
                user.display_name.clone()
            },
            photo_url: user.photo_url.clone(),
            anonymous_name,
        }
    }
}

pub struct ForumService {
    data: Arc<dyn DataGateway>,
    analysis: Arc<dyn AnalysisGateway>,
    session: Arc<SessionState>,
}

impl ForumService {
    pub fn new(
        data: Arc<dyn DataGateway>,
        analysis: Arc<dyn AnalysisGateway>,
        session: Arc<SessionState>,
    ) -> Self {
        ForumService {
            data,
            analysis,
            session,
        }
    }

    /// Create a discussion; returns its id
    pub async fn create_discussion(
        &self,
        title: &str,
        content: &str,
        category: DiscussionCategory,
    ) -> Result<String> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(Error::Validation(
                "discussion title and content are required".to_string(),
            ));
        }
        let user = self.session.require_user().await?;
        let identity = forum_identity(&user);
        let now = time::now();

        let discussion = Discussion {
            id: None,
            title: title.to_string(),
            content: content.to_string(),
            category,
            uid: user.uid.clone(),
            is_anonymous: user.is_anonymous,
            anonymous_name: identity.anonymous_name,
            creator_name: identity.name,
            created_at: now,
            last_activity: now,
            reply_count: 0,
            support_count: 0,
            participants: vec![user.uid.clone()],
            supporters: Vec::new(),
            urgent: false,
        };
        let fields = serde_json::to_value(&discussion)
            .map_err(|e| Error::Internal(format!("serializing discussion: {}", e)))?;
        let id = self.data.add(&DocPath::forum(), fields).await?;
        debug!(id = %id, "discussion created");
        Ok(id)
    }

    /// Live view of all discussions, most recently active first
    pub async fn discussions(&self) -> Result<Subscription> {
        let query = Query::default().order_by("lastActivity", Direction::Descending);
        self.data.subscribe(&DocPath::forum(), query).await
    }

    /// One-shot list of the busiest discussions, by participant count
    pub async fn top_discussions(&self, limit: usize) -> Result<Vec<Discussion>> {
        let query = Query::default()
            .order_by("participants", Direction::Descending)
            .limit(limit);
        let docs = self.data.get_once(&DocPath::forum(), query).await?;
        docs.iter()
            .map(|doc| {
                let mut discussion: Discussion = doc.deserialize()?;
                discussion.id = Some(doc.id.clone());
                Ok(discussion)
            })
            .collect()
    }

    /// Live view of a discussion's replies, oldest first
    pub async fn messages(&self, discussion_id: &str) -> Result<Subscription> {
        let query = Query::default().order_by("createdAt", Direction::Ascending);
        self.data
            .subscribe(&DocPath::forum_messages(discussion_id), query)
            .await
    }

    /// Append a reply and bump the discussion's activity
    ///
    /// The reply itself is the durable part; the counter/participants
    /// update and the analysis notification are best-effort follow-ups.
    pub async fn post_message(
        &self,
        discussion_id: &str,
        content: &str,
        reply_to: Option<ReplyRef>,
    ) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::Validation("message cannot be empty".to_string()));
        }
        let user = self.session.require_user().await?;
        let identity = forum_identity(&user);
        let now = time::now();

        let message = Message {
            uid: user.uid.clone(),
            content: content.to_string(),
            reply_to,
            author_name: identity.name,
            author_photo_url: identity.photo_url,
            is_anonymous: user.is_anonymous,
            created_at: now,
        };
        let fields = serde_json::to_value(&message)
            .map_err(|e| Error::Internal(format!("serializing message: {}", e)))?;
        let message_id = self
            .data
            .add(&DocPath::forum_messages(discussion_id), fields)
            .await?;

        let discussion = self.load_discussion(discussion_id).await?;
        let reply_count = discussion.reply_count + 1;
        let mut participants = discussion.participants;
        if !participants.contains(&user.uid) {
            participants.push(user.uid.clone());
        }
        self.data
            .update(
                &DocPath::forum().doc(discussion_id),
                json!({
                    "lastActivity": now,
                    "replyCount": reply_count,
                    "participants": participants,
                }),
            )
            .await?;

        if let Err(e) = self.analysis.analyze_post(&message_id, discussion_id).await {
            warn!("post analysis request failed: {}", e);
        }

        self.session.broadcast(SolaceEvent::DiscussionActivity {
            discussion_id: discussion_id.to_string(),
            reply_count,
            timestamp: now,
        });
        Ok(message_id)
    }

    /// Add or withdraw the caller's support for a discussion
    ///
    /// Returns whether the caller supports the discussion after the
    /// toggle. The supporters list is mutated and the count recomputed
    /// from it, then both are written together. A failed write changes
    /// nothing and surfaces as a notification.
    pub async fn toggle_support(&self, discussion_id: &str) -> Result<bool> {
        let uid = self.session.require_uid().await?;
        let discussion = self.load_discussion(discussion_id).await?;

        let mut supporters = discussion.supporters;
        let supported = if supporters.contains(&uid) {
            supporters.retain(|s| s != &uid);
            false
        } else {
            supporters.push(uid.clone());
            true
        };
        let support_count = supporters.len() as u32;

        let write = self
            .data
            .update(
                &DocPath::forum().doc(discussion_id),
                json!({
                    "supportCount": support_count,
                    "supporters": supporters,
                }),
            )
            .await;
        if let Err(e) = write {
            warn!("support toggle failed: {}", e);
            self.session.broadcast(SolaceEvent::notify(
                Severity::Error,
                "Failed to update support. Please try again.",
            ));
            return Err(e);
        }

        self.session.broadcast(SolaceEvent::SupportToggled {
            discussion_id: discussion_id.to_string(),
            support_count,
            supported,
            timestamp: time::now(),
        });
        Ok(supported)
    }

    async fn load_discussion(&self, discussion_id: &str) -> Result<Discussion> {
        let docs: Snapshot = self
            .data
            .get_once(&DocPath::forum().doc(discussion_id), Query::default())
            .await?;
        let doc = docs
            .first()
            .ok_or_else(|| Error::NotFound(format!("discussion {}", discussion_id)))?;
        let mut discussion: Discussion = doc.deserialize()?;
        discussion.id = Some(doc.id.clone());
        Ok(discussion)
    }
}
