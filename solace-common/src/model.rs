//! Domain model types
//!
//! These mirror the documents held in the remote store. Field names
//! serialize in camelCase to stay wire-compatible with the existing
//! collections (`users/{uid}/journal`, `.../moods`, `.../sentiments`,
//! `forum`, `forum/{id}/messages`).
//!
//! Moods, journal entries and sentiment records are immutable once
//! written; discussions mutate only through the reply and support paths.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed mood vocabulary with its numeric scale
///
/// The level mapping (Happy=5 .. Stressed=1) feeds the weekly average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodLabel {
    Happy,
    Calm,
    Neutral,
    Sad,
    Stressed,
}

impl MoodLabel {
    /// Numeric mood level used for averages and trend comparison
    pub fn level(&self) -> u8 {
        match self {
            MoodLabel::Happy => 5,
            MoodLabel::Calm => 4,
            MoodLabel::Neutral => 3,
            MoodLabel::Sad => 2,
            MoodLabel::Stressed => 1,
        }
    }

    /// Emoji shown next to the label in mood pickers
    pub fn emoji(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "😊",
            MoodLabel::Calm => "😌",
            MoodLabel::Neutral => "😐",
            MoodLabel::Sad => "😔",
            MoodLabel::Stressed => "😣",
        }
    }

    pub const ALL: [MoodLabel; 5] = [
        MoodLabel::Happy,
        MoodLabel::Calm,
        MoodLabel::Neutral,
        MoodLabel::Sad,
        MoodLabel::Stressed,
    ];
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MoodLabel::Happy => "Happy",
            MoodLabel::Calm => "Calm",
            MoodLabel::Neutral => "Neutral",
            MoodLabel::Sad => "Sad",
            MoodLabel::Stressed => "Stressed",
        };
        write!(f, "{}", s)
    }
}

/// One mood record per owner per calendar day (advisory, not enforced)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub uid: String,
    /// Calendar date of the entry, day granularity
    pub date: NaiveDate,
    pub mood: MoodLabel,
    pub created_at: DateTime<Utc>,
}

/// A saved journal entry; analysis is requested as a side effect of the
/// save and is not part of the entry's own consistency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(rename = "userId")]
    pub uid: String,
    pub content: String,
    #[serde(default)]
    pub has_audio: bool,
    pub created_at: DateTime<Utc>,
}

/// Source of a sentiment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentKind {
    /// Text journal entry
    Note,
    /// Recorded audio clip
    Audio,
    /// Webcam video frame
    #[serde(rename = "image")]
    Video,
    /// Support-bot chat prompt
    Chat,
    /// Forum message
    Post,
}

/// Externally computed emotion scores for a piece of user content
///
/// Written exclusively by the analysis service; the client only reads
/// and aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRecord {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: SentimentKind,
    /// Snippet of the analyzed content
    #[serde(default)]
    pub content: String,
    /// Overall score in [0, 1]
    #[serde(default)]
    pub score: f64,
    /// Emotion label -> intensity in [0, 1]
    ///
    /// BTreeMap keeps iteration order independent of the upstream
    /// store's key order.
    #[serde(default)]
    pub emotions: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

/// Forum thread categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscussionCategory {
    General,
    Anxiety,
    Depression,
    Stress,
    Relationships,
    Recovery,
}

impl Default for DiscussionCategory {
    fn default() -> Self {
        DiscussionCategory::General
    }
}

/// A forum thread
///
/// Invariant: `support_count == supporters.len()` on every write this
/// client produces; the two fields always change in the same update.
/// `reply_count` is a best-effort increment, not recomputed from a true
/// message count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: DiscussionCategory,
    pub uid: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub anonymous_name: String,
    /// Display identity at creation time (pseudonym when anonymous)
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub support_count: u32,
    /// Ordered, unique participant ids (creator first)
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub supporters: Vec<String>,
    #[serde(default)]
    pub urgent: bool,
}

/// Snapshot of the quoted message carried by a reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRef {
    pub message_id: String,
    pub author_name: String,
    pub content: String,
}

/// A reply within a discussion; append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub uid: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyRef>,
    pub author_name: String,
    #[serde(rename = "authorPhotoURL")]
    pub author_photo_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Who authored a chat turn with the support assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Bot,
}

/// One turn of the support-assistant conversation
///
/// History lives as an array on the user document and is rewritten
/// wholesale on each exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub sender: ChatSender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Demographic profile sub-object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Demographics {
    /// Location string derived from city + state
    pub fn location(&self) -> Option<String> {
        match (&self.city, &self.state) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(city), None) => Some(city.clone()),
            (None, Some(state)) => Some(state.clone()),
            (None, None) => None,
        }
    }
}

/// Identity fields safe to surface to other users
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayIdentity {
    pub name: String,
    pub photo_url: Option<String>,
}

/// A user profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub anonymous_name: String,
    #[serde(default)]
    pub demographics: Demographics,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Identity surfaced to other users in discussions and messages
    ///
    /// When the anonymity flag is set, the pseudonym replaces the real
    /// name and the photo is withheld. This is a presentation-time
    /// substitution; nothing is deleted from the profile document.
    pub fn display_identity(&self) -> DisplayIdentity {
        if self.is_anonymous {
            DisplayIdentity {
                name: if self.anonymous_name.is_empty() {
                    "Anonymous User".to_string()
                } else {
                    self.anonymous_name.clone()
                },
                photo_url: None,
            }
        } else {
            DisplayIdentity {
                name: if self.display_name.is_empty() {
                    "Anonymous User".to_string()
                } else {
                    self.display_name.clone()
                },
                photo_url: self.photo_url.clone(),
            }
        }
    }
}
