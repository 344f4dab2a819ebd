//! Event types for the Solace event system
//!
//! Every state change a view could care about is broadcast as a
//! `SolaceEvent` on the session's `tokio::sync::broadcast` channel.
//! Listeners that lag simply miss events; all aggregate events carry the
//! full recomputed value, so the next event makes a listener whole again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a user-facing notification (toast equivalent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Capture pipeline state, mirrored into events on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    Idle,
    RequestingDevice,
    Recording,
    Stopping,
    Decoding,
    Encoding,
    Failed,
}

/// Mood trend direction from the single-pair comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
    NotEnoughData,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Improving => write!(f, "Improving"),
            Trend::Declining => write!(f, "Declining"),
            Trend::NotEnoughData => write!(f, "Not enough data"),
        }
    }
}

/// Summary statistics over a user's mood history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodStats {
    /// Arithmetic mean of mood levels over the trailing 7 days
    pub weekly_average: Option<f64>,
    /// Consecutive calendar days with a mood record, ending today
    pub tracking_streak: u32,
    pub trend: Trend,
}

/// Summary statistics over a user's sentiment records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentStats {
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    /// Emotion label with the highest average intensity
    pub dominant_emotion: String,
    pub trend: Trend,
    pub record_count: usize,
}

/// Solace event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolaceEvent {
    /// Mood aggregates recomputed after a change notification
    MoodStatsChanged {
        stats: MoodStats,
        timestamp: DateTime<Utc>,
    },

    /// A mood entry was recorded for today
    MoodRecorded {
        mood: String,
        timestamp: DateTime<Utc>,
    },

    /// Sentiment aggregates recomputed after a change notification
    SentimentSummaryChanged {
        stats: SentimentStats,
        timestamp: DateTime<Utc>,
    },

    /// Audio capture pipeline transitioned states
    CaptureStateChanged {
        state: CaptureState,
        timestamp: DateTime<Utc>,
    },

    /// Assessment flow advanced to the next question
    AssessmentAdvanced {
        question_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// All assessment questions answered; video sampling may stop
    AssessmentCompleted {
        timestamp: DateTime<Utc>,
    },

    /// A webcam frame was captured and forwarded for analysis
    FrameSampled {
        bytes: usize,
        timestamp: DateTime<Utc>,
    },

    /// A frame send failed (logged, not retried; next tick is the retry)
    FrameSampleFailed {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A discussion gained a reply or had its activity bumped
    DiscussionActivity {
        discussion_id: String,
        reply_count: u32,
        timestamp: DateTime<Utc>,
    },

    /// Support was added or removed on a discussion
    SupportToggled {
        discussion_id: String,
        support_count: u32,
        supported: bool,
        timestamp: DateTime<Utc>,
    },

    /// Transient user-facing notification (toast equivalent)
    Notification {
        severity: Severity,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl SolaceEvent {
    /// Convenience constructor for notifications
    pub fn notify(severity: Severity, message: impl Into<String>) -> Self {
        SolaceEvent::Notification {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
