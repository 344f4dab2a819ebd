//! Live aggregation layer
//!
//! Pure reductions over timestamped record sets, plus watchers that
//! resubscribe to the live collections and recompute on every change
//! notification. Each recompute is a full O(n) rescan of the held record
//! set; per-user record counts stay in the hundreds, so incremental
//! aggregation is deliberately not attempted.

pub mod mood;
pub mod sentiment;
pub mod watch;

pub use watch::{MoodWatcher, SentimentWatcher};
