//! Mood statistics: streak, weekly average, trend

use chrono::{DateTime, NaiveDate, Utc};
use solace_common::events::{MoodStats, Trend};
use solace_common::model::MoodEntry;
use solace_common::time;
use std::collections::BTreeSet;

/// Records compared for the trend: newest against the Nth-most-recent
const TREND_WINDOW: usize = 5;

/// Consecutive calendar days with a mood record, walking backward from
/// `today`; a missing day ends the streak
///
/// A day with no record *today* yields 0 even if yesterday has one.
/// Duplicate same-day entries count once.
pub fn streak(entries: &[MoodEntry], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date).collect();

    let mut streak = 0u32;
    let mut expected = today;
    while days.contains(&expected) {
        streak += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    streak
}

/// Mean mood level over the trailing 7 days; `None` with no entries
pub fn weekly_average(entries: &[MoodEntry], now: DateTime<Utc>) -> Option<f64> {
    let cutoff = time::trailing_window(now, 7);
    let levels: Vec<f64> = entries
        .iter()
        .filter(|e| e.created_at >= cutoff)
        .map(|e| e.mood.level() as f64)
        .collect();
    if levels.is_empty() {
        return None;
    }
    Some(levels.iter().sum::<f64>() / levels.len() as f64)
}

/// Single-pair trend: newest mood level against the oldest of the most
/// recent five entries; no smoothing
///
/// `entries` must be sorted newest first, the order the mood
/// subscription delivers.
pub fn trend(entries: &[MoodEntry]) -> Trend {
    if entries.len() < 2 {
        return Trend::NotEnoughData;
    }
    let window = &entries[..entries.len().min(TREND_WINDOW)];
    let newest = window[0].mood.level();
    let oldest = window[window.len() - 1].mood.level();
    if newest > oldest {
        Trend::Improving
    } else {
        Trend::Declining
    }
}

/// Full mood summary; `entries` sorted newest first
pub fn stats(entries: &[MoodEntry], now: DateTime<Utc>) -> MoodStats {
    MoodStats {
        weekly_average: weekly_average(entries, now),
        tracking_streak: streak(entries, time::day_of(now)),
        trend: trend(entries),
    }
}
