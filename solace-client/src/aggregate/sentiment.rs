//! Sentiment statistics: dominant emotion, score summary, trend
//!
//! Emotion maps arrive from the analysis service with no guaranteed key
//! order, so tie-breaking uses a fixed canonical label order instead of
//! whatever order the store happens to return.

use once_cell::sync::Lazy;
use solace_common::events::{SentimentStats, Trend};
use solace_common::model::SentimentRecord;
use std::collections::{BTreeMap, HashMap};

/// Records compared for the trend: newest against the Nth-most-recent
const TREND_WINDOW: usize = 5;

/// Label returned for empty or all-zero emotion maps
pub const DEFAULT_EMOTION: &str = "neutral";

/// Canonical emotion order for deterministic tie-breaking; labels not
/// listed rank after these, alphabetically
const CANONICAL_ORDER: [&str; 7] = [
    "joy", "neutral", "surprise", "sadness", "fear", "anger", "disgust",
];

static RANK: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    CANONICAL_ORDER
        .iter()
        .enumerate()
        .map(|(i, &label)| (label, i))
        .collect()
});

fn rank(label: &str) -> usize {
    RANK.get(label).copied().unwrap_or(CANONICAL_ORDER.len())
}

/// Emotion label with the highest intensity
///
/// Ties break toward the canonical order; an empty or all-zero map
/// yields [`DEFAULT_EMOTION`] rather than an arbitrary key.
pub fn dominant_emotion(emotions: &BTreeMap<String, f64>) -> String {
    let mut best: Option<(&str, f64)> = None;
    for (label, &intensity) in emotions {
        let better = match best {
            None => true,
            Some((best_label, best_intensity)) => {
                intensity > best_intensity
                    || (intensity == best_intensity
                        && (rank(label), label.as_str()) < (rank(best_label), best_label))
            }
        };
        if better {
            best = Some((label, intensity));
        }
    }
    match best {
        Some((label, intensity)) if intensity > 0.0 => label.to_string(),
        _ => DEFAULT_EMOTION.to_string(),
    }
}

/// Per-emotion intensity averages across a record set
pub fn average_emotions(records: &[SentimentRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        for (label, &intensity) in &record.emotions {
            let entry = totals.entry(label.clone()).or_insert((0.0, 0));
            entry.0 += intensity;
            entry.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(label, (total, count))| (label, total / count as f64))
        .collect()
}

/// Single-pair score trend over the five most recent records
///
/// `records` must be sorted newest first.
pub fn trend(records: &[SentimentRecord]) -> Trend {
    if records.len() < 2 {
        return Trend::NotEnoughData;
    }
    let window = &records[..records.len().min(TREND_WINDOW)];
    if window[0].score > window[window.len() - 1].score {
        Trend::Improving
    } else {
        Trend::Declining
    }
}

/// Full sentiment summary; `records` sorted newest first
pub fn stats(records: &[SentimentRecord]) -> Option<SentimentStats> {
    if records.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut highest = f64::MIN;
    let mut lowest = f64::MAX;
    for record in records {
        total += record.score;
        highest = highest.max(record.score);
        lowest = lowest.min(record.score);
    }

    Some(SentimentStats {
        average_score: total / records.len() as f64,
        highest_score: highest,
        lowest_score: lowest,
        dominant_emotion: dominant_emotion(&average_emotions(records)),
        trend: trend(records),
        record_count: records.len(),
    })
}
