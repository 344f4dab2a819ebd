//! Live aggregation over the in-memory store

mod helpers;

use helpers::{signed_in, MemoryGateway};
use serde_json::json;
use solace_client::aggregate::{MoodWatcher, SentimentWatcher};
use solace_client::gateway::DocPath;
use solace_client::services::mood::MoodService;
use solace_common::events::Trend;
use solace_common::model::MoodLabel;
use solace_common::time;
use std::sync::Arc;
use std::time::Duration;

async fn next_stats<T>(changed: impl std::future::Future<Output = Option<T>>) -> T {
    tokio::time::timeout(Duration::from_secs(2), changed)
        .await
        .expect("stats within deadline")
        .expect("watcher alive")
}

#[tokio::test]
async fn test_mood_watcher_follows_recorded_moods() {
    let data = MemoryGateway::new();
    let session = signed_in("u1", "Dana").await;
    let moods = MoodService::new(Arc::clone(&data) as _, Arc::clone(&session));

    let mut watcher = MoodWatcher::spawn(
        Arc::clone(&data) as _,
        "u1",
        session.event_sender(),
    )
    .await
    .unwrap();

    // Initial snapshot: nothing recorded yet
    let stats = next_stats(watcher.changed()).await;
    assert_eq!(stats.tracking_streak, 0);
    assert_eq!(stats.weekly_average, None);
    assert_eq!(stats.trend, Trend::NotEnoughData);

    moods.record_mood(MoodLabel::Happy).await.unwrap();
    let stats = next_stats(watcher.changed()).await;
    assert_eq!(stats.tracking_streak, 1);
    assert_eq!(stats.weekly_average, Some(5.0));

    moods.record_mood(MoodLabel::Neutral).await.unwrap();
    let stats = next_stats(watcher.changed()).await;
    // Same calendar day: streak still 1, average over both entries
    assert_eq!(stats.tracking_streak, 1);
    assert_eq!(stats.weekly_average, Some(4.0));

    watcher.stop();
}

#[tokio::test]
async fn test_needs_mood_today_flips_after_recording() {
    let data = MemoryGateway::new();
    let session = signed_in("u1", "Dana").await;
    let moods = MoodService::new(Arc::clone(&data) as _, session);

    assert!(moods.needs_mood_today().await.unwrap());
    moods.record_mood(MoodLabel::Calm).await.unwrap();
    assert!(!moods.needs_mood_today().await.unwrap());
}

#[tokio::test]
async fn test_sentiment_watcher_reports_dominant_emotion() {
    let data = MemoryGateway::new();
    let session = signed_in("u1", "Dana").await;

    let path = DocPath::sentiments("u1");
    data.seed(
        &path,
        "s1",
        json!({
            "uid": "u1",
            "type": "note",
            "score": 0.55,
            "emotions": {"joy": 0.2, "sadness": 0.7, "anger": 0.1},
            "createdAt": time::now().to_rfc3339(),
        }),
    );

    let mut watcher = SentimentWatcher::spawn(
        Arc::clone(&data) as _,
        "u1",
        session.event_sender(),
    )
    .await
    .unwrap();

    let stats = next_stats(watcher.changed()).await;
    assert_eq!(stats.record_count, 1);
    assert_eq!(stats.dominant_emotion, "sadness");
    assert_eq!(stats.average_score, 0.55);
    assert_eq!(stats.trend, Trend::NotEnoughData);

    watcher.stop();
}

#[tokio::test]
async fn test_mood_history_subscription_cancel() {
    let data = MemoryGateway::new();
    let session = signed_in("u1", "Dana").await;
    let moods = MoodService::new(Arc::clone(&data) as _, session);

    let mut sub = moods.history().await.unwrap();
    assert!(sub.next().await.unwrap().is_empty());

    sub.cancel();
    moods.record_mood(MoodLabel::Sad).await.unwrap();
    assert!(sub.next().await.is_none());
}
