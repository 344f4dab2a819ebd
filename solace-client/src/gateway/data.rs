//! Data-access interface to the remote document store
//!
//! The store holds hierarchically-pathed collections of JSON documents
//! and pushes ordered change notifications per subscription. This module
//! defines the interface the rest of the client consumes; concrete
//! transports are supplied by the embedding application (tests use an
//! in-memory implementation).
//!
//! Ordering: snapshots for one subscription arrive in the order the data
//! changed. Nothing is guaranteed across independent subscriptions.
//!
//! Every subscription must be cancelled when its owner goes away;
//! dropping the handle cancels implicitly so a forgotten unsubscribe
//! cannot leak a live callback registration.

use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Sort direction for query ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering and filtering applied to a collection read or subscription
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Order results by this field
    pub order_by: Option<(String, Direction)>,
    /// Keep only documents whose field is at or after this timestamp
    pub since: Option<(String, DateTime<Utc>)>,
    /// Truncate results after ordering
    pub limit: Option<usize>,
}

impl Query {
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn since(mut self, field: impl Into<String>, cutoff: DateTime<Utc>) -> Self {
        self.since = Some((field.into(), cutoff));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply this query's filter, ordering and limit to a document set
    ///
    /// Shared by gateway implementations so every transport agrees on
    /// the comparison rules: numbers numerically, strings
    /// lexicographically (RFC 3339 timestamps order chronologically this
    /// way), arrays by length, missing fields last.
    pub fn apply(&self, docs: &mut Vec<Document>) {
        if let Some((field, cutoff)) = &self.since {
            docs.retain(|doc| {
                field_timestamp(&doc.fields, field)
                    .map(|ts| ts >= *cutoff)
                    .unwrap_or(false)
            });
        }

        if let Some((field, direction)) = &self.order_by {
            docs.sort_by(|a, b| {
                let ord = compare_fields(a.fields.get(field), b.fields.get(field));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
    }
}

fn field_timestamp(fields: &Value, field: &str) -> Option<DateTime<Utc>> {
    fields
        .get(field)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Hierarchical document/collection path, e.g. `users/{uid}/moods`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn collection(path: impl Into<String>) -> Self {
        DocPath(path.into())
    }

    /// Path to a single document within this collection
    pub fn doc(&self, id: &str) -> DocPath {
        DocPath(format!("{}/{}", self.0, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Known collections, scoped per owner where private.

    pub fn journal(uid: &str) -> Self {
        DocPath(format!("users/{}/journal", uid))
    }

    pub fn moods(uid: &str) -> Self {
        DocPath(format!("users/{}/moods", uid))
    }

    pub fn sentiments(uid: &str) -> Self {
        DocPath(format!("users/{}/sentiments", uid))
    }

    /// Assessment-flow sentiment results, kept apart from free-form ones
    pub fn assessment_sentiments(uid: &str) -> Self {
        DocPath(format!("users/{}/q_sentiments", uid))
    }

    pub fn chat_history(uid: &str) -> Self {
        DocPath(format!("users/{}/chat", uid))
    }

    pub fn users() -> Self {
        DocPath("users".to_string())
    }

    pub fn forum() -> Self {
        DocPath("forum".to_string())
    }

    pub fn forum_messages(discussion_id: &str) -> Self {
        DocPath(format!("forum/{}/messages", discussion_id))
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document as returned by the store: id plus JSON fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Document {
            id: id.into(),
            fields,
        }
    }

    /// Deserialize the fields into a typed record
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.fields.clone())
            .map_err(|e| Error::Internal(format!("malformed document {}: {}", self.id, e)))
    }
}

/// Full ordered document set delivered on every remote change
pub type Snapshot = Vec<Document>;

/// Live query handle
///
/// Yields a fresh snapshot whenever the underlying data changes, until
/// cancelled. `cancel` is explicit and idempotent; dropping the handle
/// has the same effect.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<Snapshot>, cancel_tx: oneshot::Sender<()>) -> Self {
        Subscription {
            rx,
            cancel_tx: Some(cancel_tx),
        }
    }

    /// Wait for the next snapshot; `None` once cancelled or the source
    /// side shut down
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// Stop receiving change notifications
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            // Receiver may already be gone; nothing to clean up then
            let _ = tx.send(());
        }
        self.rx.close();
    }

    /// Consume the handle as a snapshot stream; ends when cancelled
    pub fn into_stream(mut self) -> impl futures::Stream<Item = Snapshot> {
        async_stream::stream! {
            while let Some(snapshot) = self.next().await {
                yield snapshot;
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Operations the remote document store must provide
///
/// Not implemented in this crate against any real backend; the hosted
/// store and its realtime transport are external collaborators.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Live query: snapshots until unsubscribed
    async fn subscribe(&self, path: &DocPath, query: Query) -> Result<Subscription>;

    /// One-shot snapshot
    async fn get_once(&self, path: &DocPath, query: Query) -> Result<Snapshot>;

    /// Create a document; returns its new id
    async fn add(&self, path: &DocPath, fields: Value) -> Result<String>;

    /// Merge partial fields into an existing document
    async fn update(&self, doc_path: &DocPath, fields: Value) -> Result<()>;

    /// Remove a document
    async fn delete(&self, doc_path: &DocPath) -> Result<()>;
}
