//! Shared test doubles: an in-memory document store, a counting
//! analysis gateway, and a scripted capture device provider.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use solace_client::capture::{wav, CaptureConstraints, CaptureDevice, DeviceProvider};
use solace_client::gateway::{
    AnalysisGateway, DataGateway, DocPath, Document, Query, Snapshot, Subscription,
};
use solace_client::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// In-memory document store with push subscriptions
///
/// Mirrors the gateway contract the services rely on: `get_once` on a
/// document path yields a single-document snapshot, subscriptions
/// receive the full ordered set on every change, and `update` upserts
/// (the hosted store creates user documents out of band; tests don't).
#[derive(Default)]
pub struct MemoryGateway {
    store: Mutex<Store>,
    /// When set, writes fail with a network error (for failure-path tests)
    pub fail_writes: std::sync::atomic::AtomicBool,
}

#[derive(Default)]
struct Store {
    collections: HashMap<String, Vec<Document>>,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    path: String,
    query: Query,
    tx: mpsc::Sender<Snapshot>,
}

impl Store {
    fn snapshot(&self, path: &str, query: &Query) -> Snapshot {
        let mut docs = self.collections.get(path).cloned().unwrap_or_default();
        query.apply(&mut docs);
        docs
    }

    fn notify(&mut self, path: &str) {
        let mut live = Vec::new();
        for sub in self.subscribers.drain(..) {
            if sub.path == path {
                let mut docs = self
                    .collections
                    .get(path)
                    .cloned()
                    .unwrap_or_default();
                sub.query.apply(&mut docs);
                if sub.tx.try_send(docs).is_err() {
                    // Cancelled or lagged subscriber; drop it
                    continue;
                }
            }
            live.push(sub);
        }
        self.subscribers = live;
    }
}

/// Split `forum/d1` into (`forum`, `d1`)
fn split_doc_path(path: &str) -> Result<(String, String)> {
    match path.rsplit_once('/') {
        Some((collection, id)) => Ok((collection.to_string(), id.to_string())),
        None => Err(Error::Validation(format!("not a document path: {}", path))),
    }
}

impl MemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryGateway::default())
    }

    /// Seed a document with a fixed id, bypassing notification
    pub fn seed(&self, path: &DocPath, id: &str, fields: Value) {
        let mut store = self.store.lock().unwrap();
        store
            .collections
            .entry(path.as_str().to_string())
            .or_default()
            .push(Document::new(id, fields));
    }

    pub fn doc_count(&self, path: &DocPath) -> usize {
        self.store
            .lock()
            .unwrap()
            .collections
            .get(path.as_str())
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn document(&self, path: &DocPath, id: &str) -> Option<Document> {
        self.store
            .lock()
            .unwrap()
            .collections
            .get(path.as_str())
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn subscribe(&self, path: &DocPath, query: Query) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(64);
        let (cancel_tx, _cancel_rx) = oneshot::channel();

        let mut store = self.store.lock().unwrap();
        let initial = store.snapshot(path.as_str(), &query);
        let _ = tx.try_send(initial);
        store.subscribers.push(Subscriber {
            path: path.as_str().to_string(),
            query,
            tx,
        });
        Ok(Subscription::new(rx, cancel_tx))
    }

    async fn get_once(&self, path: &DocPath, query: Query) -> Result<Snapshot> {
        let store = self.store.lock().unwrap();
        if store.collections.contains_key(path.as_str()) {
            return Ok(store.snapshot(path.as_str(), &query));
        }
        // Maybe a document path
        let (collection, id) = match split_doc_path(path.as_str()) {
            Ok(parts) => parts,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(store
            .collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|d| d.id == id)
            .cloned()
            .collect())
    }

    async fn add(&self, path: &DocPath, fields: Value) -> Result<String> {
        let mut store = self.store.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        store
            .collections
            .entry(path.as_str().to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        store.notify(path.as_str());
        Ok(id)
    }

    async fn update(&self, doc_path: &DocPath, fields: Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Network("store unreachable".to_string()));
        }
        let (collection, id) = split_doc_path(doc_path.as_str())?;
        let mut store = self.store.lock().unwrap();
        let docs = store.collections.entry(collection.clone()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => merge(&mut doc.fields, fields),
            None => docs.push(Document::new(id, fields)),
        }
        store.notify(&collection);
        Ok(())
    }

    async fn delete(&self, doc_path: &DocPath) -> Result<()> {
        let (collection, id) = split_doc_path(doc_path.as_str())?;
        let mut store = self.store.lock().unwrap();
        if let Some(docs) = store.collections.get_mut(&collection) {
            docs.retain(|d| d.id != id);
        }
        store.notify(&collection);
        Ok(())
    }
}

fn merge(target: &mut Value, updates: Value) {
    match (target, updates) {
        (Value::Object(target), Value::Object(updates)) => {
            for (key, value) in updates {
                target.insert(key, value);
            }
        }
        (target, updates) => *target = updates,
    }
}

/// Records every analysis request; responses are scripted per method
#[derive(Default)]
pub struct MockAnalysis {
    pub posts: Mutex<Vec<(String, String)>>,
    pub notes: Mutex<Vec<(String, String)>>,
    pub audio: Mutex<Vec<(String, bool, usize)>>,
    pub images: Mutex<Vec<(String, bool, usize)>>,
    pub reflect_reply: Mutex<Option<String>>,
}

impl MockAnalysis {
    pub fn new() -> Arc<Self> {
        Arc::new(MockAnalysis::default())
    }

    pub fn with_reply(reply: &str) -> Arc<Self> {
        let mock = MockAnalysis::default();
        *mock.reflect_reply.lock().unwrap() = Some(reply.to_string());
        Arc::new(mock)
    }
}

#[async_trait]
impl AnalysisGateway for MockAnalysis {
    async fn analyze_post(&self, post_id: &str, room_id: &str) -> Result<()> {
        self.posts
            .lock()
            .unwrap()
            .push((post_id.to_string(), room_id.to_string()));
        Ok(())
    }

    async fn analyze_note(&self, user_id: &str, note_id: &str) -> Result<()> {
        self.notes
            .lock()
            .unwrap()
            .push((user_id.to_string(), note_id.to_string()));
        Ok(())
    }

    async fn analyze_audio(&self, user_id: &str, assessment: bool, wav: Vec<u8>) -> Result<()> {
        self.audio
            .lock()
            .unwrap()
            .push((user_id.to_string(), assessment, wav.len()));
        Ok(())
    }

    async fn analyze_image(&self, user_id: &str, assessment: bool, jpeg: Vec<u8>) -> Result<()> {
        self.images
            .lock()
            .unwrap()
            .push((user_id.to_string(), assessment, jpeg.len()));
        Ok(())
    }

    async fn reflect(&self, _prompt: &str, _user_id: &str) -> Result<String> {
        match self.reflect_reply.lock().unwrap().clone() {
            Some(reply) => Ok(reply),
            None => Err(Error::Network("reflect unavailable".to_string())),
        }
    }
}

/// Device provider that counts outstanding handles and plays back a
/// fixed encoded clip
pub struct CountingProvider {
    pub acquired: AtomicUsize,
    pub outstanding: Arc<AtomicUsize>,
    blob: Vec<u8>,
}

impl CountingProvider {
    pub fn new() -> Arc<Self> {
        let samples: Vec<f32> = (0..4410).map(|i| (i as f32 * 0.03).sin() * 0.5).collect();
        Arc::new(CountingProvider {
            acquired: AtomicUsize::new(0),
            outstanding: Arc::new(AtomicUsize::new(0)),
            blob: wav::encode(&samples, 1, 44_100),
        })
    }

    pub fn outstanding_handles(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceProvider for CountingProvider {
    async fn acquire(&self, _constraints: &CaptureConstraints) -> Result<Box<dyn CaptureDevice>> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(PlaybackDevice {
            blob: self.blob.clone(),
            released: false,
            outstanding: Arc::clone(&self.outstanding),
        }))
    }
}

struct PlaybackDevice {
    blob: Vec<u8>,
    released: bool,
    outstanding: Arc<AtomicUsize>,
}

impl CaptureDevice for PlaybackDevice {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn take_chunk(&mut self) -> Option<Vec<u8>> {
        if self.blob.len() > 64 {
            let chunk: Vec<u8> = self.blob.drain(..64).collect();
            Some(chunk)
        } else {
            None
        }
    }

    fn stop(&mut self) -> Result<Vec<u8>> {
        Ok(std::mem::take(&mut self.blob))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Signed-in session with a plain (non-anonymous) profile
pub async fn signed_in(uid: &str, name: &str) -> Arc<solace_client::SessionState> {
    use solace_common::model::{Demographics, UserProfile};
    let session = Arc::new(solace_client::SessionState::new());
    session
        .set_user(Some(UserProfile {
            uid: uid.to_string(),
            display_name: name.to_string(),
            photo_url: Some("https://example.com/avatar.png".to_string()),
            is_anonymous: false,
            anonymous_name: String::new(),
            demographics: Demographics::default(),
            created_at: chrono::Utc::now(),
        }))
        .await;
    session
}
