//! Shared session state
//!
//! Long-lived capabilities every view needs: the signed-in identity, the
//! active-recording flags, and the event broadcaster. Constructed once
//! at startup and passed by `Arc` to whoever needs it.

use rand::Rng;
use solace_common::events::SolaceEvent;
use solace_common::model::UserProfile;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, RwLock};

use crate::{Error, Result};

/// Shared state accessible by all services
pub struct SessionState {
    /// Signed-in user (None when signed out)
    current_user: RwLock<Option<UserProfile>>,

    /// Webcam sampling session flag, read by the frame sampler
    capture_session_active: AtomicBool,

    /// Assessment questionnaire in progress
    assessment_active: AtomicBool,

    /// Event broadcaster for views
    event_tx: broadcast::Sender<SolaceEvent>,
}

impl SessionState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(128);
        Self {
            current_user: RwLock::new(None),
            capture_session_active: AtomicBool::new(false),
            assessment_active: AtomicBool::new(false),
            event_tx,
        }
    }

    /// Broadcast an event to all listeners
    pub fn broadcast(&self, event: SolaceEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<SolaceEvent> {
        self.event_tx.subscribe()
    }

    /// Event stream as a `Stream`, for consumers that select over it
    pub fn event_stream(&self) -> tokio_stream::wrappers::BroadcastStream<SolaceEvent> {
        tokio_stream::wrappers::BroadcastStream::new(self.event_tx.subscribe())
    }

    /// Clone of the broadcast sender for components that emit directly
    pub fn event_sender(&self) -> broadcast::Sender<SolaceEvent> {
        self.event_tx.clone()
    }

    pub async fn set_user(&self, user: Option<UserProfile>) {
        *self.current_user.write().await = user;
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.current_user.read().await.clone()
    }

    /// Signed-in user id, or a validation error telling the user to sign in
    pub async fn require_uid(&self) -> Result<String> {
        self.current_user
            .read()
            .await
            .as_ref()
            .map(|u| u.uid.clone())
            .ok_or_else(|| Error::Validation("you must be signed in".to_string()))
    }

    /// Signed-in profile, or a validation error
    pub async fn require_user(&self) -> Result<UserProfile> {
        self.current_user
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Validation("you must be signed in".to_string()))
    }

    pub fn set_capture_session_active(&self, active: bool) {
        self.capture_session_active.store(active, Ordering::SeqCst);
    }

    pub fn capture_session_active(&self) -> bool {
        self.capture_session_active.load(Ordering::SeqCst)
    }

    pub fn set_assessment_active(&self, active: bool) {
        self.assessment_active.store(active, Ordering::SeqCst);
    }

    pub fn assessment_active(&self) -> bool {
        self.assessment_active.load(Ordering::SeqCst)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback pseudonym for users without a stored one
pub fn default_pseudonym() -> String {
    format!("Anonymous{}", rand::thread_rng().gen_range(0..10_000))
}
