//! Periodic webcam frame sampling
//!
//! While a capture session is active, grabs a JPEG frame from the frame
//! source on a fixed interval and submits it for video-emotion analysis.
//! Submissions are fire-and-forget: a failed send is logged and
//! broadcast, and the next tick is the retry. At most one frame is in
//! flight at a time; ticks that land while a submission is still running
//! are skipped rather than queued.

use crate::gateway::AnalysisGateway;
use crate::services::SessionState;
use crate::Result;
use async_trait::async_trait;
use solace_common::events::SolaceEvent;
use solace_common::time;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Supplies encoded webcam frames; the camera itself is owned by the
/// embedding application
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Capture one frame, JPEG-encoded
    async fn capture_jpeg(&self) -> Result<Vec<u8>>;
}

/// Samples frames on an interval while the capture session flag is set
pub struct FrameSampler {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl FrameSampler {
    /// Start sampling for `uid` every `interval`
    ///
    /// Ticks are silently skipped while the session's capture flag is
    /// clear, so the sampler can be started once and left running across
    /// recording sessions.
    pub fn start(
        source: Arc<dyn FrameSource>,
        analysis: Arc<dyn AnalysisGateway>,
        session: Arc<SessionState>,
        uid: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let uid = uid.into();
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // A late tick must not trigger a burst of catch-up frames
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let in_flight = Arc::new(AtomicBool::new(false));

            info!(uid = %uid, ?interval, "Frame sampler started");
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        info!(uid = %uid, "Frame sampler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !session.capture_session_active() {
                            continue;
                        }
                        if in_flight.swap(true, Ordering::SeqCst) {
                            debug!("Previous frame still in flight, skipping tick");
                            continue;
                        }
                        let source = Arc::clone(&source);
                        let analysis = Arc::clone(&analysis);
                        let session = Arc::clone(&session);
                        let in_flight = Arc::clone(&in_flight);
                        let uid = uid.clone();
                        tokio::spawn(async move {
                            sample_once(&*source, &*analysis, &session, &uid).await;
                            in_flight.store(false, Ordering::SeqCst);
                        });
                    }
                }
            }
        });

        FrameSampler {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    /// Stop sampling; idempotent
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        self.stop();
        self.task.abort();
    }
}

async fn sample_once(
    source: &dyn FrameSource,
    analysis: &dyn AnalysisGateway,
    session: &SessionState,
    uid: &str,
) {
    let jpeg = match source.capture_jpeg().await {
        Ok(jpeg) => jpeg,
        Err(e) => {
            warn!("Frame capture failed: {}", e);
            session.broadcast(SolaceEvent::FrameSampleFailed {
                reason: e.to_string(),
                timestamp: time::now(),
            });
            return;
        }
    };

    let bytes = jpeg.len();
    let assessment = session.assessment_active();
    match analysis.analyze_image(uid, assessment, jpeg).await {
        Ok(()) => {
            debug!(bytes, assessment, "Frame submitted for analysis");
            session.broadcast(SolaceEvent::FrameSampled {
                bytes,
                timestamp: time::now(),
            });
        }
        Err(e) => {
            warn!("Frame submission failed: {}", e);
            session.broadcast(SolaceEvent::FrameSampleFailed {
                reason: e.to_string(),
                timestamp: time::now(),
            });
        }
    }
}
