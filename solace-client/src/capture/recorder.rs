//! Capture state machine
//!
//! One recorder owns at most one device handle. Starting while a prior
//! handle is still held force-releases it first — overlapping
//! acquisitions are a documented failure source on some platforms — so
//! exactly one handle is live after any `start`.
//!
//! Errors reset the pipeline to `Failed` and surface as a notification;
//! the user retries the gesture. Nothing is retried automatically.

use crate::capture::device::{CaptureConstraints, DeviceGuard, DeviceProvider};
use crate::capture::{decode, wav};
use crate::{Error, Result};
use chrono::Utc;
use solace_common::events::{CaptureState, Severity, SolaceEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Interval at which buffered chunks are flushed out of the device
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// A finished, immutable waveform clip
#[derive(Debug, Clone)]
pub struct WavClip {
    /// Complete RIFF/WAVE file bytes
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Total interleaved sample count
    pub sample_count: usize,
}

/// Audio capture pipeline driver
pub struct Recorder {
    provider: Arc<dyn DeviceProvider>,
    constraints: CaptureConstraints,
    state: CaptureState,
    guard: Option<DeviceGuard>,
    /// Ordered encoded chunks buffered while recording
    chunks: Vec<Vec<u8>>,
    events: broadcast::Sender<SolaceEvent>,
}

impl Recorder {
    pub fn new(provider: Arc<dyn DeviceProvider>, events: broadcast::Sender<SolaceEvent>) -> Self {
        Recorder {
            provider,
            constraints: CaptureConstraints::default(),
            state: CaptureState::Idle,
            guard: None,
            chunks: Vec::new(),
            events,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Acquire the device and begin buffering
    ///
    /// Any previously held handle is force-released first (idempotent
    /// cleanup), leaving exactly one active handle on success and none
    /// on failure.
    pub async fn start(&mut self) -> Result<()> {
        if let Some(mut guard) = self.guard.take() {
            warn!("previous device handle still held; force-releasing");
            guard.release();
        }
        self.chunks.clear();

        self.set_state(CaptureState::RequestingDevice);
        let device = match self.provider.acquire(&self.constraints).await {
            Ok(device) => device,
            Err(e) => return Err(self.fail(e)),
        };

        let mut guard = DeviceGuard::new(device);
        if let Err(e) = guard.device()?.start() {
            // Guard drops here and releases the handle
            return Err(self.fail(e));
        }

        self.guard = Some(guard);
        self.set_state(CaptureState::Recording);
        debug!("recording started");
        Ok(())
    }

    /// Pull flushed chunks out of the device into the ordered buffer
    ///
    /// Call at [`FLUSH_INTERVAL`] while recording; `stop` drains whatever
    /// remains regardless.
    pub fn flush(&mut self) {
        if self.state != CaptureState::Recording {
            return;
        }
        if let Some(guard) = self.guard.as_mut() {
            if let Ok(device) = guard.device() {
                while let Some(chunk) = device.take_chunk() {
                    self.chunks.push(chunk);
                }
            }
        }
    }

    /// Stop, decode and encode; yields the finished clip
    ///
    /// The device handle is released on every path out of here.
    pub async fn stop(&mut self) -> Result<WavClip> {
        if self.state != CaptureState::Recording {
            return Err(Error::Internal(format!(
                "stop called in state {:?}",
                self.state
            )));
        }

        self.set_state(CaptureState::Stopping);
        self.flush_all();

        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| Error::Internal("recording without a device handle".to_string()))?;
        let tail = match guard.device()?.stop() {
            Ok(tail) => tail,
            Err(e) => {
                guard.release();
                return Err(self.fail(e));
            }
        };
        guard.release();

        // Concatenate the ordered chunk sequence into one encoded blob
        let mut blob: Vec<u8> = Vec::new();
        for chunk in self.chunks.drain(..) {
            blob.extend_from_slice(&chunk);
        }
        blob.extend_from_slice(&tail);

        self.set_state(CaptureState::Decoding);
        let decoded = match decode::decode_blob(blob) {
            Ok(decoded) => decoded,
            Err(e) => return Err(self.fail(e)),
        };

        self.set_state(CaptureState::Encoding);
        let bytes = wav::encode(&decoded.samples, decoded.channels, decoded.sample_rate);
        let clip = WavClip {
            bytes,
            sample_rate: decoded.sample_rate,
            channels: decoded.channels,
            sample_count: decoded.samples.len(),
        };

        self.set_state(CaptureState::Idle);
        info!(
            samples = clip.sample_count,
            sample_rate = clip.sample_rate,
            "capture complete"
        );
        Ok(clip)
    }

    /// Abandon an in-progress recording, releasing the device
    pub fn abort(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.release();
        }
        self.chunks.clear();
        if self.state != CaptureState::Idle {
            self.set_state(CaptureState::Idle);
        }
    }

    fn flush_all(&mut self) {
        if let Some(guard) = self.guard.as_mut() {
            if let Ok(device) = guard.device() {
                while let Some(chunk) = device.take_chunk() {
                    self.chunks.push(chunk);
                }
            }
        }
    }

    /// Record the failure, surface it, and leave the pipeline in `Failed`
    fn fail(&mut self, err: Error) -> Error {
        if let Some(mut guard) = self.guard.take() {
            guard.release();
        }
        self.chunks.clear();
        warn!("capture failed: {}", err);
        self.set_state(CaptureState::Failed);
        let _ = self
            .events
            .send(SolaceEvent::notify(Severity::Error, err.to_string()));
        err
    }

    fn set_state(&mut self, state: CaptureState) {
        self.state = state;
        let _ = self.events.send(SolaceEvent::CaptureStateChanged {
            state,
            timestamp: Utc::now(),
        });
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            guard.release();
        }
    }
}
