//! Capture device acquisition and the scoped release guard
//!
//! The microphone handle is exclusively owned: at most one live device at
//! a time, release guaranteed on every exit path. Ownership is expressed
//! through [`DeviceGuard`] (release on drop) rather than cleanup calls at
//! each exit site.
//!
//! `CpalDeviceProvider` is the real implementation; tests substitute a
//! counting mock through the [`DeviceProvider`] trait.

use crate::capture::wav;
use crate::{Error, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{traits::*, HeapCons, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed capture constraints requested from the device
///
/// Echo cancellation, noise suppression and automatic gain are advisory;
/// platforms that process input upstream of the application honor them,
/// others ignore them.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    pub channels: u16,
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

/// An acquired, exclusive capture device
///
/// Emits one encoded stream: the first chunk carries the container
/// header, later chunks raw sample data. Concatenating every chunk (plus
/// the bytes returned by `stop`) yields a blob the decode stage accepts.
pub trait CaptureDevice: Send {
    /// Begin buffering samples
    fn start(&mut self) -> Result<()>;

    /// Next flushed chunk of the encoded stream, if any
    fn take_chunk(&mut self) -> Option<Vec<u8>>;

    /// Stop capturing; returns the remaining tail of the encoded stream
    fn stop(&mut self) -> Result<Vec<u8>>;

    /// Release the underlying hardware handle; idempotent
    fn release(&mut self);
}

/// Source of capture devices
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<Box<dyn CaptureDevice>>;
}

/// Scoped ownership of a capture device
///
/// Releasing twice is harmless; dropping without releasing is impossible.
pub struct DeviceGuard {
    device: Option<Box<dyn CaptureDevice>>,
}

impl DeviceGuard {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        DeviceGuard {
            device: Some(device),
        }
    }

    /// Access the held device; `Err` if already released
    pub fn device(&mut self) -> Result<&mut Box<dyn CaptureDevice>> {
        self.device
            .as_mut()
            .ok_or_else(|| Error::Internal("capture device already released".to_string()))
    }

    /// Release the device now instead of at drop
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
        }
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Microphone provider backed by cpal
pub struct CpalDeviceProvider;

#[async_trait]
impl DeviceProvider for CpalDeviceProvider {
    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<Box<dyn CaptureDevice>> {
        let constraints = constraints.clone();
        // cpal device negotiation can block on platform audio services
        let device = tokio::task::spawn_blocking(move || CpalCaptureDevice::open(constraints))
            .await
            .map_err(|e| Error::Internal(format!("device acquisition task failed: {}", e)))??;
        Ok(Box::new(device))
    }
}

/// Microphone capture via a cpal input stream
///
/// The stream lives on a dedicated thread (cpal streams are not Send);
/// the audio callback pushes samples into a lock-free ring the device
/// side drains into encoded chunks.
pub struct CpalCaptureDevice {
    consumer: HeapCons<f32>,
    running: Arc<AtomicBool>,
    capturing: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
    header_sent: bool,
    sample_rate: u32,
    channels: u16,
}

impl CpalCaptureDevice {
    fn open(constraints: CaptureConstraints) -> Result<Self> {
        // Room for several flush intervals of backlog
        let ring = HeapRb::<f32>::new(constraints.sample_rate as usize * 4);
        let (mut producer, consumer) = ring.split();

        let running = Arc::new(AtomicBool::new(true));
        let capturing = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(u32, u16)>>();

        let worker_running = running.clone();
        let worker_capturing = capturing.clone();
        let worker = std::thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(device) => device,
                None => {
                    let _ = ready_tx.send(Err(Error::DeviceUnavailable));
                    return;
                }
            };

            let config = cpal::StreamConfig {
                channels: constraints.channels,
                sample_rate: cpal::SampleRate(constraints.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let capturing = worker_capturing;
            let stream = device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if capturing.load(Ordering::Relaxed) {
                        // Overflow drops samples rather than blocking the callback
                        for &sample in data {
                            let _ = producer.try_push(sample);
                        }
                    }
                },
                |err| warn!("input stream error: {}", err),
                None,
            );

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(map_build_error(e)));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(Error::Internal(format!(
                    "failed to start input stream: {}",
                    e
                ))));
                return;
            }

            let _ = ready_tx.send(Ok((config.sample_rate.0, config.channels)));

            // Keep the stream alive until released
            while worker_running.load(Ordering::Relaxed) {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
            drop(stream);
        });

        let (sample_rate, channels) = ready_rx
            .recv()
            .map_err(|_| Error::DeviceUnavailable)??;

        debug!(sample_rate, channels, "acquired input device");

        Ok(CpalCaptureDevice {
            consumer,
            running,
            capturing,
            worker: Some(worker),
            header_sent: false,
            sample_rate,
            channels,
        })
    }

    fn drain_samples(&mut self) -> Vec<u8> {
        let mut buf = [0f32; 4096];
        let mut bytes = Vec::new();
        loop {
            let read = self.consumer.pop_slice(&mut buf);
            if read == 0 {
                break;
            }
            for &sample in &buf[..read] {
                let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn start(&mut self) -> Result<()> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(Error::Internal("capture device already released".to_string()));
        }
        self.capturing.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn take_chunk(&mut self) -> Option<Vec<u8>> {
        if !self.header_sent {
            self.header_sent = true;
            return Some(wav::streaming_header(self.channels, self.sample_rate));
        }
        let bytes = self.drain_samples();
        if bytes.is_empty() {
            None
        } else {
            Some(bytes)
        }
    }

    fn stop(&mut self) -> Result<Vec<u8>> {
        self.capturing.store(false, Ordering::Relaxed);
        let mut tail = if self.header_sent {
            Vec::new()
        } else {
            self.header_sent = true;
            wav::streaming_header(self.channels, self.sample_rate)
        };
        tail.extend_from_slice(&self.drain_samples());
        Ok(tail)
    }

    fn release(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.capturing.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            debug!("input device released");
        }
    }
}

impl Drop for CpalCaptureDevice {
    fn drop(&mut self) {
        self.release();
    }
}

/// Map cpal stream-construction failures onto the shared taxonomy
fn map_build_error(err: cpal::BuildStreamError) -> Error {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => Error::DeviceUnavailable,
        cpal::BuildStreamError::StreamConfigNotSupported => Error::DeviceUnavailable,
        cpal::BuildStreamError::BackendSpecific { err } => {
            let msg = err.to_string().to_lowercase();
            if msg.contains("denied") || msg.contains("permission") {
                Error::PermissionDenied
            } else if msg.contains("busy") || msg.contains("in use") {
                Error::DeviceBusy
            } else {
                Error::Internal(err.to_string())
            }
        }
        other => Error::Internal(other.to_string()),
    }
}
