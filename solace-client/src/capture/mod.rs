//! Audio capture pipeline
//!
//! Turns a held-button recording gesture into a standards-compliant
//! uncompressed waveform blob for the analysis gateway:
//!
//! `Idle -> RequestingDevice -> Recording -> Stopping -> Decoding ->
//! Encoding -> Idle (with result)`, with `Failed` reachable from every
//! step.
//!
//! The device handle is the one scoped resource here: it is released on
//! every exit path (success, user cancel, device error, teardown) via
//! [`device::DeviceGuard`], and a re-entrant start force-releases any
//! prior handle before acquiring a new one.

pub mod assessment;
pub mod decode;
pub mod device;
pub mod recorder;
pub mod wav;

pub use assessment::AssessmentSession;
pub use device::{CaptureConstraints, CaptureDevice, CpalDeviceProvider, DeviceProvider};
pub use recorder::{Recorder, WavClip};
pub use solace_common::events::CaptureState;
