//! # Solace Client Core (solace-client)
//!
//! Client core for the Solace peer-support platform.
//!
//! **Purpose:** Wrap the remote document store and the sentiment analysis
//! service behind typed gateways, run the audio capture pipeline and
//! periodic webcam frame sampler, and keep live aggregate statistics
//! (mood streaks, weekly averages, dominant emotions) current as the
//! underlying collections change.
//!
//! **Architecture:** Single-process async client. Durable state lives in
//! the remote store; everything here is a subscription, a transform, or a
//! request. Views consume the services plus a broadcast event stream.

pub mod aggregate;
pub mod capture;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod sampler;
pub mod services;

pub use error::{Error, Result};
pub use services::session::SessionState;
