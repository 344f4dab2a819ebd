//! Error types for solace-client
//!
//! Re-exports the shared taxonomy from solace-common so the capture
//! pipeline, gateways and services all speak one error language. Device
//! and decode failures reach the user verbatim as notifications; network
//! failures on fire-and-forget analysis calls are logged and dropped.

pub use solace_common::error::{Error, Result};

/// Map a reqwest error onto the shared taxonomy
pub(crate) fn from_reqwest(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Network(format!("request timed out: {}", err))
    } else if err.is_connect() {
        Error::Network(format!("analysis service unreachable: {}", err))
    } else {
        Error::Network(err.to_string())
    }
}
