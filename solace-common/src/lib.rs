//! # Solace Common Library
//!
//! Shared code for the Solace client core including:
//! - Domain model types (moods, journal entries, sentiment records, forum)
//! - Event types (SolaceEvent enum)
//! - Error taxonomy
//! - Configuration loading
//! - Calendar/time utilities

pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod time;

pub use error::{Error, Result};
pub use events::SolaceEvent;
