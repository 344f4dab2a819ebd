//! Tracing initialization
//!
//! Hosts embed the client core, so initialization is a helper rather
//! than something done in a main(). Safe to call more than once.

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing with env-filter support
///
/// Falls back to `solace_client=debug` when `RUST_LOG` is unset.
pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "solace_client=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
