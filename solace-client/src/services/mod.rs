//! Domain services
//!
//! Each service is a narrowly-scoped object constructed once at
//! application start and handed explicit references to the gateways and
//! the shared session — no ambient lookup anywhere.

pub mod chat;
pub mod forum;
pub mod journal;
pub mod mood;
pub mod session;

pub use chat::ChatService;
pub use forum::ForumService;
pub use journal::JournalService;
pub use mood::MoodService;
pub use session::SessionState;
