//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: chat summary (`ChatSession`) and title derivation
//! - `message`: message types (`MessageType`, `Message`)
//! - `context`: the active-session pointer (`SessionContext`)
//! - `thread`: in-memory message log of the shown thread (`ThreadState`)
//! - `prune`: store hygiene applied on every read
//! - `grouping`: sidebar buckets by recency
//! - `location`: `chat=<id>` deep link
//! - `repository`: persistence trait (`SessionStore`)

mod context;
mod grouping;
mod location;
mod message;
mod model;
mod prune;
mod repository;
mod thread;

// Re-export public API
pub use context::{SessionContext, SessionTicket, SessionTrigger};
pub use grouping::{classify, group_sessions, DateGroup, SessionGroup};
pub use location::{ChatLocation, MemoryLocation, CHAT_PARAM};
pub use message::{Message, MessageType};
pub use model::{derive_title, session_id_at, ChatSession, DEFAULT_TITLE};
pub use prune::{prune_sessions, sort_newest_first};
pub use repository::SessionStore;
pub use thread::{PageCursor, ThreadState};
