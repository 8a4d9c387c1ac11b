//! Session synchronization.
//!
//! - `synchronizer`: keeps the active session, the shown thread, the local
//!   store and the deep link consistent

mod synchronizer;


pub use synchronizer::{BootstrapOutcome, LoadOutcome, PageFetch, SessionSynchronizer};
