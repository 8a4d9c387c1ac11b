//! Storage primitives backing the client's key-value area.

pub mod atomic_file;
pub mod file_store;

pub use atomic_file::AtomicFile;
pub use file_store::FileStore;
