//! Infrastructure layer of the ZiaHR client.
//!
//! File-backed key-value storage, the session store over it, configuration
//! loading and path resolution.

pub mod auth_store;
pub mod config_service;
pub mod device;
pub mod local_session_store;
pub mod paths;
pub mod settings_repository;
pub mod storage;

pub use auth_store::AuthStore;
pub use config_service::ConfigService;
pub use device::device_id;
pub use local_session_store::LocalSessionStore;
pub use paths::ZiahrPaths;
pub use settings_repository::SettingsRepository;
pub use storage::{AtomicFile, FileStore};
