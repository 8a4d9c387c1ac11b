//! Wires the layers together for one process.

use std::sync::Arc;
use ziahr_application::{
    AttachmentService, AuthService, ChatService, ReadAloud, SessionSynchronizer, SettingsService,
    SilentSpeech,
};
use ziahr_core::config::ClientConfig;
use ziahr_core::error::Result;
use ziahr_core::session::MemoryLocation;
use ziahr_core::storage::KeyValueStore;
use ziahr_infrastructure::{
    device_id, AtomicFile, ConfigService, FileStore, LocalSessionStore, ZiahrPaths,
};
use ziahr_interaction::HttpHrApi;

use crate::console::ConsoleNotifier;

pub struct App {
    pub paths: ZiahrPaths,
    pub config: ClientConfig,
    pub location: Arc<MemoryLocation>,
    pub chat: Arc<ChatService>,
    pub settings: SettingsService,
    pub auth: AuthService,
}

impl App {
    pub fn build(paths: ZiahrPaths, chat_param: Option<String>) -> Result<Self> {
        let config = ConfigService::new(AtomicFile::new(paths.config_file())).get_config()?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(paths.storage_dir()));
        let api = Arc::new(HttpHrApi::new(&config)?);
        let notifier = Arc::new(ConsoleNotifier::new());
        let location = Arc::new(match chat_param {
            Some(id) => MemoryLocation::with_chat(id),
            None => MemoryLocation::new(),
        });

        let auth = AuthService::new(api.clone(), storage.clone());
        auth.restore()?;

        let sync = Arc::new(SessionSynchronizer::new(
            Arc::new(LocalSessionStore::new(storage.clone())),
            api.clone(),
            location.clone(),
            notifier.clone(),
            storage.clone(),
            &config,
        ));
        let attachments = Arc::new(AttachmentService::new(
            api.clone(),
            notifier.clone(),
            &config,
        ));
        let chat = Arc::new(ChatService::new(
            sync,
            attachments,
            api,
            Arc::new(ReadAloud::new(Arc::new(SilentSpeech))),
            notifier,
            device_id(&storage)?,
            &config,
        ));

        tracing::debug!("[App] API root {}", config.api_root());

        Ok(Self {
            paths,
            config,
            location,
            chat,
            settings: SettingsService::new(storage),
            auth,
        })
    }
}
