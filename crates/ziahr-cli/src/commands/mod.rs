pub mod account;
pub mod chat;
pub mod sessions;
pub mod settings;
