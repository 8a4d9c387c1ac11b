//! Login state under `auth_token` and `user_data`.

use std::sync::Arc;
use ziahr_core::api::UserProfile;
use ziahr_core::error::Result;
use ziahr_core::storage::{read_json, write_json, KeyValueStore, AUTH_TOKEN_KEY, USER_DATA_KEY};

#[derive(Clone)]
pub struct AuthStore {
    storage: Arc<dyn KeyValueStore>,
}

impl AuthStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Result<Option<String>> {
        read_json(self.storage.as_ref(), AUTH_TOKEN_KEY)
    }

    pub fn user(&self) -> Result<Option<UserProfile>> {
        read_json(self.storage.as_ref(), USER_DATA_KEY)
    }

    /// Stores both halves of a successful login.
    pub fn save(&self, token: &str, user: &UserProfile) -> Result<()> {
        write_json(self.storage.as_ref(), AUTH_TOKEN_KEY, token)?;
        write_json(self.storage.as_ref(), USER_DATA_KEY, user)
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove(AUTH_TOKEN_KEY)?;
        self.storage.remove(USER_DATA_KEY)
    }
}
