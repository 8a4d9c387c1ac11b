//! Login state of the user.

use std::sync::Arc;
use ziahr_core::api::{HrApi, LoginRequest, RegisterRequest, UserProfile};
use ziahr_core::error::{ApiErrorKind, Result, ZiahrError};
use ziahr_core::storage::KeyValueStore;
use ziahr_infrastructure::AuthStore;

/// Fields of the registration form.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub employee_id: String,
}

pub struct AuthService {
    api: Arc<dyn HrApi>,
    store: AuthStore,
}

impl AuthService {
    pub fn new(api: Arc<dyn HrApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store: AuthStore::new(storage),
        }
    }

    /// Hands a stored token to the API client. Returns the stored profile.
    pub fn restore(&self) -> Result<Option<UserProfile>> {
        let token = self.store.token()?;
        self.api.set_auth_token(token.as_deref());
        match token {
            Some(_) => self.store.user(),
            None => Ok(None),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ZiahrError::invalid_input("Email and password are required"));
        }

        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        match (response.success, response.token, response.user) {
            (true, Some(token), Some(user)) => {
                self.store.save(&token, &user)?;
                self.api.set_auth_token(Some(&token));
                tracing::info!("[AuthService] Logged in as {}", user.email);
                Ok(user)
            }
            _ => Err(ZiahrError::auth(
                response
                    .message
                    .unwrap_or_else(|| "Invalid email or password".to_string()),
            )),
        }
    }

    pub async fn register(&self, registration: &Registration) -> Result<String> {
        let fields = [
            ("Full name", &registration.full_name),
            ("Email", &registration.email),
            ("Password", &registration.password),
            ("Employee ID", &registration.employee_id),
        ];
        if let Some((label, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ZiahrError::invalid_input(format!("{} is required", label)));
        }
        if !is_email(registration.email.trim()) {
            return Err(ZiahrError::invalid_input("Please enter a valid email address"));
        }

        let response = self
            .api
            .register(&RegisterRequest {
                full_name: registration.full_name.trim().to_string(),
                email: registration.email.trim().to_string(),
                password: registration.password.clone(),
                employee_id: registration.employee_id.trim().to_string(),
            })
            .await?;

        let message = response
            .message
            .unwrap_or_else(|| "Registration complete".to_string());
        if response.success {
            Ok(message)
        } else {
            Err(ZiahrError::invalid_input(message))
        }
    }

    /// Clears the local login. The server call is best effort.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.api.logout().await {
            tracing::warn!("[AuthService] Server logout failed: {}", e);
        }
        self.api.set_auth_token(None);
        self.store.clear()
    }

    /// The logged-in user, checked against the server when reachable.
    ///
    /// A rejected token logs the user out; an unreachable server falls back
    /// to the stored profile.
    pub async fn current_user(&self) -> Result<Option<UserProfile>> {
        if self.store.token()?.is_none() {
            return Ok(None);
        }

        match self.api.current_user().await {
            Ok(response) if response.success => {
                if let (Some(user), Some(token)) = (&response.user, self.store.token()?) {
                    self.store.save(&token, user)?;
                }
                Ok(response.user)
            }
            Ok(_) => {
                self.store.clear()?;
                self.api.set_auth_token(None);
                Ok(None)
            }
            Err(e) if e.api_kind() == Some(ApiErrorKind::Authentication) => {
                tracing::info!("[AuthService] Stored token rejected, logging out");
                self.store.clear()?;
                self.api.set_auth_token(None);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("[AuthService] Could not verify user: {}", e);
                self.store.user()
            }
        }
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
