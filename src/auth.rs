// Auth session over the backend API and key-value store
// The token and user are cached under the "token" / "user" keys so a new
// session restores the signed-in state without a network round trip

use parking_lot::Mutex;
use std::sync::Arc;

use crate::api::BackendApi;
use crate::models::User;
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};

// Login/register report success or a display message instead of erroring;
// failures here are an expected part of the flow, not exceptional
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl AuthOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone)]
struct Credentials {
    user: User,
    token: String,
}

pub struct AuthSession {
    api: Arc<dyn BackendApi>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<Option<Credentials>>,
}

impl AuthSession {
    // Restores a previously persisted session when both keys are present;
    // an unreadable cached user is treated as signed out
    pub fn new(api: Arc<dyn BackendApi>, store: Arc<dyn KeyValueStore>) -> Self {
        let state = match (store.get(TOKEN_KEY), store.get(USER_KEY)) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => Some(Credentials { user, token }),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable cached user");
                    store.remove(TOKEN_KEY);
                    store.remove(USER_KEY);
                    None
                }
            },
            _ => None,
        };

        Self {
            api,
            store,
            state: Mutex::new(state),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.lock().as_ref().map(|c| c.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state.lock().as_ref().map(|c| c.token.clone())
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        match self.api.login(email, password).await {
            Ok(payload) => {
                tracing::info!(email, "login succeeded");
                self.persist(payload.user, payload.token);
                AuthOutcome::ok()
            }
            Err(e) => {
                tracing::warn!(email, error = %e, "login failed");
                AuthOutcome::failed(e.to_string())
            }
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthOutcome {
        match self.api.register(name, email, password).await {
            Ok(payload) => {
                tracing::info!(email, "registration succeeded");
                self.persist(payload.user, payload.token);
                AuthOutcome::ok()
            }
            Err(e) => {
                tracing::warn!(email, error = %e, "registration failed");
                AuthOutcome::failed(e.to_string())
            }
        }
    }

    pub fn logout(&self) {
        *self.state.lock() = None;
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
        tracing::info!("signed out");
    }

    // Revalidate the cached token against the backend; a rejected token
    // clears the session
    pub async fn check_auth(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        match self.api.me().await {
            Ok(user) => {
                if let Some(credentials) = self.state.lock().as_mut() {
                    credentials.user = user;
                }
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored token rejected, signing out");
                self.logout();
                false
            }
        }
    }

    fn persist(&self, user: User, token: String) {
        self.store.set(TOKEN_KEY, &token);
        match serde_json::to_string(&user) {
            Ok(json) => self.store.set(USER_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "failed to cache user"),
        }
        *self.state.lock() = Some(Credentials { user, token });
    }
}
