/// Authentication context: who is signed in, backed by the session store.
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::error::{PortalError, PortalResult};
use crate::models::{Role, UserRecord};
use crate::session::{generate_session_id, SessionStore};
use crate::storage::KeyValueStore;

/// Lifecycle of the authentication context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// The stored session has not been checked yet.
    Initializing,
    Unauthenticated,
    Authenticated,
}

/// Snapshot returned by [`AuthContext::session_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: Option<String>,
    pub is_authenticated: bool,
    pub user: Option<UserRecord>,
    pub user_role: Role,
    /// Read from storage at snapshot time.
    pub is_valid: bool,
    pub started_at: Option<DateTime<Utc>>,
}

/// A demo account accepted by [`AuthContext::sign_in`].
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
}

/// Fixed set of accounts the portal accepts.
///
/// Passwords are compared in plain text; this is a demo gate, not security.
#[derive(Debug, Clone, Default)]
pub struct CredentialDirectory {
    accounts: Vec<Credential>,
}

impl CredentialDirectory {
    pub fn new(accounts: Vec<Credential>) -> Self {
        Self { accounts }
    }

    /// The patient and doctor demo accounts.
    pub fn demo() -> Self {
        Self::new(vec![
            Credential {
                username: "admin".into(),
                password: "admin123".into(),
                role: Role::Patient,
                display_name: "John Patient".into(),
            },
            Credential {
                username: "doctor".into(),
                password: "doctor123".into(),
                role: Role::Doctor,
                display_name: "Dr. Sarah Williams".into(),
            },
        ])
    }

    pub fn verify(&self, username: &str, password: &str) -> Option<&Credential> {
        self.accounts
            .iter()
            .find(|c| c.username == username && c.password == password)
    }
}

/// Single source of truth for the signed-in user.
pub struct AuthContext<S> {
    sessions: SessionStore<S>,
    fingerprint: String,
    state: AuthState,
    session_id: Option<String>,
    user: Option<UserRecord>,
    user_role: Role,
}

impl<S: KeyValueStore> AuthContext<S> {
    pub fn new(store: S, config: &PortalConfig) -> Self {
        Self {
            sessions: SessionStore::new(store),
            fingerprint: config.client_fingerprint.clone(),
            state: AuthState::Initializing,
            session_id: None,
            user: None,
            user_role: Role::Patient,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Initializing
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn user_role(&self) -> Role {
        self.user_role
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    /// Hydrate from the stored session. Only the first call reads storage.
    pub async fn restore(&mut self) -> AuthState {
        if self.state != AuthState::Initializing {
            return self.state;
        }

        let stored_id = self.sessions.get_session_id().await;
        let valid = self.sessions.is_session_valid().await;
        match stored_id {
            Some(id) if !id.is_empty() && valid => {
                self.user = self.sessions.get_user_data().await;
                self.user_role = self.sessions.get_user_role().await;
                self.session_id = Some(id);
                self.state = AuthState::Authenticated;
                self.sessions.log_session_activity("Session Restored").await;
            }
            _ => {
                self.state = AuthState::Unauthenticated;
            }
        }
        self.state
    }

    /// Start a new session for `user`, replacing any current one.
    ///
    /// If persisting fails the partial session is cleared and the context
    /// stays signed out.
    pub async fn login(&mut self, user: UserRecord, role: Role) -> PortalResult<String> {
        let session_id = generate_session_id(&self.fingerprint);

        if let Err(e) = self.persist(&session_id, &user, role).await {
            warn!(error = %e, "failed to persist session, rolling back");
            if let Err(cleanup) = self.sessions.expire_session().await {
                warn!(error = %cleanup, "failed to clear partial session");
            }
            self.clear();
            return Err(e);
        }

        let name = if user.name.is_empty() { "Unknown" } else { user.name.as_str() };
        self.sessions
            .log_session_activity(&format!("Login - User: {name}"))
            .await;

        self.session_id = Some(session_id.clone());
        self.user = Some(user);
        self.user_role = role;
        self.state = AuthState::Authenticated;
        Ok(session_id)
    }

    async fn persist(&self, session_id: &str, user: &UserRecord, role: Role) -> PortalResult<()> {
        self.sessions.store_session_id(session_id).await?;
        self.sessions.store_user_data(user).await?;
        self.sessions.store_user_role(role).await
    }

    /// Check `username`/`password` against `accounts` and log the match in.
    pub async fn sign_in(
        &mut self,
        accounts: &CredentialDirectory,
        username: &str,
        password: &str,
    ) -> PortalResult<String> {
        let account = accounts
            .verify(username, password)
            .ok_or(PortalError::InvalidCredentials)?;

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: account.display_name.clone(),
            email: format!("{}@hellodoc.com", account.username),
            role: account.role,
            login_time: Some(Utc::now()),
        };
        let role = account.role;
        let session_id = self.login(user, role).await?;
        info!(username, role = %role, "sign-in succeeded");
        Ok(session_id)
    }

    /// End the session. In-memory state is reset even if storage fails.
    pub async fn logout(&mut self) -> PortalResult<()> {
        let current = self.sessions.get_session_id().await;
        self.sessions
            .log_session_activity(&format!(
                "Logout - SessionID: {}",
                current.as_deref().unwrap_or("none")
            ))
            .await;

        let result = self.sessions.expire_session().await;
        self.clear();
        result
    }

    fn clear(&mut self) {
        self.session_id = None;
        self.user = None;
        self.user_role = Role::Patient;
        self.state = AuthState::Unauthenticated;
    }

    pub async fn session_info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            is_authenticated: self.is_authenticated(),
            user: self.user.clone(),
            user_role: self.user_role,
            is_valid: self.sessions.is_session_valid().await,
            started_at: self.sessions.get_session_start_time().await,
        }
    }
}
