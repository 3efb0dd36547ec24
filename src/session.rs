/// Session persistence over a [`KeyValueStore`].
///
/// Reads never fail: an unavailable store or a malformed value reads as
/// absent, which leaves the caller unauthenticated.
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::PortalResult;
use crate::models::Role;
use crate::storage::KeyValueStore;

pub const SESSION_ID_KEY: &str = "sessionId";
pub const SESSION_START_KEY: &str = "sessionStartTime";
pub const USER_KEY: &str = "user";
pub const USER_ROLE_KEY: &str = "userRole";

const SESSION_PREFIX: &str = "SESSION_";
const RANDOM_PART_LENGTH: usize = 13;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Build a session id: `SESSION_<unixMillis>_<base36 chars>_<fingerprint token count>`.
///
/// Unique enough for one browser profile, not a secret.
pub fn generate_session_id(fingerprint: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_PART_LENGTH)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    let tokens = fingerprint.split(' ').count();
    format!("{SESSION_PREFIX}{timestamp}_{random}_{tokens}")
}

/// Check that a string has the shape produced by [`generate_session_id`].
pub fn is_well_formed_session_id(id: &str) -> bool {
    let Some(rest) = id.strip_prefix(SESSION_PREFIX) else {
        return false;
    };
    let parts: Vec<&str> = rest.split('_').collect();
    match parts.as_slice() {
        [millis, random, tokens] => {
            !millis.is_empty()
                && millis.chars().all(|c| c.is_ascii_digit())
                && !random.is_empty()
                && random.bytes().all(|b| BASE36.contains(&b))
                && !tokens.is_empty()
                && tokens.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

/// Reads and writes the persisted session keys.
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn storage(&self) -> &S {
        &self.store
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "storage read failed, treating value as absent");
                None
            }
        }
    }

    /// Persist the session id together with the current start time.
    pub async fn store_session_id(&self, session_id: &str) -> PortalResult<()> {
        self.store.set(SESSION_ID_KEY, session_id).await?;
        self.store
            .set(SESSION_START_KEY, &Utc::now().to_rfc3339())
            .await
    }

    pub async fn get_session_id(&self) -> Option<String> {
        self.read(SESSION_ID_KEY).await
    }

    pub async fn get_session_start_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.read(SESSION_START_KEY).await?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    /// True iff a non-empty session id is stored. Elapsed time is not checked.
    pub async fn is_session_valid(&self) -> bool {
        self.get_session_id()
            .await
            .is_some_and(|id| !id.is_empty())
    }

    /// Clear session id, start time, user and role in one store operation.
    pub async fn expire_session(&self) -> PortalResult<()> {
        self.store
            .remove_all(&[SESSION_ID_KEY, SESSION_START_KEY, USER_KEY, USER_ROLE_KEY])
            .await
    }

    pub async fn store_user_data<T: Serialize>(&self, user: &T) -> PortalResult<()> {
        let json = serde_json::to_string(user)?;
        self.store.set(USER_KEY, &json).await
    }

    /// The stored user, or `None` when absent or not valid JSON for `T`.
    pub async fn get_user_data<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.read(USER_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "stored user payload is malformed, ignoring it");
                None
            }
        }
    }

    pub async fn store_user_role(&self, role: Role) -> PortalResult<()> {
        self.store.set(USER_ROLE_KEY, role.name()).await
    }

    /// Stored role, falling back to [`Role::Patient`] when unset or unknown.
    pub async fn get_user_role(&self) -> Role {
        match self.read(USER_ROLE_KEY).await {
            Some(raw) if !raw.is_empty() => Role::from_string(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored role is unknown, defaulting to PATIENT");
                Role::Patient
            }),
            _ => Role::Patient,
        }
    }

    pub async fn log_session_activity(&self, action: &str) {
        let session_id = self.get_session_id().await;
        info!(
            action,
            session_id = session_id.as_deref().unwrap_or("none"),
            "session activity"
        );
    }
}
