use super::slot::{MemorySlot, SessionSlot, StoredValue};
use crate::domain::{Role, Session};
use chrono::{DateTime, Duration, Utc};
use codequest_errors::AppError;
use std::sync::Arc;

pub const COOKIE_NAME: &str = "user_data";
pub const SESSION_TTL_DAYS: i64 = 7;

/// Read/write access to the signed-in session. Clones share the same slot.
#[derive(Clone)]
pub struct SessionStore {
    slot: Arc<dyn SessionSlot>,
}

impl SessionStore {
    pub fn new(slot: impl SessionSlot + 'static) -> Self {
        Self {
            slot: Arc::new(slot),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemorySlot::new())
    }

    pub fn set(&self, session: &Session) -> Result<(), AppError> {
        self.set_at(session, Utc::now())
    }

    /// `None` when nothing is stored, the value expired, or it cannot be
    /// decoded. Never fails.
    pub fn get(&self) -> Option<Session> {
        self.get_at(Utc::now())
    }

    pub fn clear(&self) -> Result<(), AppError> {
        self.slot.remove()
    }

    pub fn is_logged_in(&self) -> bool {
        self.get().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.get().map(|session| session.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// The stored session rendered as a `Set-Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        let stored = self.slot.read().ok().flatten()?;
        Some(format!(
            "{}={}; Expires={}; Path=/; Secure; SameSite=Strict",
            COOKIE_NAME,
            stored.value,
            stored.expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
        ))
    }

    fn set_at(&self, session: &Session, now: DateTime<Utc>) -> Result<(), AppError> {
        let json = serde_json::to_string(session).map_err(|e| AppError::Internal(e.to_string()))?;
        self.slot.write(&StoredValue {
            value: urlencoding::encode(&json).into_owned(),
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        })
    }

    fn get_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let stored = match self.slot.read() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Could not read session slot: {}", e);
                return None;
            }
        };

        if stored.expires_at <= now {
            tracing::debug!("Stored session expired at {}", stored.expires_at);
            return None;
        }

        let decoded = match urlencoding::decode(&stored.value) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::error!("Error decoding session value: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&decoded) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::error!("Error parsing session value: {}", e);
                None
            }
        }
    }
}
