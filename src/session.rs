//! Current authenticated identity.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::database::{self, SESSION_KEY, Storage, StorageError};
use crate::error::{Error, Result};
use crate::user::{ADMIN_EMAIL, ADMIN_ID, ADMIN_NAME, Role, UserAccount};

/// Projection of an account without its password.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Only set when the identity was issued by a remote API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    /// Session of the built-in administrator.
    pub fn admin() -> Self {
        Self {
            id: ADMIN_ID.to_owned(),
            name: ADMIN_NAME.to_owned(),
            email: ADMIN_EMAIL.to_owned(),
            role: Role::Admin,
            avatar: None,
            token: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&UserAccount> for Session {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            token: None,
        }
    }
}

/// Owner of the single session slot.
///
/// Loaded once on start, kept in memory and mirrored to storage on every
/// change.
#[derive(Clone)]
pub struct SessionRepository {
    storage: Arc<dyn Storage>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionRepository {
    /// Restore the session persisted by a previous run, if any.
    ///
    /// A corrupted slot is discarded rather than blocking start-up.
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let current =
            match database::read_json::<Session>(storage.as_ref(), SESSION_KEY)
            {
                Ok(session) => session,
                Err(err @ StorageError::Corrupted { .. }) => {
                    tracing::warn!(error = %err, "discarding stored session");
                    storage.remove(SESSION_KEY)?;
                    None
                },
                Err(err) => return Err(err.into()),
            };

        Ok(Self {
            storage,
            current: Arc::new(RwLock::new(current)),
        })
    }

    /// Active session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    /// Active session or [`Error::NotAuthenticated`].
    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(Error::NotAuthenticated)
    }

    /// Install `session`, replacing any previous one.
    pub fn establish(&self, session: Session) -> Result<()> {
        database::write_json(self.storage.as_ref(), SESSION_KEY, &session)?;
        *self.current.write().map_err(|_| StorageError::Poisoned)? =
            Some(session);
        Ok(())
    }

    /// Destroy the session. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(SESSION_KEY)?;
        *self.current.write().map_err(|_| StorageError::Poisoned)? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStorage;

    fn jane() -> Session {
        Session {
            id: "1".into(),
            name: "Jane".into(),
            email: "jane@unifyr.com".into(),
            role: Role::User,
            avatar: None,
            token: None,
        }
    }

    #[test]
    fn test_lifecycle() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        let sessions = SessionRepository::load(Arc::clone(&storage)).unwrap();
        assert!(sessions.current().is_none());
        assert!(matches!(sessions.require(), Err(Error::NotAuthenticated)));

        sessions.establish(jane()).unwrap();
        assert_eq!(sessions.current(), Some(jane()));

        // Survives a restart.
        let restored = SessionRepository::load(Arc::clone(&storage)).unwrap();
        assert_eq!(restored.current(), Some(jane()));

        restored.clear().unwrap();
        restored.clear().unwrap();
        assert!(restored.current().is_none());
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupted_slot_is_dropped() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::default());
        storage.set(SESSION_KEY, "nope").unwrap();

        let sessions = SessionRepository::load(Arc::clone(&storage)).unwrap();
        assert!(sessions.current().is_none());
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_wire_shape() {
        let mut session = jane();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("token").is_none());
        assert!(json.get("password").is_none());

        session.token = Some("abc".into());
        assert_eq!(serde_json::to_value(&session).unwrap()["token"], "abc");
    }
}
