//! Key-value persistence.
//!
//! Every piece of state is one JSON document under a fixed key, the way a
//! browser origin keeps its local storage.
mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Slot of the current session.
pub const SESSION_KEY: &str = "unifyr_user";
/// Array of every registered account.
pub const USERS_KEY: &str = "unifyr_registered_users";
/// Order table keyed by order id.
pub const ORDERS_KEY: &str = "unifyr_orders";

/// Key of the profile document of `email`.
pub fn profile_key(email: &str) -> String {
    format!("profile_{email}")
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed on {key:?}: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },
    #[error("document {key:?} is corrupted: {source}")]
    Corrupted {
        key: String,
        source: serde_json::Error,
    },
    #[error("cannot encode document {key:?}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
    #[error("storage lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Raw string store.
pub trait Storage: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and decode a JSON document.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupted {
            key: key.to_owned(),
            source,
        })
}

/// Encode and write a JSON document.
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw =
        serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_owned(),
            source,
        })?;

    tracing::debug!(key, size_bytes = raw.len(), "document written");
    storage.set(key, &raw)
}
