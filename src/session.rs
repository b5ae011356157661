//! Session persistence — bearer token and optional "remember me" credentials.
//!
//! Lifecycle contract:
//! - the token is written on login success, read before every authenticated
//!   request, and deleted on logout or on any 401 response;
//! - remembered credentials carry an expiry and are purged on read once
//!   expired; logout deletes them together with the token.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{self, DatabaseError};

const TOKEN_KEY: &str = "auth_token";
const REMEMBERED_KEY: &str = "remembered_login";

/// Credentials the user opted to keep on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub subdomain: String,
    pub username: String,
    pub password: String,
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RememberedLogin {
    #[serde(flatten)]
    credentials: StoredCredentials,
    expires_at: DateTime<Utc>,
}

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Corrupt store entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// On-device key-value store for the session.
///
/// A `Mutex<Connection>` is enough here: the store sees one short
/// read or write per command dispatch, never concurrent bulk work.
pub struct SessionStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SessionStore {
    /// Open (creating if needed) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(db::open_database(path)?),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Mutex::new(db::open_memory_database()?),
        })
    }

    // ── Token ───────────────────────────────────────────────

    /// The stored bearer token, if any.
    pub fn token(&self) -> Result<Option<String>, StoreError> {
        self.get(TOKEN_KEY)
    }

    /// Persist the bearer token returned by login.
    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.put(TOKEN_KEY, token)
    }

    /// Delete the bearer token (logout, or a 401 from the server).
    pub fn clear_token(&self) -> Result<(), StoreError> {
        self.delete(TOKEN_KEY)
    }

    // ── Remember me ─────────────────────────────────────────

    /// Keep login credentials on the device for `days` days.
    pub fn remember_credentials(
        &self,
        credentials: StoredCredentials,
        days: i64,
    ) -> Result<(), StoreError> {
        let entry = RememberedLogin {
            credentials,
            expires_at: Utc::now() + Duration::days(days),
        };
        self.put(REMEMBERED_KEY, &serde_json::to_string(&entry)?)
    }

    /// Remembered credentials, if present and not expired.
    ///
    /// Expired entries are deleted on read, so the login screen never
    /// pre-fills from a stale remember-me window.
    pub fn remembered_credentials(&self) -> Result<Option<StoredCredentials>, StoreError> {
        let Some(raw) = self.get(REMEMBERED_KEY)? else {
            return Ok(None);
        };
        let entry: RememberedLogin = serde_json::from_str(&raw)?;
        if entry.expires_at <= Utc::now() {
            self.delete(REMEMBERED_KEY)?;
            return Ok(None);
        }
        Ok(Some(entry.credentials))
    }

    /// Drop remembered credentials.
    pub fn forget_credentials(&self) -> Result<(), StoreError> {
        self.delete(REMEMBERED_KEY)
    }

    /// Logout: delete the token and any remembered credentials.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.clear_token()?;
        self.forget_credentials()
    }

    // ── Internal kv access ──────────────────────────────────

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            [key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}
