//! Stored session credentials.
//!
//! Holds the bearer token, refresh token and customer profile in a lock-free
//! slot, optionally mirrored to a JSON file so a later process can resume the
//! session. The current user is published through a [`Store`].

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::observability::metrics;
use crate::store::Store;

/// A customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Tokens and profile returned by login and registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
    pub customer: User,
}

/// Holder of the current session.
#[derive(Debug)]
pub struct CredentialStore {
    slot: ArcSwapOption<Credentials>,
    user: Store<Option<User>>,
    persistence_path: Option<PathBuf>,
    invalidations: AtomicU64,
}

impl CredentialStore {
    /// Create an empty in-memory store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            user: Store::new(None),
            persistence_path,
            invalidations: AtomicU64::new(0),
        }
    }

    /// Create a store backed by `path`, resuming a saved session if present.
    ///
    /// A corrupt file is discarded rather than failing startup.
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            match serde_json::from_reader::<_, Credentials>(reader) {
                Ok(credentials) => {
                    tracing::info!(email = %credentials.customer.email, "Resumed stored session");
                    store.user.set(Some(credentials.customer.clone()));
                    store.slot.store(Some(Arc::new(credentials)));
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Discarding unreadable credentials file");
                    remove_file(path)?;
                }
            }
        }
        Ok(store)
    }

    /// Store new credentials and publish the user.
    pub fn save(&self, credentials: Credentials) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &credentials)?;
        }
        self.user.set(Some(credentials.customer.clone()));
        self.slot.store(Some(Arc::new(credentials)));
        Ok(())
    }

    /// Drop the session. Returns `false` when there was nothing to clear.
    pub fn clear(&self) -> bool {
        let previous = self.slot.swap(None);
        if let Some(path) = &self.persistence_path {
            if let Err(e) = remove_file(path) {
                tracing::warn!(path = ?path, error = %e, "Error clearing credentials file");
            }
        }
        if previous.is_none() {
            return false;
        }
        self.user.set(None);
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        metrics::record_credentials_cleared();
        tracing::warn!("Session cleared");
        true
    }

    pub fn token(&self) -> Option<String> {
        self.slot.load().as_ref().map(|c| c.token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.slot
            .load()
            .as_ref()
            .map(|c| c.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn current_user(&self) -> Option<User> {
        self.user.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Follow login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    /// How many times an active session has been cleared.
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(None)
    }
}

fn remove_file(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) fn test_credentials(token: &str) -> Credentials {
    Credentials {
        token: token.to_string(),
        refresh_token: format!("{token}-refresh"),
        customer: User {
            id: "6777c28c3e73d3f1b78b467f".to_string(),
            email: "test@test.com".to_string(),
            name: "usuario".to_string(),
            phone: None,
            created_at: None,
        },
    }
}
