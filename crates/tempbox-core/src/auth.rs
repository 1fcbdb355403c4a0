//! Logged-in mailbox state.
//!
//! The current session is persisted as JSON so it survives restarts, and
//! every change is published on a [`watch`] channel. Components that care
//! about login and logout subscribe instead of polling the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{Error, Result};

/// File name of the persisted session inside the data directory.
pub const AUTH_FILE: &str = "auth.json";

/// Credentials of the logged-in mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    /// Bearer token.
    pub token: String,
    /// Remote account id.
    pub account_id: String,
    /// Mailbox address.
    pub address: String,
}

impl AuthState {
    /// Returns true if both token and account id are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty() && !self.account_id.is_empty()
    }
}

/// Persisted, observable auth state.
#[derive(Debug)]
pub struct AuthStore {
    path: PathBuf,
    state: watch::Sender<Option<AuthState>>,
}

impl AuthStore {
    /// Opens the store at `path`.
    ///
    /// A missing file means logged out. A file that cannot be parsed is
    /// logged and treated the same way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = read_state(&path).await?;
        let (state, _) = watch::channel(state);
        Ok(Self { path, state })
    }

    /// Returns the current state, if logged in.
    #[must_use]
    pub fn current(&self) -> Option<AuthState> {
        self.state
            .borrow()
            .as_ref()
            .filter(|state| state.is_authenticated())
            .cloned()
    }

    /// Returns the current state or [`Error::NotAuthenticated`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] if nobody is logged in.
    pub fn require(&self) -> Result<AuthState> {
        self.current().ok_or(Error::NotAuthenticated)
    }

    /// Subscribes to login and logout.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthState>> {
        self.state.subscribe()
    }

    /// Stores a new login and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn set(&self, state: AuthState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(&state)?;
        tokio::fs::write(&self.path, contents).await?;

        info!("Logged in as {}", state.address);
        self.state.send_replace(Some(state));
        Ok(())
    }

    /// Forgets the login and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(previous) = self.state.send_replace(None) {
            info!("Logged out of {}", previous.address);
        }
        Ok(())
    }

    /// Returns `client` bound to the current token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] if nobody is logged in.
    pub fn client(&self, client: &tempbox_api::Client) -> Result<tempbox_api::Client> {
        let state = self.require()?;
        Ok(client.clone().with_token(state.token))
    }
}

async fn read_state(path: &Path) -> Result<Option<AuthState>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str(&contents) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            warn!("Ignoring unreadable session file {:?}: {}", path, e);
            Ok(None)
        }
    }
}
