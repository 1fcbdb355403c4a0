//! Stored mailbox list.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::model::GeneratedAccount;
use crate::Result;

/// File name of the mailbox list inside the data directory.
pub const ACCOUNTS_FILE: &str = "accounts.json";

/// JSON file holding every stored mailbox.
#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    /// Creates a store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns every stored mailbox, oldest first.
    ///
    /// A missing file is an empty list. So is a file that cannot be parsed;
    /// the problem is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn list(&self) -> Result<Vec<GeneratedAccount>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(accounts) => Ok(accounts),
            Err(e) => {
                warn!("Failed to parse accounts file {:?}: {}", self.path, e);
                Ok(Vec::new())
            }
        }
    }

    /// Finds a mailbox by address or id.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn find(&self, key: &str) -> Result<Option<GeneratedAccount>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|a| a.address.eq_ignore_ascii_case(key) || a.id == key))
    }

    /// Stores a mailbox, replacing an entry with the same address.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, account: GeneratedAccount) -> Result<()> {
        let mut accounts = self.list().await?;
        if let Some(existing) = accounts
            .iter_mut()
            .find(|a| a.address.eq_ignore_ascii_case(&account.address))
        {
            debug!("Updating stored account {}", account.address);
            *existing = account;
        } else {
            debug!("Storing account {}", account.address);
            accounts.push(account);
        }
        self.write(&accounts).await
    }

    /// Removes a mailbox by id.
    ///
    /// Returns true if an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut accounts = self.list().await?;
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == before {
            return Ok(false);
        }
        self.write(&accounts).await?;
        Ok(true)
    }

    /// Removes every stored mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, accounts: &[GeneratedAccount]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(accounts)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}
