//! Stored mailbox types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mailbox this client created or logged into, kept so it can be reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAccount {
    /// Remote account id.
    pub id: String,
    /// Mailbox address.
    pub address: String,
    /// Password used to log in again.
    pub password: String,
    /// When the entry was stored.
    pub created_at: DateTime<Utc>,
}

impl GeneratedAccount {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            password: password.into(),
            created_at: Utc::now(),
        }
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }
}
