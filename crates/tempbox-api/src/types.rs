//! Wire types of the mail.gw API.
//!
//! The service speaks JSON-LD; collections arrive wrapped in `hydra:member`.
//! Fields the service sometimes sends as `null` deserialize to defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Sender name shown when a message has no sender.
pub const UNKNOWN_SENDER: &str = "Unknown Sender";

/// Subject shown when a message has none.
pub const NO_SUBJECT: &str = "(No Subject)";

/// Preview shown when a message has no intro.
pub const NO_CONTENT: &str = "(No content)";

/// Treats an explicit `null` like a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A JSON-LD collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    /// Items on this page.
    #[serde(rename = "hydra:member", default = "Vec::new")]
    pub members: Vec<T>,
    /// Total number of items across all pages.
    #[serde(rename = "hydra:totalItems", default)]
    pub total_items: u64,
}

/// A domain new addresses can be created at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Domain ID.
    pub id: String,
    /// Domain name (e.g. `mail.gw`).
    pub domain: String,
    /// Whether addresses can currently be registered.
    #[serde(default)]
    pub is_active: bool,
    /// Whether the domain is reserved.
    #[serde(default)]
    pub is_private: bool,
}

/// A mailbox account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID.
    pub id: String,
    /// Full email address.
    pub address: String,
    /// Storage quota in bytes.
    #[serde(default)]
    pub quota: u64,
    /// Storage used in bytes.
    #[serde(default)]
    pub used: u64,
    /// Whether the account is disabled.
    #[serde(default)]
    pub is_disabled: bool,
    /// Whether the account is deleted.
    #[serde(default)]
    pub is_deleted: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Bearer token returned by a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// JWT bearer token.
    pub token: String,
    /// ID of the account the token belongs to.
    pub id: String,
}

/// Credentials for account creation and login.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Credentials<'a> {
    pub address: &'a str,
    pub password: &'a str,
}

/// A sender or recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Display name (may be empty).
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// Email address.
    #[serde(default, deserialize_with = "null_default")]
    pub address: String,
}

impl Address {
    /// Placeholder for messages without a sender.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_SENDER.to_string(),
            address: "unknown".to_string(),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// A message as it appears in the inbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    /// Message ID.
    pub id: String,
    /// Sender.
    #[serde(default)]
    pub from: Option<Address>,
    /// Recipients.
    #[serde(default, deserialize_with = "null_default")]
    pub to: Vec<Address>,
    /// Subject line.
    #[serde(default, deserialize_with = "null_default")]
    pub subject: String,
    /// Preview of the body.
    #[serde(default, deserialize_with = "null_default")]
    pub intro: String,
    /// Whether the message has been read.
    #[serde(default)]
    pub seen: bool,
    /// Whether the message has attachments.
    #[serde(default)]
    pub has_attachments: bool,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Receive time.
    pub created_at: DateTime<Utc>,
}

impl MessageSummary {
    /// Returns the sender, or a placeholder.
    #[must_use]
    pub fn sender(&self) -> Address {
        self.from.clone().unwrap_or_else(Address::unknown)
    }

    /// Returns the subject, or a placeholder.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        if self.subject.is_empty() {
            NO_SUBJECT
        } else {
            &self.subject
        }
    }

    /// Returns the intro, or a placeholder.
    #[must_use]
    pub fn preview(&self) -> &str {
        if self.intro.trim().is_empty() {
            NO_CONTENT
        } else {
            &self.intro
        }
    }
}

/// An attachment of a full message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment ID.
    pub id: String,
    /// File name.
    #[serde(default, deserialize_with = "null_default")]
    pub filename: String,
    /// MIME type.
    #[serde(default, deserialize_with = "null_default")]
    pub content_type: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Download path, relative to the API base.
    #[serde(default, deserialize_with = "null_default")]
    pub download_url: String,
}

/// A full message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID.
    pub id: String,
    /// ID of the owning account.
    #[serde(default, deserialize_with = "null_default")]
    pub account_id: String,
    /// RFC 5322 `Message-ID`.
    #[serde(default, deserialize_with = "null_default")]
    pub msgid: String,
    /// Sender.
    #[serde(default)]
    pub from: Option<Address>,
    /// Recipients.
    #[serde(default, deserialize_with = "null_default")]
    pub to: Vec<Address>,
    /// Carbon-copy recipients.
    #[serde(default, deserialize_with = "null_default")]
    pub cc: Vec<Address>,
    /// Blind carbon-copy recipients.
    #[serde(default, deserialize_with = "null_default")]
    pub bcc: Vec<Address>,
    /// Subject line.
    #[serde(default, deserialize_with = "null_default")]
    pub subject: String,
    /// Whether the message has been read.
    #[serde(default)]
    pub seen: bool,
    /// Whether the message is flagged.
    #[serde(default)]
    pub flagged: bool,
    /// Plain text body.
    #[serde(default)]
    pub text: Option<String>,
    /// HTML body parts.
    #[serde(default, deserialize_with = "null_default")]
    pub html: Vec<String>,
    /// Whether the message has attachments.
    #[serde(default)]
    pub has_attachments: bool,
    /// Attachments.
    #[serde(default, deserialize_with = "null_default")]
    pub attachments: Vec<Attachment>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Raw source download path.
    #[serde(default, deserialize_with = "null_default")]
    pub download_url: String,
    /// Receive time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Returns the HTML body parts joined, or `None` if there are none.
    #[must_use]
    pub fn html_body(&self) -> Option<String> {
        if self.html.is_empty() {
            None
        } else {
            Some(self.html.concat())
        }
    }

    /// Returns the sender, or a placeholder.
    #[must_use]
    pub fn sender(&self) -> Address {
        self.from.clone().unwrap_or_else(Address::unknown)
    }

    /// Returns the subject, or a placeholder.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        if self.subject.is_empty() {
            NO_SUBJECT
        } else {
            &self.subject
        }
    }
}

/// Extracts a human-readable description from an error body.
pub(crate) fn error_description(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["hydra:description", "detail", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
