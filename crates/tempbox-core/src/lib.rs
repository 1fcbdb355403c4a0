//! # tempbox-core
//!
//! Core logic for the tempbox disposable email client.
//!
//! This crate provides:
//! - **Request governor** - decides when the rate-limited mail API may be
//!   called and how long to back off after `429` responses
//! - **Inbox sessions** - message list, open message and safe rendering for
//!   one mailbox, plus a background poller
//! - Session state with change notifications
//! - Stored mailboxes and the create/login/delete flows
//! - Settings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod accounts;
pub mod auth;
mod error;
pub mod governor;
pub mod session;
pub mod settings;

pub use accounts::{AccountStore, CreatedAccount, GeneratedAccount, ValidationError};
pub use auth::{AuthState, AuthStore};
pub use error::{Error, Result};
pub use governor::{FailureKind, FailureOutcome, Governor, GovernorConfig, GovernorState};
pub use session::{
    InboxEvent, InboxSession, MailApi, PollerCommand, PollerHandle, SHUTDOWN_GRACE, SessionError,
    spawn_poller,
};
pub use settings::{Settings, data_dir};
