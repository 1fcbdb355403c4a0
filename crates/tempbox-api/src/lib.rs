//! # tempbox-api
//!
//! Async client for the [mail.gw](https://mail.gw) disposable email API.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tempbox_api::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tempbox_api::Error> {
//!     let client = Client::new()?;
//!
//!     // Register a mailbox at the first available domain
//!     let domain = &client.domains().await?[0];
//!     let address = format!("someone@{}", domain.domain);
//!     client.create_account(&address, "s3cret-pass").await?;
//!
//!     // Log in and read the inbox
//!     let token = client.login(&address, "s3cret-pass").await?;
//!     let inbox = client.clone().with_token(token.token);
//!     for message in inbox.list_messages().await? {
//!         println!("{}: {}", message.sender(), message.subject_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Rate limits
//!
//! The service throttles aggressively and answers `429 Too Many Requests`.
//! [`Error::is_rate_limited`] identifies those responses so callers can back
//! off instead of treating them like other failures.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
mod error;
pub mod types;

pub use client::{Client, DEFAULT_BASE_URL};
pub use error::{Error, Result, TOO_MANY_REQUESTS};
pub use types::{Account, Address, Attachment, Domain, Message, MessageSummary, Token};
