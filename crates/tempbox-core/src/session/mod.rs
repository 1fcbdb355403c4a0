//! Inbox session: one mailbox view with its own request governor.
//!
//! Every remote call the session makes goes through the same sequence: ask
//! the governor, issue the call, report the outcome back. Automatic ticks and
//! manual requests share the governor, so both respect the same pacing.

mod poller;

use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

use tempbox_api::{Message, MessageSummary};
use tempbox_render::{RenderInput, Renderer};
use tracing::{debug, info, warn};

use crate::governor::{FailureKind, FailureOutcome, Governor, GovernorConfig};

pub use poller::{InboxEvent, PollerCommand, PollerHandle, SHUTDOWN_GRACE, spawn_poller};

/// Remote calls an inbox session needs.
pub trait MailApi: Send + Sync + 'static {
    /// Lists the messages in the mailbox.
    fn list_messages(
        &self,
    ) -> impl Future<Output = tempbox_api::Result<Vec<MessageSummary>>> + Send;

    /// Fetches one message.
    fn message(&self, id: &str) -> impl Future<Output = tempbox_api::Result<Message>> + Send;

    /// Marks a message as read.
    fn mark_read(&self, id: &str) -> impl Future<Output = tempbox_api::Result<()>> + Send;

    /// Deletes a message.
    fn delete_message(&self, id: &str) -> impl Future<Output = tempbox_api::Result<()>> + Send;
}

impl MailApi for tempbox_api::Client {
    fn list_messages(
        &self,
    ) -> impl Future<Output = tempbox_api::Result<Vec<MessageSummary>>> + Send {
        Self::list_messages(self)
    }

    fn message(&self, id: &str) -> impl Future<Output = tempbox_api::Result<Message>> + Send {
        Self::message(self, id)
    }

    fn mark_read(&self, id: &str) -> impl Future<Output = tempbox_api::Result<()>> + Send {
        Self::mark_read(self, id)
    }

    fn delete_message(&self, id: &str) -> impl Future<Output = tempbox_api::Result<()>> + Send {
        Self::delete_message(self, id)
    }
}

/// Errors from session operations. None of them ends the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The governor refused the call; nothing was sent.
    #[error("Please wait {}s before trying again", ceil_secs(.retry_in))]
    Throttled {
        /// Time until the next call is permitted.
        retry_in: Duration,
    },

    /// The service answered 429.
    #[error("{}", rate_limit_message(.retry_in, .gave_up))]
    RateLimited {
        /// Backoff before the next call is permitted.
        retry_in: Duration,
        /// True once the retry budget is used up.
        gave_up: bool,
    },

    /// Any other failure of the call.
    #[error("Request failed: {0}")]
    Transient(#[source] tempbox_api::Error),
}

impl SessionError {
    /// Returns how long the caller should wait, if the error carries a wait.
    #[must_use]
    pub const fn retry_in(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_in } | Self::RateLimited { retry_in, .. } => Some(*retry_in),
            Self::Transient(_) => None,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)] // Called from the error format args
fn ceil_secs(duration: &Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn rate_limit_message(retry_in: &Duration, gave_up: &bool) -> String {
    if *gave_up {
        format!(
            "Too many requests, try again later (next attempt in {}s)",
            ceil_secs(retry_in)
        )
    } else {
        format!("Too many requests, retrying in {}s", ceil_secs(retry_in))
    }
}

/// State of one open mailbox.
#[derive(Debug)]
pub struct InboxSession<A> {
    api: A,
    governor: Governor,
    renderer: Renderer,
    messages: Vec<MessageSummary>,
    current: Option<Message>,
}

impl<A: MailApi> InboxSession<A> {
    /// Creates a session with a fresh governor.
    pub fn new(api: A, config: GovernorConfig) -> Self {
        Self {
            api,
            governor: Governor::new(config),
            renderer: Renderer::default(),
            messages: Vec::new(),
            current: None,
        }
    }

    /// Replaces the renderer used for message bodies.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Returns the governor.
    pub const fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Returns the known messages, newest first.
    pub fn messages(&self) -> &[MessageSummary] {
        &self.messages
    }

    /// Returns the number of unread messages.
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.seen).count()
    }

    /// Returns the open message.
    pub const fn current(&self) -> Option<&Message> {
        self.current.as_ref()
    }

    /// Closes the open message.
    pub fn close_message(&mut self) {
        self.current = None;
    }

    /// Fetches the message list.
    ///
    /// Returns the ids of messages not seen in the previous list.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Throttled`] if the governor refuses the call,
    /// or the call's failure.
    pub async fn fetch_messages(&mut self, now: Instant) -> Result<Vec<String>, SessionError> {
        self.acquire(now)?;
        let result = self.api.list_messages().await;
        let mut messages = self.settle(result)?;

        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let known: HashSet<&str> = self.messages.iter().map(|m| m.id.as_str()).collect();
        let new_ids: Vec<String> = messages
            .iter()
            .filter(|m| !known.contains(m.id.as_str()))
            .map(|m| m.id.clone())
            .collect();
        if !new_ids.is_empty() {
            info!("{} new message(s)", new_ids.len());
        }
        self.messages = messages;
        Ok(new_ids)
    }

    /// Runs one automatic poll.
    ///
    /// A tick the governor would refuse is skipped and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the call's failure.
    pub async fn tick(&mut self, now: Instant) -> Result<Option<Vec<String>>, SessionError> {
        if let Some(wait) = self.governor.remaining_wait(now) {
            debug!("Poll skipped, next call allowed in {}ms", wait.as_millis());
            return Ok(None);
        }
        self.fetch_messages(now).await.map(Some)
    }

    /// Runs a user-requested refresh.
    ///
    /// While backing off after rate-limit errors the refresh is refused with
    /// the remaining wait. Otherwise it behaves exactly like [`Self::tick`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Throttled`] during backoff, or the call's
    /// failure.
    pub async fn refresh(&mut self, now: Instant) -> Result<Option<Vec<String>>, SessionError> {
        if self.governor.is_rate_limited() {
            if let Some(retry_in) = self.governor.remaining_wait(now) {
                return Err(SessionError::Throttled { retry_in });
            }
        }
        self.tick(now).await
    }

    /// Opens a message, marking it read if needed.
    ///
    /// Marking read is part of the same permitted call; its failure is
    /// logged and does not fail the open.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Throttled`] if the governor refuses the call,
    /// or the call's failure.
    pub async fn open_message(&mut self, id: &str, now: Instant) -> Result<&Message, SessionError> {
        self.acquire(now)?;
        let result = self.api.message(id).await;
        let mut message = self.settle(result)?;

        if !message.seen {
            match self.api.mark_read(id).await {
                Ok(()) => {
                    message.seen = true;
                    if let Some(summary) = self.messages.iter_mut().find(|m| m.id == id) {
                        summary.seen = true;
                    }
                }
                Err(e) => warn!("Failed to mark message {} as read: {}", id, e),
            }
        }

        Ok(&*self.current.insert(message))
    }

    /// Deletes a message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Throttled`] if the governor refuses the call,
    /// or the call's failure.
    pub async fn delete_message(&mut self, id: &str, now: Instant) -> Result<(), SessionError> {
        self.acquire(now)?;
        let result = self.api.delete_message(id).await;
        self.settle(result)?;

        self.messages.retain(|m| m.id != id);
        if self.current.as_ref().is_some_and(|m| m.id == id) {
            self.current = None;
        }
        info!("Deleted message {}", id);
        Ok(())
    }

    /// Renders the open message body for display.
    pub fn rendered_body(&self) -> Option<String> {
        self.current.as_ref().map(|message| self.render(message))
    }

    /// Renders a message body for display.
    pub fn render(&self, message: &Message) -> String {
        let input = RenderInput::new(message.html_body(), message.text.clone());
        self.renderer.render(&input)
    }

    fn acquire(&mut self, now: Instant) -> Result<(), SessionError> {
        self.governor
            .try_acquire(now)
            .map_err(|retry_in| SessionError::Throttled { retry_in })
    }

    fn settle<T>(&mut self, result: tempbox_api::Result<T>) -> Result<T, SessionError> {
        match result {
            Ok(value) => {
                self.governor.record_success();
                Ok(value)
            }
            Err(e) if e.is_rate_limited() => {
                let outcome = self.governor.record_failure(FailureKind::RateLimited);
                Err(SessionError::RateLimited {
                    retry_in: outcome.retry_in().unwrap_or_default(),
                    gave_up: matches!(outcome, FailureOutcome::GiveUp { .. }),
                })
            }
            Err(e) => {
                let _ = self.governor.record_failure(FailureKind::Transient);
                Err(SessionError::Transient(e))
            }
        }
    }
}
