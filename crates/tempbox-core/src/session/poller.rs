//! Background polling for one inbox session.
//!
//! The session runs on its own task. A timer drives automatic ticks and
//! commands arrive on a channel; both are handled one at a time, so at most
//! one call per mailbox is in flight. After [`PollerHandle::shutdown`] no
//! further ticks fire and the result of a call still in flight is dropped.
//! A call that outlives the shutdown grace period is aborted.

use std::time::Duration;

use tempbox_api::{Message, MessageSummary};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{InboxSession, MailApi, SessionError};
use crate::{Error, Result};

const COMMAND_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 64;

/// How long shutdown waits for an in-flight call before aborting the task.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Requests the poller accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerCommand {
    /// Refresh the message list now.
    Refresh,
    /// Open a message and render its body.
    Open(String),
    /// Delete a message.
    Delete(String),
}

/// Results the poller emits.
#[derive(Debug)]
pub enum InboxEvent {
    /// The message list was fetched.
    Updated {
        /// All known messages, newest first.
        messages: Vec<MessageSummary>,
        /// Ids that were not in the previous list.
        new_ids: Vec<String>,
    },
    /// A message was opened.
    Opened {
        /// The message.
        message: Box<Message>,
        /// Its body, made safe for display.
        html: String,
    },
    /// A message was deleted.
    Deleted(String),
    /// A call failed or was refused. Polling continues.
    Failed(SessionError),
}

/// Handle to a running poller.
#[derive(Debug)]
pub struct PollerHandle {
    commands: mpsc::Sender<PollerCommand>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Sends a command to the poller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PollerStopped`] if the poller has exited.
    pub async fn send(&self, command: PollerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::PollerStopped)
    }

    /// Requests a refresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PollerStopped`] if the poller has exited.
    pub async fn refresh(&self) -> Result<()> {
        self.send(PollerCommand::Refresh).await
    }

    /// Stops the poller and waits for its task to end.
    ///
    /// The timer stops immediately. A call already sent gets
    /// [`SHUTDOWN_GRACE`] to finish and its result is discarded; after that
    /// the task is aborted.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let mut task = self.task;
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
            warn!(
                "Poller still busy after {}s, aborting",
                SHUTDOWN_GRACE.as_secs()
            );
            task.abort();
            let _ = task.await;
        }
    }
}

/// Starts polling `session` every `interval`.
///
/// The first tick fires immediately. Ticks missed while a call is in flight
/// are skipped, not queued.
pub fn spawn_poller<A: MailApi>(
    session: InboxSession<A>,
    interval: Duration,
) -> (PollerHandle, mpsc::Receiver<InboxEvent>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller = Poller {
        session,
        interval,
        commands: command_rx,
        events: event_tx,
        shutdown: shutdown_rx,
    };
    let task = tokio::spawn(poller.run());

    let handle = PollerHandle {
        commands: command_tx,
        shutdown: shutdown_tx,
        task,
    };
    (handle, event_rx)
}

struct Poller<A> {
    session: InboxSession<A>,
    interval: Duration,
    commands: mpsc::Receiver<PollerCommand>,
    events: mpsc::Sender<InboxEvent>,
    shutdown: watch::Receiver<bool>,
}

impl<A: MailApi> Poller<A> {
    async fn run(mut self) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Poller started, interval {}s", self.interval.as_secs());

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                _ = timer.tick() => self.tick().await,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            };

            if self.is_shut_down() {
                debug!("Discarding result that arrived after shutdown");
                break;
            }
            if let Some(event) = event {
                if self.events.send(event).await.is_err() {
                    break;
                }
            }
        }

        info!("Poller stopped");
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn tick(&mut self) -> Option<InboxEvent> {
        let now = Instant::now().into_std();
        match self.session.tick(now).await {
            Ok(Some(new_ids)) => Some(self.updated(new_ids)),
            Ok(None) => None,
            Err(e) => Some(InboxEvent::Failed(e)),
        }
    }

    async fn handle(&mut self, command: PollerCommand) -> Option<InboxEvent> {
        let now = Instant::now().into_std();
        match command {
            PollerCommand::Refresh => match self.session.refresh(now).await {
                Ok(Some(new_ids)) => Some(self.updated(new_ids)),
                Ok(None) => None,
                Err(e) => Some(InboxEvent::Failed(e)),
            },
            PollerCommand::Open(id) => match self.session.open_message(&id, now).await {
                Ok(message) => {
                    let message = Box::new(message.clone());
                    let html = self.session.render(&message);
                    Some(InboxEvent::Opened { message, html })
                }
                Err(e) => Some(InboxEvent::Failed(e)),
            },
            PollerCommand::Delete(id) => match self.session.delete_message(&id, now).await {
                Ok(()) => Some(InboxEvent::Deleted(id)),
                Err(e) => Some(InboxEvent::Failed(e)),
            },
        }
    }

    fn updated(&self, new_ids: Vec<String>) -> InboxEvent {
        InboxEvent::Updated {
            messages: self.session.messages().to_vec(),
            new_ids,
        }
    }
}
