//! Reading, deleting and watching messages.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use tempbox_api::{Client, Message, MessageSummary};
use tempbox_core::{InboxEvent, InboxSession, spawn_poller};
use tracing::{info, warn};

use super::App;

fn session(app: &App) -> anyhow::Result<InboxSession<Client>> {
    Ok(InboxSession::new(app.authed_client()?, app.settings.governor))
}

pub async fn list(app: &App) -> anyhow::Result<()> {
    let mut session = session(app)?;
    session
        .fetch_messages(Instant::now())
        .await
        .context("Failed to list messages")?;

    if session.messages().is_empty() {
        println!("No messages.");
        return Ok(());
    }
    for message in session.messages() {
        print_summary(message);
    }
    println!("{} message(s), {} unread", session.messages().len(), session.unread_count());
    Ok(())
}

pub async fn read(app: &App, id: &str, open: bool) -> anyhow::Result<()> {
    let mut session = session(app)?;
    let message = session
        .open_message(id, Instant::now())
        .await
        .with_context(|| format!("Failed to open message {id}"))?
        .clone();
    let html = session.render(&message);

    if open {
        let path = write_html(app, &message, &html).await?;
        opener::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        println!("Opened {}", path.display());
        return Ok(());
    }

    print_header(&message);
    let body = htmd::convert(&html).unwrap_or_else(|e| {
        warn!("Failed to convert message to text: {}", e);
        html.clone()
    });
    println!("{body}");
    if !message.attachments.is_empty() {
        println!();
        for attachment in &message.attachments {
            println!(
                "[attachment] {} ({}, {} bytes)",
                attachment.filename, attachment.content_type, attachment.size
            );
        }
    }
    Ok(())
}

pub async fn remove(app: &App, id: &str) -> anyhow::Result<()> {
    let mut session = session(app)?;
    session
        .delete_message(id, Instant::now())
        .await
        .with_context(|| format!("Failed to delete message {id}"))?;
    println!("Deleted {id}");
    Ok(())
}

pub async fn watch(app: &App, interval: Option<u64>) -> anyhow::Result<()> {
    let state = app.auth.require()?;
    let interval = interval.map_or(app.settings.refresh_interval, Duration::from_secs);
    anyhow::ensure!(!interval.is_zero(), "Interval must be positive");

    let (poller, mut events) = spawn_poller(session(app)?, interval);
    println!(
        "Watching {} every {}s, Ctrl-C to stop",
        state.address,
        interval.as_secs()
    );

    let mut first = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => {
                    handle_event(event, first);
                    first = false;
                }
                None => break,
            },
        }
    }

    poller.shutdown().await;
    info!("Stopped watching {}", state.address);
    Ok(())
}

fn handle_event(event: InboxEvent, first: bool) {
    match event {
        InboxEvent::Updated { messages, new_ids } => {
            if first {
                println!("{} message(s) in the inbox", messages.len());
            }
            for message in messages.iter().filter(|m| new_ids.contains(&m.id)) {
                print_summary(message);
            }
        }
        InboxEvent::Failed(e) => eprintln!("{e}"),
        InboxEvent::Opened { .. } | InboxEvent::Deleted(_) => {}
    }
}

fn print_summary(message: &MessageSummary) {
    let marker = if message.seen { ' ' } else { '*' };
    println!(
        "{marker} {}  {}  {:<30}  {}",
        message.id,
        message.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
        message.sender().to_string(),
        message.subject_or_default(),
    );
}

fn print_header(message: &Message) {
    println!("From:    {}", message.sender());
    let to: Vec<String> = message.to.iter().map(ToString::to_string).collect();
    println!("To:      {}", to.join(", "));
    println!("Subject: {}", message.subject_or_default());
    println!(
        "Date:    {}",
        message.created_at.with_timezone(&chrono::Local).to_rfc2822()
    );
    println!();
}

/// Writes a standalone page for the browser into the data directory.
async fn write_html(app: &App, message: &Message, body: &str) -> anyhow::Result<PathBuf> {
    let dir = app.data_dir.join("messages");
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(format!("{}.html", file_stem(&message.id)));
    let page = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"Content-Security-Policy\" content=\"script-src 'none'\">\
         <title>{}</title></head><body>{body}</body></html>\n",
        escape(message.subject_or_default())
    );
    tokio::fs::write(&path, page)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
