//! Stored mailbox list.

use anyhow::Context;
use tempbox_core::accounts;

use super::App;

pub async fn list(app: &App) -> anyhow::Result<()> {
    let stored = app.accounts.list().await.context("Failed to read stored mailboxes")?;
    if stored.is_empty() {
        println!("No stored mailboxes.");
        return Ok(());
    }

    let current = app.auth.current().map(|s| s.account_id);
    for account in stored {
        let marker = if current.as_deref() == Some(account.id.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(
            "{marker} {:<40} {}  {}",
            account.address,
            account.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            account.id
        );
    }
    Ok(())
}

pub async fn switch(app: &App, key: &str) -> anyhow::Result<()> {
    let state = accounts::login_stored(&app.client, &app.auth, &app.accounts, key)
        .await
        .with_context(|| format!("Failed to switch to {key}"))?;
    println!("Logged in as {}", state.address);
    Ok(())
}

pub async fn forget(app: &App, id: &str) -> anyhow::Result<()> {
    if app.accounts.remove(id).await? {
        println!("Forgot {id}");
    } else {
        println!("No stored mailbox with id {id}");
    }
    Ok(())
}
