//! Mailbox creation, login and deletion.

use anyhow::Context;
use tempbox_core::accounts;

use super::App;

pub async fn domains(app: &App) -> anyhow::Result<()> {
    let domains = app.client.domains().await.context("Failed to list domains")?;
    for domain in domains.iter().filter(|d| d.is_active) {
        println!("{}", domain.domain);
    }
    Ok(())
}

pub async fn create(app: &App, address: Option<&str>, password: Option<&str>) -> anyhow::Result<()> {
    let created = match (address, password) {
        (Some(address), Some(password)) => {
            accounts::create_account(&app.client, &app.auth, &app.accounts, address, password).await
        }
        _ => accounts::create_random_account(&app.client, &app.auth, &app.accounts).await,
    }
    .context("Failed to create mailbox")?;

    println!("Address:  {}", created.account.address);
    println!("Password: {}", created.password);
    if created.logged_in {
        println!("Logged in.");
    } else {
        println!("Mailbox created, but login failed. Try `tempbox login` in a moment.");
    }
    Ok(())
}

pub async fn login(app: &App, address: &str, password: &str) -> anyhow::Result<()> {
    let state = accounts::login(&app.client, &app.auth, address, password)
        .await
        .context("Login failed")?;
    println!("Logged in as {}", state.address);
    Ok(())
}

pub async fn logout(app: &App) -> anyhow::Result<()> {
    app.auth.clear().await.context("Failed to clear session")?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(app: &App) -> anyhow::Result<()> {
    let Some(state) = app.auth.current() else {
        println!("Not logged in.");
        return Ok(());
    };
    let account = accounts::current_account(&app.client, &app.auth)
        .await
        .with_context(|| format!("Failed to load account {}", state.address))?;

    println!("{}", account.address);
    println!("Usage: {} of {} bytes", account.used, account.quota);
    println!(
        "Created: {}",
        account
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

pub async fn delete(app: &App) -> anyhow::Result<()> {
    let state = app.auth.require()?;
    accounts::delete_current_account(&app.client, &app.auth, &app.accounts)
        .await
        .context("Failed to delete mailbox")?;
    println!("Deleted {}", state.address);
    Ok(())
}
