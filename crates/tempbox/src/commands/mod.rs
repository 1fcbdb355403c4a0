//! Command implementations.

mod account;
mod inbox;
mod stored;

use std::path::PathBuf;

use anyhow::Context;
use tempbox_api::Client;
use tempbox_core::accounts::ACCOUNTS_FILE;
use tempbox_core::auth::AUTH_FILE;
use tempbox_core::{AccountStore, AuthStore, Settings};
use tracing::debug;

use crate::cli::{AccountCommands, Cli, Commands};

/// Everything a command needs.
pub struct App {
    pub settings: Settings,
    pub client: Client,
    pub auth: AuthStore,
    pub accounts: AccountStore,
    pub data_dir: PathBuf,
}

impl App {
    async fn load(cli: &Cli) -> anyhow::Result<Self> {
        let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
        let mut settings = Settings::load(&settings_path)
            .await
            .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
        if let Some(url) = &cli.api_url {
            settings.api_base_url.clone_from(url);
        }
        debug!("Using API at {}", settings.api_base_url);

        let client = Client::with_base_url(&settings.api_base_url)
            .with_context(|| format!("Invalid API URL {}", settings.api_base_url))?;
        let data_dir = tempbox_core::data_dir();
        let auth = AuthStore::open(data_dir.join(AUTH_FILE))
            .await
            .context("Failed to read session")?;
        let accounts = AccountStore::new(data_dir.join(ACCOUNTS_FILE));

        Ok(Self {
            settings,
            client,
            auth,
            accounts,
            data_dir,
        })
    }

    /// API client bound to the current login.
    fn authed_client(&self) -> anyhow::Result<Client> {
        self.auth
            .client(&self.client)
            .context("Log in first with `tempbox login` or `tempbox create`")
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = App::load(&cli).await?;

    match cli.command {
        Commands::Domains => account::domains(&app).await,
        Commands::Create { address, password } => {
            account::create(&app, address.as_deref(), password.as_deref()).await
        }
        Commands::Login { address, password } => account::login(&app, &address, &password).await,
        Commands::Logout => account::logout(&app).await,
        Commands::Whoami => account::whoami(&app).await,
        Commands::DeleteAccount => account::delete(&app).await,
        Commands::Inbox => inbox::list(&app).await,
        Commands::Read { id, open } => inbox::read(&app, &id, open).await,
        Commands::Rm { id } => inbox::remove(&app, &id).await,
        Commands::Watch { interval } => inbox::watch(&app, interval).await,
        Commands::Accounts { command } => match command {
            AccountCommands::List => stored::list(&app).await,
            AccountCommands::Use { account } => stored::switch(&app, &account).await,
            AccountCommands::Forget { id } => stored::forget(&app, &id).await,
        },
    }
}
