//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tempbox", version, about = "Disposable mail.gw mailboxes from the terminal")]
pub struct Cli {
    /// Settings file (default: <config dir>/tempbox/settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Mail API base URL, overriding the settings file
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the domains addresses can be created at
    Domains,
    /// Create a mailbox and log into it (random address if none is given)
    Create {
        #[arg(long, requires = "password")]
        address: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Log into an existing mailbox
    Login {
        address: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the current login
    Logout,
    /// Show the logged-in mailbox
    Whoami,
    /// Delete the logged-in mailbox on the server and log out
    DeleteAccount,
    /// List messages
    Inbox,
    /// Show a message
    Read {
        id: String,
        /// Open the rendered message in the browser instead of printing it
        #[arg(long)]
        open: bool,
    },
    /// Delete a message
    Rm { id: String },
    /// Poll the inbox and print new mail until interrupted
    Watch {
        /// Poll interval in seconds, overriding the settings file
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Manage stored mailboxes
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// List stored mailboxes
    List,
    /// Log into a stored mailbox by address or id
    Use { account: String },
    /// Remove a stored mailbox by id (the remote mailbox is kept)
    Forget { id: String },
}
