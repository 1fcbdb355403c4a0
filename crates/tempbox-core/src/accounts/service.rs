//! Mailbox lifecycle: create, log in, delete.

use rand::Rng;
use rand::seq::SliceRandom;
use tempbox_api::{Account, Client, Domain};
use tracing::{info, warn};

use super::model::GeneratedAccount;
use super::repository::AccountStore;
use super::validation::{validate_login, validate_new_account};
use crate::auth::{AuthState, AuthStore};
use crate::{Error, Result};

/// Domain used when the service lists no active domain.
pub const FALLBACK_DOMAIN: &str = "mail.gw";

const LOCAL_PART_LEN: usize = 8;
const PASSWORD_LEN: usize = 16;
const LOCAL_PART_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const PASSWORD_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#%^*-_";

/// Result of creating a mailbox.
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    /// The new remote account.
    pub account: Account,
    /// Password it was created with.
    pub password: String,
    /// Whether the automatic login after creation succeeded.
    pub logged_in: bool,
}

/// Creates a mailbox, stores it and logs into it.
///
/// A failed login after a successful creation is logged and reported through
/// [`CreatedAccount::logged_in`]; the mailbox exists either way.
///
/// # Errors
///
/// Returns an error if the input is invalid, the address is taken, or the
/// request fails.
pub async fn create_account(
    client: &Client,
    auth: &AuthStore,
    accounts: &AccountStore,
    address: &str,
    password: &str,
) -> Result<CreatedAccount> {
    validate_new_account(address, password, None).map_err(Error::Validation)?;

    let account = client.create_account(address.trim(), password).await?;
    info!("Created mailbox {}", account.address);
    accounts
        .save(GeneratedAccount::new(&account.id, &account.address, password))
        .await?;

    let logged_in = match login(client, auth, &account.address, password).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Mailbox created, but login failed: {}", e);
            false
        }
    };

    Ok(CreatedAccount {
        account,
        password: password.to_string(),
        logged_in,
    })
}

/// Creates a mailbox with a random address at a random active domain and a
/// random password.
///
/// # Errors
///
/// Returns an error if listing domains or creating the mailbox fails.
pub async fn create_random_account(
    client: &Client,
    auth: &AuthStore,
    accounts: &AccountStore,
) -> Result<CreatedAccount> {
    let domains = client.domains().await?;
    let domain = pick_domain(&domains).unwrap_or_else(|| {
        warn!("No active domain listed, using {}", FALLBACK_DOMAIN);
        FALLBACK_DOMAIN.to_string()
    });
    let address = format!("{}@{domain}", random_string(LOCAL_PART_CHARS, LOCAL_PART_LEN));
    let password = random_string(PASSWORD_CHARS, PASSWORD_LEN);

    create_account(client, auth, accounts, &address, &password).await
}

/// Logs into a mailbox and makes it the current session.
///
/// # Errors
///
/// Returns an error if the input is invalid, the credentials are rejected,
/// or the session cannot be stored.
pub async fn login(
    client: &Client,
    auth: &AuthStore,
    address: &str,
    password: &str,
) -> Result<AuthState> {
    validate_login(address, password).map_err(Error::Validation)?;

    let address = address.trim();
    let token = client.login(address, password).await?;
    let state = AuthState {
        token: token.token,
        account_id: token.id,
        address: address.to_string(),
    };
    auth.set(state.clone()).await?;
    Ok(state)
}

/// Logs into a stored mailbox, found by address or id.
///
/// # Errors
///
/// Returns [`Error::AccountNotFound`] if no stored mailbox matches, or the
/// login failure.
pub async fn login_stored(
    client: &Client,
    auth: &AuthStore,
    accounts: &AccountStore,
    key: &str,
) -> Result<AuthState> {
    let account = accounts
        .find(key)
        .await?
        .ok_or_else(|| Error::AccountNotFound(key.to_string()))?;
    login(client, auth, &account.address, &account.password).await
}

/// Fetches the logged-in account.
///
/// # Errors
///
/// Returns [`Error::NotAuthenticated`] if nobody is logged in, or the
/// request failure.
pub async fn current_account(client: &Client, auth: &AuthStore) -> Result<Account> {
    let state = auth.require()?;
    let account = auth.client(client)?.account(&state.account_id).await?;
    Ok(account)
}

/// Deletes the logged-in mailbox remotely, forgets it and logs out.
///
/// # Errors
///
/// Returns [`Error::NotAuthenticated`] if nobody is logged in, or the
/// request failure. Nothing local changes if the remote delete fails.
pub async fn delete_current_account(
    client: &Client,
    auth: &AuthStore,
    accounts: &AccountStore,
) -> Result<()> {
    let state = auth.require()?;
    auth.client(client)?.delete_account(&state.account_id).await?;
    info!("Deleted mailbox {}", state.address);

    accounts.remove(&state.account_id).await?;
    auth.clear().await
}

fn pick_domain(domains: &[Domain]) -> Option<String> {
    let active: Vec<&Domain> = domains.iter().filter(|d| d.is_active).collect();
    active
        .choose(&mut rand::thread_rng())
        .map(|d| d.domain.clone())
}

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(charset[rng.gen_range(0..charset.len())]))
        .collect()
}
