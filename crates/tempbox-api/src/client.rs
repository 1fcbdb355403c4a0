//! HTTP client for the mail.gw REST API.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{
    Account, Collection, Credentials, Domain, Message, MessageSummary, Token, error_description,
};

/// Public mail.gw endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mail.gw";

/// Upper bound on one request, connect included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-LD media type; makes the service wrap collections in `hydra:member`.
const LD_JSON: &str = "application/ld+json";

/// Media type the service requires for partial updates.
const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

/// Client for one mail.gw endpoint, optionally bound to a mailbox token.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl Client {
    /// Creates a client for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client for a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("tempbox/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url,
            token: None,
            http_client,
        })
    }

    /// Binds the client to a mailbox token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the endpoint base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Lists the domains addresses can be created at.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        let request = self.http_client.get(self.endpoint("domains")?);
        let domains: Collection<Domain> = self.send_json(request).await?;
        Ok(domains.members)
    }

    /// Registers a new mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is taken or the request fails.
    pub async fn create_account(&self, address: &str, password: &str) -> Result<Account> {
        let request = self
            .http_client
            .post(self.endpoint("accounts")?)
            .json(&Credentials { address, password });
        let account: Account = self.send_json(request).await?;
        debug!("Created account {}", account.address);
        Ok(account)
    }

    /// Exchanges mailbox credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    pub async fn login(&self, address: &str, password: &str) -> Result<Token> {
        let request = self
            .http_client
            .post(self.endpoint("token")?)
            .json(&Credentials { address, password });
        self.send_json(request).await
    }

    /// Fetches account details.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token or the request fails.
    pub async fn account(&self, id: &str) -> Result<Account> {
        let request = self.authorized(self.http_client.get(self.endpoint(&format!("accounts/{id}"))?))?;
        self.send_json(request).await
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token or the request fails.
    pub async fn delete_account(&self, id: &str) -> Result<()> {
        let request =
            self.authorized(self.http_client.delete(self.endpoint(&format!("accounts/{id}"))?))?;
        self.send(request).await.map(drop)
    }

    /// Lists the messages in the mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token or the request fails.
    pub async fn list_messages(&self) -> Result<Vec<MessageSummary>> {
        let request = self.authorized(self.http_client.get(self.endpoint("messages")?))?;
        let messages: Collection<MessageSummary> = self.send_json(request).await?;
        debug!(
            "Listed {} of {} messages",
            messages.members.len(),
            messages.total_items
        );
        Ok(messages.members)
    }

    /// Fetches one message.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token or the request fails.
    pub async fn message(&self, id: &str) -> Result<Message> {
        let request =
            self.authorized(self.http_client.get(self.endpoint(&format!("messages/{id}"))?))?;
        self.send_json(request).await
    }

    /// Marks a message as read.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token or the request fails.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        let body = serde_json::to_vec(&serde_json::json!({ "seen": true }))?;
        let request = self.authorized(
            self.http_client
                .patch(self.endpoint(&format!("messages/{id}"))?)
                .header(CONTENT_TYPE, MERGE_PATCH_JSON)
                .body(body),
        )?;
        self.send(request).await.map(drop)
    }

    /// Deletes a message.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token or the request fails.
    pub async fn delete_message(&self, id: &str) -> Result<()> {
        let request =
            self.authorized(self.http_client.delete(self.endpoint(&format!("messages/{id}"))?))?;
        self.send(request).await.map(drop)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(Into::into)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(Error::MissingToken)?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.header(ACCEPT, LD_JSON).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_description(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        debug!("Request failed with {}: {}", status.as_u16(), message);
        Err(Error::status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }
}
