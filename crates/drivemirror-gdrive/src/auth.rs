//! Credentials for the Drive API
//!
//! DriveMirror does not run an interactive login. Tokens are either supplied
//! directly (configuration or environment) or imported once from an
//! "authorized user" JSON file into the system keyring, from where they are
//! refreshed with the OAuth2 refresh-token grant.
//!
//! ## Components
//!
//! - [`OAuth2Config`] - Client credentials and token endpoint
//! - [`KeyringTokenStorage`] - Secure token storage using the system keyring
//! - [`RefreshFlow`] - OAuth2 refresh-token exchange
//! - [`StaticTokenProvider`] - Fixed bearer token
//! - [`KeyringTokenProvider`] - Keyring-backed tokens with automatic refresh
//! - [`AuthorizedUser`] - Parser for authorized user JSON files

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use drivemirror_core::ports::{ICredentialProvider, Tokens};
use oauth2::{
    basic::BasicClient, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::DriveError;

/// Google OAuth2 token endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "drivemirror";

/// Tokens this close to expiry are refreshed before use
const REFRESH_MARGIN_SECS: i64 = 60;

// ============================================================================
// OAuth2Config
// ============================================================================

/// Client credentials for the refresh-token grant
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (installed-app secrets are not confidential)
    pub client_secret: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuth2Config {
    /// Creates a new OAuth2Config against the Google token endpoint
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Creates a config with a custom token endpoint
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

// ============================================================================
// Token storage
// ============================================================================

/// Where tokens are persisted between runs
pub trait TokenStorage: Send + Sync {
    fn load(&self, account: &str) -> Result<Option<Tokens>>;

    fn store(&self, account: &str, tokens: &Tokens) -> Result<()>;
}

/// Stores and retrieves OAuth tokens from the system keyring
///
/// Uses the `keyring` crate to store tokens securely in the OS credential
/// store (e.g., GNOME Keyring, KDE Wallet, macOS Keychain).
/// Tokens are serialized as JSON with the service name "drivemirror" and the
/// configured account as the username.
pub struct KeyringTokenStorage;

impl KeyringTokenStorage {
    /// Stores tokens in the system keyring for the given account
    pub fn store(account: &str, tokens: &Tokens) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, account)
            .context("Failed to create keyring entry")?;

        let json = serde_json::to_string(tokens).context("Failed to serialize tokens")?;

        entry
            .set_password(&json)
            .context("Failed to store tokens in keyring")?;

        debug!(account, "Stored tokens in keyring");
        Ok(())
    }

    /// Loads tokens from the system keyring for the given account
    ///
    /// # Returns
    /// `Some(Tokens)` if found and valid, `None` if not found
    pub fn load(account: &str) -> Result<Option<Tokens>> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, account)
            .context("Failed to create keyring entry")?;

        match entry.get_password() {
            Ok(json) => {
                let tokens: Tokens = serde_json::from_str(&json)
                    .context("Failed to deserialize tokens from keyring")?;
                debug!(account, "Loaded tokens from keyring");
                Ok(Some(tokens))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account, "No tokens found in keyring");
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read from keyring")),
        }
    }

    /// Removes tokens from the system keyring for the given account
    pub fn clear(account: &str) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, account)
            .context("Failed to create keyring entry")?;

        match entry.delete_credential() {
            Ok(()) => {
                info!(account, "Cleared tokens from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!(account, "No tokens to clear");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete from keyring")),
        }
    }
}

impl TokenStorage for KeyringTokenStorage {
    fn load(&self, account: &str) -> Result<Option<Tokens>> {
        KeyringTokenStorage::load(account)
    }

    fn store(&self, account: &str, tokens: &Tokens) -> Result<()> {
        KeyringTokenStorage::store(account, tokens)
    }
}

// ============================================================================
// RefreshFlow
// ============================================================================

/// OAuth2 refresh-token exchange using the `oauth2` crate
pub struct RefreshFlow {
    client: BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
}

impl RefreshFlow {
    /// Creates a new RefreshFlow with the given configuration
    pub fn new(config: &OAuth2Config) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_token_uri(TokenUrl::new(config.token_url.clone()).context("Invalid token URL")?);

        Ok(Self { client })
    }

    /// Exchanges a refresh token for a fresh access token
    ///
    /// Google does not rotate refresh tokens, so the one passed in is kept
    /// when the response carries none.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Tokens> {
        info!("Refreshing access token");

        let http_client = reqwest::Client::new();
        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .context("Failed to refresh token")?;

        let expires_at = token_result
            .expires_in()
            .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Utc::now() + Duration::hours(1));

        let tokens = Tokens {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or_else(|| Some(refresh_token.to_string())),
            expires_at,
        };

        info!("Successfully refreshed access token");
        Ok(tokens)
    }
}

// ============================================================================
// Credential providers
// ============================================================================

/// Fixed bearer token from configuration or environment
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl ICredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Tokens from a [`TokenStorage`], refreshed shortly before they expire
///
/// Refreshed tokens are written back to the storage so the next run starts
/// from them.
pub struct KeyringTokenProvider {
    account: String,
    storage: Arc<dyn TokenStorage>,
    flow: Option<RefreshFlow>,
    cached: Mutex<Option<Tokens>>,
}

impl KeyringTokenProvider {
    /// Creates a provider reading the system keyring
    ///
    /// # Arguments
    /// * `account` - Keyring username the tokens are stored under
    /// * `oauth` - Client credentials; without them expired tokens cannot be refreshed
    pub fn new(account: impl Into<String>, oauth: Option<&OAuth2Config>) -> Result<Self> {
        Self::with_storage(account, oauth, Arc::new(KeyringTokenStorage))
    }

    /// Creates a provider over an arbitrary token storage
    pub fn with_storage(
        account: impl Into<String>,
        oauth: Option<&OAuth2Config>,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self> {
        let flow = oauth.map(RefreshFlow::new).transpose()?;
        Ok(Self {
            account: account.into(),
            storage,
            flow,
            cached: Mutex::new(None),
        })
    }
}

#[async_trait::async_trait]
impl ICredentialProvider for KeyringTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if cached.is_none() {
            let loaded = self.storage.load(&self.account)?.ok_or_else(|| {
                DriveError::NoCredentials(format!(
                    "no tokens stored for account '{}'; run `drivemirror auth import <file>`",
                    self.account
                ))
            })?;
            *cached = Some(loaded);
        }

        let Some(tokens) = cached.as_ref() else {
            return Err(DriveError::NoCredentials(self.account.clone()).into());
        };

        if !tokens.expires_within(Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(tokens.access_token.clone());
        }

        let current = tokens.access_token.clone();
        let expired = tokens.is_expired();
        let refresh_token = tokens.refresh_token.clone();

        match (&self.flow, refresh_token) {
            (Some(flow), Some(refresh_token)) => {
                let refreshed = flow.refresh_token(&refresh_token).await?;
                if let Err(e) = self.storage.store(&self.account, &refreshed) {
                    warn!(account = %self.account, error = %e, "Failed to persist refreshed tokens");
                }
                let token = refreshed.access_token.clone();
                *cached = Some(refreshed);
                Ok(token)
            }
            _ if expired => Err(DriveError::TokenExpired(self.account.clone()).into()),
            _ => {
                warn!(account = %self.account, "Access token about to expire and cannot be refreshed");
                Ok(current)
            }
        }
    }
}

// ============================================================================
// AuthorizedUser import
// ============================================================================

/// Contents of an "authorized user" JSON file
///
/// Matches the file written by Google's Python auth libraries
/// (`Credentials.to_json()`), which carries the access token under `token`.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub tokens: Tokens,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorizedUserFile {
    #[serde(alias = "access_token")]
    token: Option<String>,
    refresh_token: Option<String>,
    expiry: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl AuthorizedUser {
    /// Parse an authorized user JSON document
    ///
    /// A missing `expiry` is treated as already expired, so the first use
    /// triggers a refresh.
    pub fn parse(json: &str) -> Result<Self> {
        let file: AuthorizedUserFile =
            serde_json::from_str(json).context("Failed to parse authorized user JSON")?;

        if file.token.is_none() && file.refresh_token.is_none() {
            anyhow::bail!("Authorized user JSON contains neither a token nor a refresh_token");
        }

        let expires_at = match file.expiry.as_deref() {
            Some(raw) => parse_expiry(raw)?,
            None => Utc::now(),
        };

        Ok(Self {
            tokens: Tokens {
                access_token: file.token.unwrap_or_default(),
                refresh_token: file.refresh_token,
                expires_at,
            },
            client_id: file.client_id,
            client_secret: file.client_secret,
        })
    }
}

/// Expiry timestamps come either as RFC 3339 or as naive UTC
fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Invalid expiry timestamp: {raw}"))
}
