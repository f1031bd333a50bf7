//! Auth commands - Import, Status and Logout for Drive credentials
//!
//! Provides the `drivemirror auth` CLI subcommands which:
//! 1. `import` - Reads an authorized user JSON file and stores its tokens in
//!    the system keyring under the configured account.
//! 2. `status` - Shows which credential source a run would use and whether
//!    the stored token is still valid.
//! 3. `logout` - Clears the stored tokens from the keyring.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use drivemirror_core::config::Config;
use drivemirror_core::ports::Tokens;
use drivemirror_gdrive::auth::{AuthorizedUser, KeyringTokenStorage};

use super::CommandContext;
use crate::output::OutputFormatter;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Import tokens from an authorized user JSON file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Check authentication status
    Status,
    /// Remove stored credentials
    Logout,
}

/// State of the keyring entry for an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenState {
    Valid,
    /// Expired, but a refresh token is available
    Refreshable,
    Expired,
    Missing,
}

impl TokenState {
    fn of(tokens: Option<&Tokens>) -> Self {
        match tokens {
            None => TokenState::Missing,
            Some(t) if !t.is_expired() => TokenState::Valid,
            Some(t) if t.refresh_token.is_some() => TokenState::Refreshable,
            Some(_) => TokenState::Expired,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TokenState::Valid => "valid",
            TokenState::Refreshable => "expired (refreshable)",
            TokenState::Expired => "expired",
            TokenState::Missing => "not found",
        }
    }
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let fmt = ctx.formatter();
        let config = ctx.config()?;
        match self {
            AuthCommand::Import { file } => self.execute_import(file, &config, ctx, &*fmt).await,
            AuthCommand::Status => self.execute_status(&config, ctx, &*fmt),
            AuthCommand::Logout => self.execute_logout(&config, ctx, &*fmt),
        }
    }

    async fn execute_import(
        &self,
        file: &Path,
        config: &Config,
        ctx: &CommandContext,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let raw = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let user = AuthorizedUser::parse(&raw)?;

        let account = &config.auth.account;
        info!(account = %account, file = %file.display(), "Importing tokens");
        KeyringTokenStorage::store(account, &user.tokens)
            .context("Failed to store tokens in keyring")?;

        let hints = client_hints(config, &user);

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "success": true,
                "account": account,
                "expires_at": user.tokens.expires_at.to_rfc3339(),
                "has_refresh_token": user.tokens.refresh_token.is_some(),
                "hints": hints,
            }));
        } else {
            fmt.success(&format!("Stored tokens for account '{account}'"));
            fmt.info(&format!(
                "Access token expires {}",
                user.tokens.expires_at.to_rfc3339()
            ));
            for hint in &hints {
                fmt.warn(hint);
            }
        }
        Ok(())
    }

    fn execute_status(
        &self,
        config: &Config,
        ctx: &CommandContext,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let account = &config.auth.account;
        let static_token = config.static_access_token().is_some();
        let refresh_enabled = config.auth.client_id.is_some() && config.auth.client_secret.is_some();

        let (state, keyring_error) = match KeyringTokenStorage::load(account) {
            Ok(tokens) => (Some(TokenState::of(tokens.as_ref())), None),
            Err(e) => (None, Some(format!("{e:#}"))),
        };

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({
                "account": account,
                "static_token": static_token,
                "refresh_enabled": refresh_enabled,
                "keyring": state.map(TokenState::as_str),
                "keyring_error": keyring_error,
            }));
            return Ok(());
        }

        if static_token {
            fmt.success("Using a static access token (config or environment)");
        }
        match (state, keyring_error) {
            (Some(TokenState::Valid), _) => fmt.success(&format!("Account '{account}': token valid")),
            (Some(TokenState::Refreshable), _) if refresh_enabled => fmt.success(&format!(
                "Account '{account}': token expired, will be refreshed on next run"
            )),
            (Some(TokenState::Refreshable), _) => {
                fmt.warn(&format!("Account '{account}': token expired"));
                fmt.info("Set auth.client_id and auth.client_secret to enable refresh.");
            }
            (Some(TokenState::Expired), _) => {
                fmt.warn(&format!("Account '{account}': token expired, no refresh token"));
                fmt.info("Run 'drivemirror auth import <file>' with fresh credentials.");
            }
            (Some(TokenState::Missing), _) => {
                if !static_token {
                    fmt.error(&format!("Account '{account}': no stored credentials"));
                    fmt.info("Run 'drivemirror auth import <file>' to authenticate.");
                }
            }
            (None, error) => {
                fmt.error(&format!(
                    "Keyring unavailable: {}",
                    error.unwrap_or_default()
                ));
            }
        }
        Ok(())
    }

    fn execute_logout(
        &self,
        config: &Config,
        ctx: &CommandContext,
        fmt: &dyn OutputFormatter,
    ) -> Result<()> {
        let account = &config.auth.account;
        info!(account = %account, "Logging out");
        KeyringTokenStorage::clear(account).context("Failed to clear tokens from keyring")?;

        if ctx.is_json() {
            fmt.print_json(&serde_json::json!({ "success": true, "account": account }));
        } else {
            fmt.success(&format!("Removed stored credentials for '{account}'"));
        }
        Ok(())
    }
}

/// Warnings about client credentials present in the file but not configured
fn client_hints(config: &Config, user: &AuthorizedUser) -> Vec<String> {
    let mut hints = Vec::new();
    if user.tokens.refresh_token.is_none() {
        hints.push("The file has no refresh_token; re-import once the token expires.".to_string());
        return hints;
    }
    if config.auth.client_id.is_none() && user.client_id.is_some() {
        hints.push(
            "The file carries a client_id; set auth.client_id in the configuration to enable refresh."
                .to_string(),
        );
    }
    if config.auth.client_secret.is_none() && user.client_secret.is_some() {
        hints.push(
            "The file carries a client_secret; set auth.client_secret in the configuration to enable refresh."
                .to_string(),
        );
    }
    hints
}
