//! CLI subcommands and the wiring they share

pub mod auth;
pub mod census;
pub mod config;
pub mod ledger;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use drivemirror_core::config::Config;
use drivemirror_core::domain::RemoteId;
use drivemirror_core::ports::ICredentialProvider;
use drivemirror_gdrive::auth::{KeyringTokenProvider, OAuth2Config, StaticTokenProvider};
use drivemirror_gdrive::client::DriveClient;
use drivemirror_gdrive::provider::DriveRemoteStore;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global options every command runs with
pub struct CommandContext {
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    pub fn new(config_path: PathBuf, format: OutputFormat, quiet: bool) -> Self {
        Self {
            config_path,
            format,
            quiet,
        }
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Configuration at `config_path`, defaults when the file does not exist
    ///
    /// # Errors
    /// Returns the read or parse error of an existing file.
    pub fn config(&self) -> Result<Config> {
        if !self.config_path.exists() {
            info!(config_path = %self.config_path.display(), "No configuration file, using defaults");
            return Ok(Config::default());
        }

        let config = Config::load(&self.config_path).with_context(|| {
            format!(
                "Failed to load configuration from {}",
                self.config_path.display()
            )
        })?;
        info!(config_path = %self.config_path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Configuration that passed validation
    pub fn validated_config(&self) -> Result<Config> {
        let config = self.config()?;
        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!(
                "Invalid configuration ({}): {}",
                self.config_path.display(),
                messages.join("; ")
            );
        }
        Ok(config)
    }
}

/// Credential provider chosen by configuration
///
/// A static token (config or environment) wins; otherwise tokens come from
/// the keyring and are refreshed when OAuth client credentials are set.
pub fn credentials(config: &Config) -> Result<Arc<dyn ICredentialProvider>> {
    if let Some(token) = config.static_access_token() {
        info!("Using static access token");
        return Ok(Arc::new(StaticTokenProvider::new(token)));
    }

    let oauth = match (&config.auth.client_id, &config.auth.client_secret) {
        (Some(id), Some(secret)) => Some(OAuth2Config::new(id.clone(), secret.clone())),
        _ => None,
    };
    info!(account = %config.auth.account, refresh = oauth.is_some(), "Using keyring tokens");
    Ok(Arc::new(KeyringTokenProvider::new(
        config.auth.account.clone(),
        oauth.as_ref(),
    )?))
}

/// Drive adapter for the configured shared drive
pub fn remote_store(config: &Config) -> Result<DriveRemoteStore> {
    let drive_id = config
        .sync
        .drive_id
        .clone()
        .context("sync.drive_id is not set")?;
    let drive_id = RemoteId::new(drive_id).context("Invalid sync.drive_id")?;

    let client = DriveClient::with_base_url(credentials(config)?, config.api.base_url.clone())
        .with_max_retries(config.api.max_retries);
    Ok(DriveRemoteStore::new(client, drive_id))
}
