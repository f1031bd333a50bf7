//! Configuration module for DriveMirror.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::naming::{
    DEFAULT_COMPONENT_LIMIT, DEFAULT_MAX_NAME_LENGTH, DEFAULT_MAX_PATH_LENGTH,
};
use crate::domain::RemoteId;

/// Environment variable that supplies a static bearer token.
pub const ACCESS_TOKEN_ENV: &str = "DRIVEMIRROR_ACCESS_TOKEN";

/// Default Google Drive v3 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DriveMirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub ledger: LedgerConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
}

/// Mirror settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory of the local mirror.
    pub root: PathBuf,
    /// Shared drive to mirror. Required.
    pub drive_id: Option<String>,
    /// Folder to start from; the drive root when unset.
    pub root_folder_id: Option<String>,
    /// Paths longer than this (in characters) get their components truncated.
    pub max_path_length: usize,
    /// Length each path component is cut to when a path is too long.
    pub component_limit: usize,
    /// Maximum length of a sanitized item name.
    pub max_name_length: usize,
}

/// Metadata ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path of the JSON ledger file.
    pub path: PathBuf,
}

/// Run report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory receiving `backup_report_*.txt` files.
    pub dir: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth client ID, needed to refresh keyring tokens.
    pub client_id: Option<String>,
    /// OAuth client secret matching `client_id`.
    pub client_secret: Option<String>,
    /// Keyring account the tokens are stored under.
    pub account: String,
    /// Static bearer token. Overridden by `DRIVEMIRROR_ACCESS_TOKEN`.
    pub access_token: Option<String>,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the Drive v3 API.
    pub base_url: String,
    /// Retries for throttled (429) or failed (5xx) requests.
    pub max_retries: u32,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/drivemirror/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("drivemirror")
            .join("config.yaml")
    }

    /// Static access token, preferring the environment over the file.
    pub fn static_access_token(&self) -> Option<String> {
        self.auth
            .resolve_access_token(std::env::var(ACCESS_TOKEN_ENV).ok())
    }
}

impl SyncConfig {
    /// Folder the traversal starts from: `root_folder_id`, else `drive_id`.
    pub fn start_folder(&self) -> Option<&str> {
        self.root_folder_id
            .as_deref()
            .or(self.drive_id.as_deref())
    }
}

impl AuthConfig {
    /// Pick the token from `env_value` when set and non-empty, else from the file.
    pub fn resolve_access_token(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.access_token.clone())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Expand a leading `~` to the home directory; other paths are returned as-is.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("drivemirror")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("DriveMirror"),
            drive_id: None,
            root_folder_id: None,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            component_limit: DEFAULT_COMPONENT_LIMIT,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("metadata").join("file_metadata.json"),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: data_dir().join("reports"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            account: "default".to_string(),
            access_token: None,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            max_retries: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.drive_id"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `api.max_retries`.
const MAX_RETRIES_LIMIT: u32 = 10;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        match self.sync.drive_id.as_deref() {
            None | Some("") => errors.push(ValidationError {
                field: "sync.drive_id".into(),
                message: "must be set to the shared drive ID".into(),
            }),
            Some(id) => {
                if let Err(e) = RemoteId::new(id.to_string()) {
                    errors.push(ValidationError {
                        field: "sync.drive_id".into(),
                        message: e.to_string(),
                    });
                }
            }
        }
        if let Some(id) = self.sync.root_folder_id.as_deref() {
            if let Err(e) = RemoteId::new(id.to_string()) {
                errors.push(ValidationError {
                    field: "sync.root_folder_id".into(),
                    message: e.to_string(),
                });
            }
        }

        // Tilde paths are expanded by the shell or at runtime; only reject relative ones.
        let root_str = self.sync.root.to_string_lossy();
        if !root_str.starts_with('~') && !self.sync.root.is_absolute() {
            errors.push(ValidationError {
                field: "sync.root".into(),
                message: format!("must be an absolute path: {}", self.sync.root.display()),
            });
        }
        if self.sync.max_name_length == 0 {
            errors.push(ValidationError {
                field: "sync.max_name_length".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.component_limit == 0 {
            errors.push(ValidationError {
                field: "sync.component_limit".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.max_path_length <= self.sync.component_limit {
            errors.push(ValidationError {
                field: "sync.max_path_length".into(),
                message: format!(
                    "max_path_length ({}) must exceed component_limit ({})",
                    self.sync.max_path_length, self.sync.component_limit
                ),
            });
        }

        // --- ledger / reports ---
        if self.ledger.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "ledger.path".into(),
                message: "must not be empty".into(),
            });
        }
        if self.reports.dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "reports.dir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- auth ---
        if self.auth.client_id.is_some() != self.auth.client_secret.is_some() {
            errors.push(ValidationError {
                field: "auth.client_secret".into(),
                message: "client_id and client_secret must be set together".into(),
            });
        }
        if self.auth.account.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.account".into(),
                message: "must not be empty".into(),
            });
        }

        // --- api ---
        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://"))
        {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: format!("must be an http(s) URL: {}", self.api.base_url),
            });
        }
        if self.api.max_retries > MAX_RETRIES_LIMIT {
            errors.push(ValidationError {
                field: "api.max_retries".into(),
                message: format!("must be at most {MAX_RETRIES_LIMIT}"),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use drivemirror_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .sync_root(PathBuf::from("/srv/mirror"))
///     .sync_drive_id("0ANrqIuJZcnvTUk9PVA")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn sync_drive_id(mut self, drive_id: impl Into<String>) -> Self {
        self.config.sync.drive_id = Some(drive_id.into());
        self
    }

    pub fn sync_root_folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.config.sync.root_folder_id = Some(folder_id.into());
        self
    }

    pub fn sync_max_path_length(mut self, n: usize) -> Self {
        self.config.sync.max_path_length = n;
        self
    }

    pub fn sync_component_limit(mut self, n: usize) -> Self {
        self.config.sync.component_limit = n;
        self
    }

    pub fn sync_max_name_length(mut self, n: usize) -> Self {
        self.config.sync.max_name_length = n;
        self
    }

    // --- ledger / reports ---

    pub fn ledger_path(mut self, path: PathBuf) -> Self {
        self.config.ledger.path = path;
        self
    }

    pub fn reports_dir(mut self, dir: PathBuf) -> Self {
        self.config.reports.dir = dir;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- auth ---

    pub fn auth_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.config.auth.client_id = Some(client_id.into());
        self.config.auth.client_secret = Some(client_secret.into());
        self
    }

    pub fn auth_account(mut self, account: impl Into<String>) -> Self {
        self.config.auth.account = account.into();
        self
    }

    pub fn auth_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth.access_token = Some(token.into());
        self
    }

    // --- api ---

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn api_max_retries(mut self, n: u32) -> Self {
        self.config.api.max_retries = n;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
