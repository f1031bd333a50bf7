//! Credential provider port (driven/secondary port)
//!
//! Supplies bearer tokens to the remote store adapter. How tokens are
//! obtained (static configuration, system keyring, refresh grant) is an
//! adapter concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Tokens struct
// ============================================================================

/// OAuth tokens for the remote API
///
/// Contains the access token for API requests, an optional refresh token
/// for obtaining new access tokens, and the expiration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for refreshing the access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: chrono::Duration) -> bool {
        Utc::now() + duration >= self.expires_at
    }
}

// ============================================================================
// ICredentialProvider trait
// ============================================================================

/// Port trait yielding a valid bearer token per call
///
/// Implementations may refresh and cache tokens internally; callers ask for
/// a token before every request and never hold on to it.
#[async_trait::async_trait]
pub trait ICredentialProvider: Send + Sync {
    async fn access_token(&self) -> anyhow::Result<String>;
}
