//! Credential providers for the publish call.

use tracing::{debug, error};

use crate::config::DstraceConfig;
use crate::contract::{CredentialProvider, Credentials};
use crate::error::CredentialError;

pub const USERNAME_ENV: &str = "CONFLUENCE_API_USERNAME";
pub const TOKEN_ENV: &str = "CONFLUENCE_API_TOKEN";

/// Environment first, then `.dstracelocal` values.
pub struct EnvCredentialProvider {
    username: Option<String>,
    token: Option<String>,
}

impl EnvCredentialProvider {
    pub fn from_config(config: &DstraceConfig) -> Self {
        Self {
            username: config.confluence_api_username.clone(),
            token: config.confluence_api_token.clone(),
        }
    }
}

fn lookup(env_key: &str, fallback: &Option<String>) -> Option<String> {
    std::env::var(env_key)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.clone().filter(|v| !v.is_empty()))
}

impl CredentialProvider for EnvCredentialProvider {
    fn credentials(&self) -> Result<Credentials, CredentialError> {
        let username = lookup(USERNAME_ENV, &self.username).ok_or_else(|| {
            error!(env = USERNAME_ENV, "Confluence API username missing");
            CredentialError::Missing("username")
        })?;
        let token = lookup(TOKEN_ENV, &self.token).ok_or_else(|| {
            error!(env = TOKEN_ENV, "Confluence API token missing");
            CredentialError::Missing("token")
        })?;
        debug!(username = %username, "Resolved Confluence credentials");
        Ok(Credentials { username, token })
    }
}

/// Fixed credentials.
pub struct StaticCredentials(pub Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self(Credentials {
            username: username.into(),
            token: token.into(),
        })
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials, CredentialError> {
        Ok(self.0.clone())
    }
}
