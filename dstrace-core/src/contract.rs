//! # contract: capability interfaces at the edges of the pipeline
//!
//! The batch publisher only talks to the outside world through the traits in
//! this module:
//! - [`Publisher`] pushes a transformed notebook file to a wiki page.
//! - [`CredentialProvider`] supplies the username/token pair for that call.
//! - [`GitMetadata`] answers questions about the working repository.
//!
//! Real implementations live in [`crate::git`], [`crate::credentials`] and the
//! CLI crate's Confluence client. All three traits are annotated for `mockall`
//! so tests can script them.

use std::path::Path;

use async_trait::async_trait;
use mockall::automock;

use crate::error::{CredentialError, GitError};

/// Boxed error returned by publisher implementations.
pub type PublishError = Box<dyn std::error::Error + Send + Sync>;

/// API credentials for the publish call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Everything a publisher needs for one page update.
pub struct PublishRequest<'a> {
    /// Path of the already transformed notebook file.
    pub source: &'a Path,
    /// Target page identifier (a Confluence page URL).
    pub target: &'a str,
    pub credentials: &'a Credentials,
}

/// What the publisher reports back after a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPage {
    pub page_id: String,
    pub title: String,
    pub version: u64,
}

/// Pushes a notebook document to its publish target.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish<'a>(&self, req: PublishRequest<'a>) -> Result<PublishedPage, PublishError>;
}

/// Supplies publish credentials without prompting.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials, CredentialError>;
}

/// Read-only view of the repository being published from.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait GitMetadata: Send + Sync {
    /// URL of the `HEAD` commit on the (single) remote's web UI.
    fn last_commit_url(&self) -> Result<String, GitError>;

    fn active_branch(&self) -> Result<String, GitError>;

    /// Repo-relative paths staged for the next commit.
    fn staged_files(&self) -> Result<Vec<String>, GitError>;

    /// Repo-relative paths that differ from `origin/<active branch>`.
    fn changed_files_since_last_push(&self) -> Result<Vec<String>, GitError>;
}
