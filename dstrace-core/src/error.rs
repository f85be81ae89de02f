//! Error types for the dstrace core library.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the notebook transform pipeline.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to read notebook {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document text is not a notebook (bad JSON, missing `cells`, ...).
    #[error("Malformed notebook document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Commit URL annotation is enabled but no commit URL was supplied")]
    MissingCommitUrl,

    #[error("Failed to write temporary notebook: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to remove temporary notebook: {0}")]
    Cleanup(#[source] std::io::Error),
}

/// Failures while querying the local git repository.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to launch git: {0}")]
    Launch(#[from] std::io::Error),

    #[error("git {args} exited with {status}: {stderr}")]
    Command {
        args: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("No git remote is configured")]
    NoRemote,

    #[error("Multiple remotes are not supported (found {0})")]
    MultipleRemotes(usize),

    #[error("HEAD is detached; publishing requires an active branch")]
    DetachedHead,
}

/// Failures while installing git hooks or editing `.gitignore`.
#[derive(Error, Debug)]
pub enum HookError {
    #[error(
        "DSTrace {alias} hook already exists in this repository. \
         Remove the existing {alias} hook (or its DSTrace block) and rerun `dstrace init`."
    )]
    AlreadyInstalled { alias: String },

    #[error("Hook file I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hooks directory could not be resolved (e.g. not a git repository).
    #[error(transparent)]
    Git(#[from] GitError),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Confluence API {0} is not configured (set the environment variable or .dstracelocal)")]
    Missing(&'static str),
}

/// Failures of the pre-commit notebook conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status} for {path:?}")]
    Failed {
        program: &'static str,
        status: std::process::ExitStatus,
        path: PathBuf,
    },

    #[error(transparent)]
    Git(#[from] GitError),
}
