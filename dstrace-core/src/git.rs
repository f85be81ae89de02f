//! Repository metadata from the `git` executable.

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, error, info};

use crate::contract::GitMetadata;
use crate::error::GitError;

/// A working tree queried through `git -C <root> ...`.
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Raw stdout of `git -C <root> <args>`.
    fn output(&self, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| {
                error!(error = ?e, args = ?args, "Failed to launch git process");
                GitError::Launch(e)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(args = ?args, status = %output.status, stderr = %stderr, "git exited with non-zero code");
            return Err(GitError::Command {
                args: args.join(" "),
                status: output.status,
                stderr,
            });
        }
        debug!(args = ?args, "git command succeeded");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn git(&self, args: &[&str]) -> Result<String, GitError> {
        Ok(self.output(args)?.trim().to_string())
    }

    fn lines(&self, args: &[&str]) -> Result<Vec<String>, GitError> {
        Ok(self
            .git(args)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Paths from a `-z` listing, taken verbatim (no quoting, no trimming).
    fn paths(&self, args: &[&str]) -> Result<Vec<String>, GitError> {
        Ok(self
            .output(args)?
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Directory git runs hooks from. Follows `core.hooksPath` and linked
    /// worktrees; fails when `root` is not inside a repository.
    pub fn hooks_dir(&self) -> Result<PathBuf, GitError> {
        let dir = PathBuf::from(self.git(&["rev-parse", "--git-path", "hooks"])?);
        Ok(if dir.is_absolute() {
            dir
        } else {
            self.root.join(dir)
        })
    }

    /// The one URL of the one configured remote.
    pub fn remote_url(&self) -> Result<String, GitError> {
        let remotes = self.lines(&["remote"])?;
        let remote = match remotes.as_slice() {
            [] => return Err(GitError::NoRemote),
            [single] => single,
            many => return Err(GitError::MultipleRemotes(many.len())),
        };
        let urls = self.lines(&["remote", "get-url", "--all", remote])?;
        match urls.as_slice() {
            [] => Err(GitError::NoRemote),
            [url] => Ok(url.clone()),
            many => Err(GitError::MultipleRemotes(many.len())),
        }
    }

    pub fn last_commit_hash(&self) -> Result<String, GitError> {
        self.git(&["rev-parse", "HEAD"])
    }
}

impl GitMetadata for GitRepo {
    fn last_commit_url(&self) -> Result<String, GitError> {
        let url = commit_url(&self.remote_url()?, &self.last_commit_hash()?);
        info!(url = %url, "Resolved last commit URL");
        Ok(url)
    }

    fn active_branch(&self) -> Result<String, GitError> {
        let branch = self.git(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch == "HEAD" {
            return Err(GitError::DetachedHead);
        }
        Ok(branch)
    }

    fn staged_files(&self) -> Result<Vec<String>, GitError> {
        self.paths(&["diff", "--cached", "--name-only", "-z"])
    }

    fn changed_files_since_last_push(&self) -> Result<Vec<String>, GitError> {
        let upstream = format!("origin/{}", self.active_branch()?);
        self.paths(&["diff", "--name-only", "-z", &upstream])
    }
}

/// Web URL of `hash` for a remote URL.
///
/// SSH remotes are rewritten to HTTPS: `git@host:org/repo.git` and
/// `ssh://git@host/org/repo.git` both become `https://host/org/repo`.
pub fn commit_url(remote: &str, hash: &str) -> String {
    let remote = remote.trim().trim_end_matches('/');
    let remote = remote.strip_suffix(".git").unwrap_or(remote);

    let base = if let Some(rest) = remote.strip_prefix("ssh://") {
        let rest = rest.split_once('@').map_or(rest, |(_, host)| host);
        format!("https://{rest}")
    } else if let Some(rest) = remote.strip_prefix("git@") {
        format!("https://{}", rest.replacen(':', "/", 1))
    } else {
        remote.to_string()
    };

    format!("{base}/commit/{hash}")
}
