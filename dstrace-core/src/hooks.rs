//! Git hook installation and `.gitignore` upkeep for `dstrace init`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::HookError;
use crate::git::GitRepo;

pub const BLOCK_BEGIN: &str = "#[DSTrace begin]";
pub const BLOCK_END: &str = "#[DSTrace end]";

/// A hook dstrace can install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    PreCommit,
    PrePush,
}

impl Hook {
    /// File name under `.git/hooks`.
    pub fn alias(self) -> &'static str {
        match self {
            Hook::PreCommit => "pre-commit",
            Hook::PrePush => "pre-push",
        }
    }

    /// dstrace subcommand the hook runs.
    pub fn handler(self) -> &'static str {
        // subcommands share the hook names
        self.alias()
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> HookError + '_ {
    move |source| HookError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Install `hook` in `git`'s hooks directory, running `command`. Returns the
/// hook file path.
pub fn install(git: &GitRepo, hook: Hook, command: &str) -> Result<PathBuf, HookError> {
    let dir = git.hooks_dir()?;
    // a fresh core.hooksPath may not exist yet
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;
    let path = dir.join(hook.alias());
    install_hook(&path, hook.alias(), hook.handler(), command)?;
    Ok(path)
}

/// Write (or append) a marked block to the hook file at `path` that execs
/// `<command> <handler>`. Refuses to touch a hook that already has a block.
pub fn install_hook(path: &Path, alias: &str, handler: &str, command: &str) -> Result<(), HookError> {
    let existing = if path.exists() {
        let content = fs::read_to_string(path).map_err(io_err(path))?;
        if content.contains(BLOCK_BEGIN) && content.contains(BLOCK_END) {
            return Err(HookError::AlreadyInstalled {
                alias: alias.to_string(),
            });
        }
        Some(content)
    } else {
        None
    };

    let block = format!(
        "{BLOCK_BEGIN}\n\necho 'Calling DSTrace {alias} hook'\n{command} {handler} || exit $?\n\n{BLOCK_END}\n"
    );
    let content = match existing {
        Some(current) => format!("{}\n\n{block}", current.trim_end()),
        None => format!("#!/bin/sh\n\n{block}"),
    };
    fs::write(path, content).map_err(io_err(path))?;
    make_executable(path)?;

    info!(hook = alias, path = %path.display(), "Installed git hook");
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), HookError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path).map_err(io_err(path))?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms).map_err(io_err(path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), HookError> {
    Ok(())
}

/// Make sure `.gitignore` under `root` lists `entry`. Returns whether it was added.
pub fn ensure_gitignored(root: &Path, entry: &str) -> Result<bool, HookError> {
    let path = root.join(".gitignore");
    let current = if path.exists() {
        fs::read_to_string(&path).map_err(io_err(&path))?
    } else {
        String::new()
    };
    if current.lines().any(|l| l.trim() == entry) {
        return Ok(false);
    }

    let mut updated = current;
    updated.push_str(&format!("\n\n# DSTrace\n{entry}\n"));
    fs::write(&path, updated).map_err(io_err(&path))?;
    info!(entry, path = %path.display(), "Added entry to .gitignore");
    Ok(true)
}
