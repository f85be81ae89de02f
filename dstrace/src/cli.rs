///
/// This module implements the CLI interface for dstrace: command parsing and the
/// glue between git hooks, the config files and the publish pipeline in [`dstrace-core`].
///
/// ## Commands
/// - `init`: create config files, git-ignore the local one, install hooks.
/// - `pre-commit`: convert staged notebooks to scripts (called by the pre-commit hook).
/// - `pre-push`: publish notebooks changed since the last push (called by the pre-push hook).
/// - `publish`: publish every notebook configured for the current branch, optionally
///   restricted by a glob mask.
///
/// Keep non-trivial logic in `dstrace-core`; this module only wires it up.
///
/// [`dstrace-core`]: ../../dstrace-core/
use crate::confluence::ConfluenceClient;
use crate::load_config::{load_config, LOCAL_CONFIG_FILE};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dstrace_core::config::DstraceConfig;
use dstrace_core::contract::GitMetadata;
use dstrace_core::convert::convert_staged_notebooks;
use dstrace_core::credentials::EnvCredentialProvider;
use dstrace_core::git::GitRepo;
use dstrace_core::hooks::{self, Hook};
use dstrace_core::publish::{
    batch_publish, filter_pages, pages_on_branch, pages_to_update, PageSelection, PublishReport,
};
use std::path::{Path, PathBuf};

/// CLI for dstrace: publish Jupyter notebooks to Confluence at git boundaries.
#[derive(Parser)]
#[clap(
    name = "dstrace",
    version,
    about = "Publish Jupyter notebooks to Confluence from git hooks"
)]
pub struct Cli {
    /// Repository root
    #[clap(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create config files and install git hooks
    Init {
        /// Convert staged notebooks to .py scripts before each commit
        #[clap(long)]
        pre_commit: bool,
        /// Update Confluence pages of changed notebooks before each push
        #[clap(long)]
        pre_push: bool,
    },
    /// Convert staged notebooks to scripts and stage them
    PreCommit,
    /// Publish notebooks changed since the last push
    PrePush,
    /// Publish all notebooks configured for the current branch
    Publish {
        /// Only publish notebooks matching this glob mask (relative to the repo root)
        #[clap(long)]
        glob: Option<String>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let repo = cli.repo;
    match cli.command {
        Commands::Init {
            pre_commit,
            pre_push,
        } => init(&repo, pre_commit, pre_push),
        Commands::PreCommit => {
            tracing::info!(command = "pre-commit", "DSTrace pre-commit started");
            let config = load_config(&repo)?;
            let converted = convert_staged_notebooks(&config, &GitRepo::new(&repo), &repo)?;
            println!("Converted {} notebook(s).", converted.len());
            Ok(())
        }
        Commands::PrePush => {
            tracing::info!(command = "pre-push", "DSTrace pre-push started");
            let config = load_config(&repo)?;
            let git = GitRepo::new(&repo);
            let pages = pages_to_update(&config, &git)?;
            publish(&config, &pages, &repo, &git).await
        }
        Commands::Publish { glob } => {
            tracing::info!(command = "publish", ?glob, "On-demand Confluence update started");
            let config = load_config(&repo)?;
            let git = GitRepo::new(&repo);
            let mut pages = pages_on_branch(&config, &git.active_branch()?);
            if let Some(mask) = glob {
                let paths = expand_glob(&repo, &mask)?;
                for (i, path) in paths.iter().enumerate() {
                    println!("{}. {}", i + 1, path.display());
                }
                pages = filter_pages(pages, &paths);
            }
            publish(&config, &pages, &repo, &git).await
        }
    }
}

fn init(repo: &Path, pre_commit: bool, pre_push: bool) -> Result<()> {
    tracing::info!(command = "init", pre_commit, pre_push, "Initializing DSTrace");
    let config = load_config(repo)?;

    let shown = DstraceConfig {
        confluence_api_username: None,
        confluence_api_token: None,
        ..config.clone()
    };
    println!("[CURRENT CONFIGURATION]:\n\n{}", serde_yaml::to_string(&shown)?);

    hooks::ensure_gitignored(repo, LOCAL_CONFIG_FILE)?;
    let git = GitRepo::new(repo);
    for (wanted, hook) in [(pre_commit, Hook::PreCommit), (pre_push, Hook::PrePush)] {
        if wanted {
            let path = hooks::install(&git, hook, &config.dstrace_command)?;
            println!("Installed {} hook: {}", hook.alias(), path.display());
        }
    }
    println!("DSTrace configuration completed.");
    Ok(())
}

async fn publish(
    config: &DstraceConfig,
    pages: &PageSelection,
    repo: &Path,
    git: &GitRepo,
) -> Result<()> {
    if pages.is_empty() {
        println!("No Confluence pages to update.");
        return Ok(());
    }
    let noun = if pages.len() == 1 { "page" } else { "pages" };
    println!("Going to update {} Confluence {noun}:", pages.len());
    for (i, (notebook, page)) in pages.iter().enumerate() {
        println!("{}. {notebook} >> {}", i + 1, page.confluence_url);
    }

    let client = ConfluenceClient::new();
    let credentials = EnvCredentialProvider::from_config(config);
    let report: PublishReport = batch_publish(config, pages, repo, &client, &credentials, git)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Publishing failed");
            anyhow::Error::msg(format!("Publishing failed: {e}"))
        })?;

    for page in &report.pages {
        println!("Updated {} ({} v{})", page.notebook, page.title, page.version);
    }
    Ok(())
}

/// Expand `mask` under `repo`, returning repo-relative paths.
fn expand_glob(repo: &Path, mask: &str) -> Result<Vec<PathBuf>> {
    let pattern = repo.join(mask);
    let pattern = pattern.to_string_lossy();
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Invalid glob pattern: {mask}"))? {
        let path = entry.with_context(|| format!("Failed to read glob match for: {mask}"))?;
        paths.push(path.strip_prefix(repo).map(Path::to_path_buf).unwrap_or(path));
    }
    if paths.is_empty() {
        tracing::warn!(mask, "No files matched glob mask");
    }
    Ok(paths)
}
