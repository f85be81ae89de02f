//! Batch publishing: select pages, transform each notebook, push it.
//!
//! # Flow
//! - Select the pages to publish ([`pages_to_update`] for the pre-push hook,
//!   [`pages_on_branch`] + [`filter_pages`] for on-demand publishing).
//! - [`batch_publish`] resolves credentials and the commit URL once, then for
//!   every selected notebook, strictly one after another, runs
//!   [`PUBLISH_STAGES`] through a scoped temp file and calls the [`Publisher`].
//!
//! # Error Handling
//! Fail-fast: the first failing notebook aborts the batch and its error is
//! returned unchanged. Nothing is retried.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::{DstraceConfig, PageConfig};
use crate::contract::{CredentialProvider, GitMetadata, PublishError, PublishRequest, Publisher};
use crate::error::GitError;
use crate::pipeline::with_preprocessed_temp_file;
use crate::transform::PUBLISH_STAGES;

/// Notebook path → page config, iterated in path order.
pub type PageSelection = BTreeMap<String, PageConfig>;

#[derive(Debug, Default)]
pub struct PublishReport {
    pub pages: Vec<PageReport>,
}

#[derive(Debug)]
pub struct PageReport {
    pub notebook: String,
    pub target: String,
    pub page_id: String,
    pub title: String,
    pub version: u64,
}

/// Pages configured for `branch`.
pub fn pages_on_branch(config: &DstraceConfig, branch: &str) -> PageSelection {
    config
        .confluence_pages
        .iter()
        .filter(|(_, page)| page.branch == branch)
        .map(|(nb, page)| (nb.clone(), page.clone()))
        .collect()
}

/// Pages on the active branch whose notebook changed since the last push.
pub fn pages_to_update<G: GitMetadata>(
    config: &DstraceConfig,
    git: &G,
) -> Result<PageSelection, GitError> {
    let branch = git.active_branch()?;
    let changed = git.changed_files_since_last_push()?;
    debug!(branch = %branch, changed = changed.len(), "Selecting pages changed since last push");

    Ok(pages_on_branch(config, &branch)
        .into_iter()
        .filter(|(nb, _)| changed.iter().any(|c| c == nb))
        .collect())
}

/// Keep only pages whose notebook is one of `paths`.
pub fn filter_pages(pages: PageSelection, paths: &[PathBuf]) -> PageSelection {
    let wanted: Vec<PathBuf> = paths.iter().map(|p| normalize(p)).collect();
    pages
        .into_iter()
        .filter(|(nb, _)| wanted.contains(&normalize(Path::new(nb))))
        .collect()
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Publish every page in `pages`, in order, stopping at the first failure.
///
/// Notebook paths are resolved against `root`.
pub async fn batch_publish<P, C, G>(
    config: &DstraceConfig,
    pages: &PageSelection,
    root: &Path,
    publisher: &P,
    credentials: &C,
    git: &G,
) -> Result<PublishReport, PublishError>
where
    P: Publisher,
    C: CredentialProvider,
    G: GitMetadata,
{
    if pages.is_empty() {
        info!("No Confluence pages to update");
        return Ok(PublishReport::default());
    }

    info!(count = pages.len(), "Going to update Confluence pages");
    for (i, (notebook, page)) in pages.iter().enumerate() {
        info!(n = i + 1, notebook = %notebook, target = %page.confluence_url, "Queued page");
    }

    let credentials = &credentials.credentials()?;
    let commit_url = if config.no_commit_url {
        None
    } else {
        Some(git.last_commit_url().map_err(|e| {
            error!(error = %e, "Cannot resolve commit URL; aborting before publishing");
            e
        })?)
    };
    let transform = config.transform_config(commit_url);

    let mut report = PublishReport::default();
    for (notebook, page) in pages {
        let path = root.join(notebook);
        let target = page.confluence_url.as_str();
        info!(notebook = %notebook, target = %target, "Publishing notebook");

        let published = with_preprocessed_temp_file(
            &path,
            &PUBLISH_STAGES,
            &transform,
            |temp| async move {
                publisher
                    .publish(PublishRequest {
                        source: &temp,
                        target,
                        credentials,
                    })
                    .await
            },
        )
        .await
        .map_err(|e: PublishError| {
            error!(notebook = %notebook, target = %target, error = %e, "Publishing failed; aborting batch");
            e
        })?;

        info!(
            notebook = %notebook,
            page_id = %published.page_id,
            version = published.version,
            "Page updated"
        );
        report.pages.push(PageReport {
            notebook: notebook.clone(),
            target: target.to_string(),
            page_id: published.page_id,
            title: published.title,
            version: published.version,
        });
    }

    Ok(report)
}
