use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::transform::TransformConfig;

pub const DEFAULT_COMMAND: &str = "dstrace";

/// Versioned project config (`.dstrace`) merged with the local one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DstraceConfig {
    /// Notebook path (relative to the repo root) → publish target.
    #[serde(default)]
    pub confluence_pages: BTreeMap<String, PageConfig>,
    /// Show code cell input by default.
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub no_commit_url: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confluence_api_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confluence_api_token: Option<String>,
    #[serde(default = "default_command")]
    pub dstrace_command: String,
}

impl Default for DstraceConfig {
    fn default() -> Self {
        Self {
            confluence_pages: BTreeMap::new(),
            code: false,
            no_commit_url: false,
            confluence_api_username: None,
            confluence_api_token: None,
            dstrace_command: default_command(),
        }
    }
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

impl DstraceConfig {
    pub fn trace_loaded(&self) {
        info!(
            pages = self.confluence_pages.len(),
            code = self.code,
            no_commit_url = self.no_commit_url,
            username_set = self.confluence_api_username.is_some(),
            token_set = self.confluence_api_token.is_some(),
            "Loaded DSTrace config"
        );
        debug!(pages = ?self.confluence_pages, "Configured Confluence pages");
    }

    /// Overlay machine-local settings (`.dstracelocal`).
    pub fn merge_local(&mut self, local: LocalConfig) {
        if local.confluence_api_username.is_some() {
            self.confluence_api_username = local.confluence_api_username;
        }
        if local.confluence_api_token.is_some() {
            self.confluence_api_token = local.confluence_api_token;
        }
        if let Some(command) = local.dstrace_command {
            self.dstrace_command = command;
        }
    }

    /// Stage policy for one publish run.
    pub fn transform_config(&self, commit_url: Option<String>) -> TransformConfig {
        TransformConfig {
            code: self.code,
            no_commit_url: self.no_commit_url,
            commit_url,
        }
    }
}

/// Where and when a notebook is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    pub confluence_url: String,
    /// Only publish from this branch.
    pub branch: String,
    #[serde(default)]
    pub no_conversion_to_python: bool,
}

/// Unversioned per-machine settings; never committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub confluence_api_username: Option<String>,
    #[serde(default)]
    pub confluence_api_token: Option<String>,
    #[serde(default)]
    pub dstrace_command: Option<String>,
}
