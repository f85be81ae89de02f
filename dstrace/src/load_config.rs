/// `load_config` module: reads the two dstrace YAML files and merges them into one [`DstraceConfig`].
///
/// - `.dstrace` is versioned with the repository: publish targets and rendering policy.
/// - `.dstracelocal` is per machine and git-ignored: API credentials and the command the hooks run.
///
/// Missing files are created with defaults so a fresh checkout works after `dstrace init`.
/// Values from the local file override the shared one.
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{Context, Result};
use dstrace_core::config::{DstraceConfig, LocalConfig, DEFAULT_COMMAND};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const CONFIG_FILE: &str = ".dstrace";
pub const LOCAL_CONFIG_FILE: &str = ".dstracelocal";

/// Load (creating when missing) both config files under the repository `root`.
pub fn load_config<P: AsRef<Path>>(root: P) -> Result<DstraceConfig> {
    let root = root.as_ref();
    load_config_files(&root.join(CONFIG_FILE), &root.join(LOCAL_CONFIG_FILE))
}

pub fn load_config_files(shared: &Path, local: &Path) -> Result<DstraceConfig> {
    let mut config: DstraceConfig = read_or_create(shared, DstraceConfig::default())?;
    let local_config: LocalConfig = read_or_create(
        local,
        LocalConfig {
            dstrace_command: Some(DEFAULT_COMMAND.to_string()),
            ..LocalConfig::default()
        },
    )?;
    config.merge_local(local_config);
    config.trace_loaded();
    Ok(config)
}

fn read_or_create<T>(path: &Path, default: T) -> Result<T>
where
    T: DeserializeOwned + Serialize,
{
    if !path.exists() {
        let yaml = serde_yaml::to_string(&default).context("Failed to serialize default config")?;
        fs::write(path, yaml).with_context(|| format!("Failed to create config file {path:?}"))?;
        info!(config_path = ?path, "Created default config file");
        return Ok(default);
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    if content.trim().is_empty() {
        return Ok(default);
    }

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML {path:?}: {e}"))
        }
    }
}
