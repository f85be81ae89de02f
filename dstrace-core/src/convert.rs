//! Pre-commit: convert staged notebooks to `.py` scripts and stage them.
//!
//! The scripts give reviewers a readable diff next to the `.ipynb` JSON.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info};

use crate::config::DstraceConfig;
use crate::contract::GitMetadata;
use crate::error::ConvertError;
use crate::publish::pages_on_branch;

/// A staged notebook to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Repo-relative path, as git reports it.
    pub notebook: String,
    pub absolute: PathBuf,
}

impl Conversion {
    /// The script `jupyter nbconvert --output <absolute>` produces.
    pub fn script_path(&self) -> PathBuf {
        let mut script = self.absolute.clone().into_os_string();
        script.push(".py");
        PathBuf::from(script)
    }
}

/// Staged `.ipynb` files still present on disk (not staged deletions), minus
/// those whose page on `branch` opts out with `no_conversion_to_python`.
pub fn notebooks_to_convert(
    config: &DstraceConfig,
    branch: &str,
    staged: &[String],
    root: &Path,
) -> Vec<Conversion> {
    let pages = pages_on_branch(config, branch);
    staged
        .iter()
        .filter(|f| Path::new(f).extension().is_some_and(|ext| ext == "ipynb"))
        .filter_map(|f| {
            let absolute = root.join(f);
            if !absolute.exists() {
                return None;
            }
            if pages.get(f).is_some_and(|p| p.no_conversion_to_python) {
                info!(notebook = %f, "Skipping conversion: no_conversion_to_python is set");
                return None;
            }
            Some(Conversion {
                notebook: f.clone(),
                absolute,
            })
        })
        .collect()
}

/// Convert and stage every selected notebook. Returns the conversions run.
pub fn convert_staged_notebooks<G: GitMetadata>(
    config: &DstraceConfig,
    git: &G,
    root: &Path,
) -> Result<Vec<Conversion>, ConvertError> {
    let branch = git.active_branch()?;
    let staged = git.staged_files()?;
    let todo = notebooks_to_convert(config, &branch, &staged, root);
    if todo.is_empty() {
        info!("Nothing to convert: no staged notebooks");
        return Ok(todo);
    }

    for conversion in &todo {
        run(
            "jupyter",
            Command::new("jupyter")
                .args(["nbconvert", "--to", "script"])
                .arg(&conversion.absolute)
                .arg("--output")
                .arg(&conversion.absolute),
            &conversion.absolute,
        )?;
        let script = conversion.script_path();
        run(
            "git",
            Command::new("git").arg("-C").arg(root).arg("add").arg(&script),
            &script,
        )?;
        info!(notebook = %conversion.notebook, script = %script.display(), "Converted and staged notebook");
    }
    Ok(todo)
}

fn run(program: &'static str, command: &mut Command, path: &Path) -> Result<(), ConvertError> {
    let status = command
        .status()
        .map_err(|source| ConvertError::Launch { program, source })?;
    if !status.success() {
        error!(program, status = %status, path = %path.display(), "Conversion step failed");
        return Err(ConvertError::Failed {
            program,
            status,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
