//! Apply transformations, hand the result to an action, clean up.
//!
//! The transformed notebook lives in a [`tempfile::NamedTempFile`] owned by
//! [`with_preprocessed_temp_file`]. It is closed explicitly once the action
//! returns; on any early exit (stage error, action error, dropped future) the
//! guard's destructor removes it.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::TransformError;
use crate::transform::{apply_stages, Stage, TransformConfig};

const TEMP_PREFIX: &str = ".dstrace-";
const TEMP_SUFFIX: &str = ".ipynb";

/// Read `path`, run `stages` over it, write the result to a fresh temporary
/// file and call `action` with that file's path.
///
/// An error returned by `action` is passed through unchanged after the
/// temporary file is removed. Stage and I/O failures are converted into the
/// caller's error type via `From<TransformError>`.
pub async fn with_preprocessed_temp_file<F, Fut, T, E>(
    path: &Path,
    stages: &[Stage],
    config: &TransformConfig,
    action: F,
) -> Result<T, E>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<TransformError>,
{
    let raw = std::fs::read_to_string(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to read notebook");
        TransformError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let data = apply_stages(&raw, stages, config).map_err(|e| {
        error!(error = %e, path = %path.display(), "Notebook transformation failed");
        e
    })?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile()
        .map_err(TransformError::TempFile)?;
    temp.write_all(data.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(TransformError::TempFile)?;

    let temp_path = temp.path().to_path_buf();
    info!(
        notebook = %path.display(),
        temp = %temp_path.display(),
        stages = stages.len(),
        "Wrote transformed notebook"
    );

    let outcome = action(temp_path).await;
    let closed = temp.close();

    match outcome {
        Ok(value) => {
            closed.map_err(TransformError::Cleanup)?;
            debug!(notebook = %path.display(), "Removed transformed notebook");
            Ok(value)
        }
        Err(e) => {
            if let Err(cleanup) = closed {
                error!(error = ?cleanup, "Failed to remove transformed notebook after action error");
            }
            Err(e)
        }
    }
}
