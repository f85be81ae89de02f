//! Notebook transform stages.
//!
//! Every stage exists twice: as a cell/document function operating on the
//! parsed model, and as a text-to-text [`Stage`] (`handle_*`) that parses,
//! transforms and re-serializes. The text form is what the temp-file pipeline
//! folds over.
//!
//! Stage order is fixed: input filter, output filter, commit annotator, token
//! stripper. The stripper must be last because it deletes the directive line
//! the other stages read.

use serde_json::Value;
use tracing::debug;

use crate::directive::{self, Directive, FORCE_INCLUDE_INPUT_TAG, NO_INPUT_TAG};
use crate::error::TransformError;
use crate::notebook::{Cell, CellMetadata, Notebook};

/// Immutable per-call policy shared by all stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformConfig {
    /// Show code cell input unless a cell opts out.
    pub code: bool,
    /// Skip the commit annotator entirely.
    pub no_commit_url: bool,
    /// Precomputed commit URL; required unless `no_commit_url` is set.
    pub commit_url: Option<String>,
}

/// One text-to-text pipeline stage.
pub type Stage = fn(&str, &TransformConfig) -> Result<String, TransformError>;

/// Stages applied before publishing, in order.
pub const PUBLISH_STAGES: [Stage; 4] = [
    handle_input,
    handle_output,
    handle_commit_url,
    remove_dstrace_tokens,
];

/// Decide input visibility for one cell.
///
/// An `exclude_input` directive always hides the input, whatever the default
/// policy and even if `include_input` or the force-include tag is also present.
pub fn filter_input(mut cell: Cell, code_by_default: bool) -> Cell {
    if !cell.is_code() || cell.is_empty() {
        return cell;
    }

    let directives = directive::scan(&cell.source);
    let hide = if directives.contains(Directive::ExcludeInput) {
        true
    } else if code_by_default {
        false
    } else {
        let input_required = cell.has_tag(FORCE_INCLUDE_INPUT_TAG)
            || directives.contains(Directive::IncludeInput);
        !input_required
    };

    if hide {
        debug!(code_by_default, "Hiding code cell input");
        cell.add_tag(NO_INPUT_TAG);
    }
    cell
}

/// Clear outputs of a code cell carrying `exclude_output`.
pub fn filter_output(mut cell: Cell) -> Cell {
    if !cell.is_code() || cell.is_empty() {
        return cell;
    }
    if directive::scan(&cell.source).contains(Directive::ExcludeOutput) {
        debug!("Clearing code cell outputs");
        cell.outputs = Some(Vec::new());
    }
    cell
}

/// Drop the directive line of a code cell, if it has one.
pub fn strip_tokens(mut cell: Cell) -> Cell {
    if !cell.is_code() || cell.is_empty() {
        return cell;
    }
    if !directive::scan(&cell.source).is_empty() {
        cell.source.remove(0);
    }
    cell
}

/// The synthetic cell linking the published page back to its commit.
pub fn commit_cell(url: &str) -> Cell {
    let mut metadata = CellMetadata::default();
    metadata
        .extra
        .insert("collapsed".to_string(), Value::Bool(true));
    Cell::markdown(vec![format!("Source commit: [{url}]({url})")], metadata)
}

/// Prepend the commit link cell unless annotation is disabled.
pub fn annotate_commit(
    mut notebook: Notebook,
    config: &TransformConfig,
) -> Result<Notebook, TransformError> {
    if config.no_commit_url {
        return Ok(notebook);
    }
    let url = config
        .commit_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(TransformError::MissingCommitUrl)?;
    notebook.cells.insert(0, commit_cell(url));
    Ok(notebook)
}

fn map_code_cells(raw: &str, f: impl Fn(Cell) -> Cell) -> Result<String, TransformError> {
    let mut notebook = Notebook::from_json(raw)?;
    notebook.cells = notebook
        .cells
        .into_iter()
        .map(|cell| if cell.is_code() { f(cell) } else { cell })
        .collect();
    notebook.to_json()
}

/// Input filter stage.
pub fn handle_input(raw: &str, config: &TransformConfig) -> Result<String, TransformError> {
    map_code_cells(raw, |cell| filter_input(cell, config.code))
}

/// Output filter stage.
pub fn handle_output(raw: &str, _config: &TransformConfig) -> Result<String, TransformError> {
    map_code_cells(raw, filter_output)
}

/// Commit annotator stage. Returns the input text untouched when disabled.
pub fn handle_commit_url(raw: &str, config: &TransformConfig) -> Result<String, TransformError> {
    if config.no_commit_url {
        return Ok(raw.to_string());
    }
    annotate_commit(Notebook::from_json(raw)?, config)?.to_json()
}

/// Token stripper stage.
pub fn remove_dstrace_tokens(
    raw: &str,
    _config: &TransformConfig,
) -> Result<String, TransformError> {
    map_code_cells(raw, strip_tokens)
}

/// Fold `stages` left-to-right over `raw`.
pub fn apply_stages(
    raw: &str,
    stages: &[Stage],
    config: &TransformConfig,
) -> Result<String, TransformError> {
    stages
        .iter()
        .try_fold(raw.to_string(), |data, stage| stage(&data, config))
}
