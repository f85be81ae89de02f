use dstrace_core::error::TransformError;
use dstrace_core::notebook::Notebook;
use dstrace_core::pipeline::with_preprocessed_temp_file;
use dstrace_core::transform::{Stage, TransformConfig, PUBLISH_STAGES};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Debug, PartialEq)]
enum TestError {
    Transform(String),
    Action(String),
}

impl From<TransformError> for TestError {
    fn from(e: TransformError) -> Self {
        TestError::Transform(e.to_string())
    }
}

const NOTEBOOK: &str = r##"{
  "cells": [
    {"cell_type": "code", "metadata": {}, "source": ["# dstrace_exclude_output\n", "x = 1"],
     "outputs": [{"output_type": "stream", "name": "stdout", "text": ["1\n"]}]}
  ],
  "metadata": {},
  "nbformat": 4,
  "nbformat_minor": 5
}"##;

fn config() -> TransformConfig {
    TransformConfig {
        code: true,
        no_commit_url: false,
        commit_url: Some("https://example.com/commit/abc123".to_string()),
    }
}

fn write_notebook(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join("analysis.ipynb");
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn action_sees_transformed_document_and_file_is_removed_afterwards() {
    let dir = tempdir().unwrap();
    let path = write_notebook(dir.path(), NOTEBOOK);
    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

    let recorder = seen.clone();
    let cells = with_preprocessed_temp_file(&path, &PUBLISH_STAGES, &config(), |temp| async move {
        *recorder.lock().unwrap() = Some(temp.clone());
        assert!(temp.exists(), "temp file must exist while the action runs");
        let nb = Notebook::from_json(&std::fs::read_to_string(&temp).unwrap()).unwrap();
        Ok::<_, TestError>(nb.cells)
    })
    .await
    .expect("pipeline should succeed");

    assert_eq!(cells.len(), 2, "commit cell prepended");
    assert_eq!(cells[1].source, vec!["x = 1".to_string()]);
    assert_eq!(cells[1].outputs, Some(vec![]));

    let temp = seen.lock().unwrap().clone().expect("action was called");
    assert_ne!(temp, path);
    assert!(!temp.exists(), "temp file must be removed after success");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), NOTEBOOK, "source untouched");
}

#[tokio::test]
async fn action_error_propagates_unchanged_after_cleanup() {
    let dir = tempdir().unwrap();
    let path = write_notebook(dir.path(), NOTEBOOK);
    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

    let recorder = seen.clone();
    let err = with_preprocessed_temp_file(&path, &PUBLISH_STAGES, &config(), |temp| async move {
        *recorder.lock().unwrap() = Some(temp);
        Err::<(), _>(TestError::Action("network down".to_string()))
    })
    .await
    .unwrap_err();

    assert_eq!(err, TestError::Action("network down".to_string()));
    let temp = seen.lock().unwrap().clone().expect("action was called");
    assert!(!temp.exists(), "temp file must be removed after action error");
}

#[tokio::test]
async fn stage_failure_never_calls_the_action() {
    let dir = tempdir().unwrap();
    let path = write_notebook(dir.path(), "{ not a notebook");
    let called = Arc::new(Mutex::new(false));

    let flag = called.clone();
    let err = with_preprocessed_temp_file(&path, &PUBLISH_STAGES, &config(), |_temp| async move {
        *flag.lock().unwrap() = true;
        Ok::<(), TestError>(())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, TestError::Transform(msg) if msg.contains("Malformed")));
    assert!(!*called.lock().unwrap());
}

#[tokio::test]
async fn missing_notebook_is_a_read_error() {
    let dir = tempdir().unwrap();
    let err = with_preprocessed_temp_file(
        &dir.path().join("missing.ipynb"),
        &PUBLISH_STAGES,
        &config(),
        |_temp| async move { Ok::<(), TestError>(()) },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TestError::Transform(msg) if msg.contains("Failed to read notebook")));
}

#[tokio::test]
async fn no_stages_copies_the_document_verbatim() {
    let dir = tempdir().unwrap();
    let path = write_notebook(dir.path(), NOTEBOOK);
    let stages: [Stage; 0] = [];

    let copied = with_preprocessed_temp_file(&path, &stages, &config(), |temp| async move {
        Ok::<_, TestError>(std::fs::read_to_string(temp).unwrap())
    })
    .await
    .unwrap();
    assert_eq!(copied, NOTEBOOK);
}
