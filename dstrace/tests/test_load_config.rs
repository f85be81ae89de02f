use dstrace::load_config::{load_config, load_config_files, CONFIG_FILE, LOCAL_CONFIG_FILE};
use serial_test::serial;
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

/// Shared and local files are merged; local values win.
#[test]
#[serial]
fn test_load_config_merges_local_over_shared() {
    let repo = tempdir().expect("temp dir");
    let shared_yaml = r#"
confluence_pages:
  notebooks/analysis.ipynb:
    confluence_url: "https://acme.atlassian.net/wiki/spaces/DS/pages/123/Analysis"
    branch: main
  notebooks/raw.ipynb:
    confluence_url: "https://acme.atlassian.net/pages/viewpage.action?pageId=456"
    branch: develop
    no_conversion_to_python: true
code: true
dstrace_command: dstrace
"#;
    let local_yaml = r#"
confluence_api_username: me@acme.com
confluence_api_token: tok
dstrace_command: /home/me/.cargo/bin/dstrace
"#;
    write(repo.path().join(CONFIG_FILE), shared_yaml).unwrap();
    write(repo.path().join(LOCAL_CONFIG_FILE), local_yaml).unwrap();

    let config = load_config(repo.path()).expect("Config should load");

    assert_eq!(config.confluence_pages.len(), 2);
    let page = &config.confluence_pages["notebooks/analysis.ipynb"];
    assert_eq!(page.branch, "main");
    assert!(!page.no_conversion_to_python);
    assert!(config.confluence_pages["notebooks/raw.ipynb"].no_conversion_to_python);
    assert!(config.code);
    assert!(!config.no_commit_url);
    assert_eq!(config.confluence_api_username.as_deref(), Some("me@acme.com"));
    assert_eq!(config.confluence_api_token.as_deref(), Some("tok"));
    assert_eq!(config.dstrace_command, "/home/me/.cargo/bin/dstrace");
}

/// Missing files are created with defaults and load back identically.
#[test]
#[serial]
fn test_load_config_creates_defaults() {
    let repo = tempdir().expect("temp dir");

    let first = load_config(repo.path()).expect("Defaults should load");
    assert!(repo.path().join(CONFIG_FILE).exists());
    assert!(repo.path().join(LOCAL_CONFIG_FILE).exists());
    assert!(first.confluence_pages.is_empty());
    assert!(!first.code);
    assert_eq!(first.dstrace_command, "dstrace");

    let second = load_config(repo.path()).expect("Created files should parse");
    assert_eq!(first, second);
}

/// An empty file counts as "all defaults".
#[test]
#[serial]
fn test_load_config_accepts_empty_files() {
    let shared = NamedTempFile::new().expect("temp file");
    let local = NamedTempFile::new().expect("temp file");

    let config = load_config_files(shared.path(), local.path()).expect("Empty config loads");
    assert!(config.confluence_pages.is_empty());
    assert!(config.confluence_api_token.is_none());
}

/// If the config file is not valid YAML, load_config errors and reports as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let shared = NamedTempFile::new().expect("temp file");
    let local = NamedTempFile::new().expect("temp file");
    write(shared.path(), b"not-yaml: [:::").unwrap();

    let err = load_config_files(shared.path(), local.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

/// A page without its branch is rejected rather than silently skipped.
#[test]
#[serial]
fn test_load_config_errors_on_missing_page_fields() {
    let shared = NamedTempFile::new().expect("temp file");
    let local = NamedTempFile::new().expect("temp file");
    write(
        shared.path(),
        "confluence_pages:\n  a.ipynb:\n    confluence_url: https://acme.atlassian.net/wiki/pages/1\n",
    )
    .unwrap();

    let err = load_config_files(shared.path(), local.path()).unwrap_err();
    assert!(err.to_string().contains("YAML"), "got: {err}");
}
