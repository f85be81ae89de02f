use dstrace_core::config::DstraceConfig;
use dstrace_core::contract::GitMetadata;
use dstrace_core::convert::notebooks_to_convert;
use dstrace_core::error::GitError;
use dstrace_core::git::{commit_url, GitRepo};
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const HASH: &str = "0123abcd";

#[test]
fn https_remote_is_used_as_is() {
    assert_eq!(
        commit_url("https://github.com/acme/research", HASH),
        "https://github.com/acme/research/commit/0123abcd"
    );
}

#[test]
fn dot_git_suffix_and_trailing_slash_are_dropped() {
    assert_eq!(
        commit_url("https://github.com/acme/research.git", HASH),
        "https://github.com/acme/research/commit/0123abcd"
    );
    assert_eq!(
        commit_url("https://gitlab.com/acme/research/\n", HASH),
        "https://gitlab.com/acme/research/commit/0123abcd"
    );
}

#[test]
fn scp_style_ssh_remote_becomes_https() {
    assert_eq!(
        commit_url("git@github.com:acme/research.git", HASH),
        "https://github.com/acme/research/commit/0123abcd"
    );
}

#[test]
fn ssh_url_remote_becomes_https() {
    assert_eq!(
        commit_url("ssh://git@bitbucket.org/acme/research.git", HASH),
        "https://bitbucket.org/acme/research/commit/0123abcd"
    );
}

#[test]
fn only_the_git_suffix_is_stripped() {
    // a repo literally named "legit" keeps its name
    assert_eq!(
        commit_url("https://github.com/acme/legit", HASH),
        "https://github.com/acme/legit/commit/0123abcd"
    );
}

fn git(root: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A fresh repo with one commit on `main`, or `None` when git is unavailable.
fn scratch_repo(root: &Path) -> Option<()> {
    let ok = git(root, &["init", "-q", "-b", "main"])
        && git(root, &["config", "user.email", "test@example.com"])
        && git(root, &["config", "user.name", "Test"])
        && git(root, &["commit", "-q", "--allow-empty", "-m", "init"]);
    ok.then_some(())
}

#[test]
fn real_repository_metadata() {
    let dir = tempdir().unwrap();
    if scratch_repo(dir.path()).is_none() {
        eprintln!("git not available, skipping");
        return;
    }
    let repo = GitRepo::new(dir.path());

    assert_eq!(repo.active_branch().unwrap(), "main");
    assert!(matches!(repo.last_commit_url(), Err(GitError::NoRemote)));

    std::fs::write(dir.path().join("a.ipynb"), "{}").unwrap();
    assert!(git(dir.path(), &["add", "a.ipynb"]));
    assert_eq!(repo.staged_files().unwrap(), vec!["a.ipynb".to_string()]);

    assert!(git(
        dir.path(),
        &["remote", "add", "origin", "git@github.com:acme/research.git"]
    ));
    let hash = repo.last_commit_hash().unwrap();
    assert_eq!(
        repo.last_commit_url().unwrap(),
        format!("https://github.com/acme/research/commit/{hash}")
    );

    assert!(git(
        dir.path(),
        &["remote", "add", "mirror", "https://example.com/acme/research"]
    ));
    assert!(matches!(
        repo.remote_url(),
        Err(GitError::MultipleRemotes(2))
    ));
}

#[test]
fn git_failure_carries_the_command() {
    let dir = tempdir().unwrap();
    let err = GitRepo::new(dir.path()).last_commit_hash().unwrap_err();
    match err {
        GitError::Command { args, .. } => assert_eq!(args, "rev-parse HEAD"),
        // no git binary at all
        GitError::Launch(_) => {}
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn staged_paths_are_verbatim_for_non_ascii_and_spaces() {
    let dir = tempdir().unwrap();
    if scratch_repo(dir.path()).is_none() {
        eprintln!("git not available, skipping");
        return;
    }
    for name in ["análise.ipynb", " padded .ipynb"] {
        std::fs::write(dir.path().join(name), "{}").unwrap();
        assert!(git(dir.path(), &["add", "--", name]));
    }
    let repo = GitRepo::new(dir.path());

    let mut staged = repo.staged_files().unwrap();
    staged.sort();
    assert_eq!(
        staged,
        vec![" padded .ipynb".to_string(), "análise.ipynb".to_string()]
    );

    let todo = notebooks_to_convert(&DstraceConfig::default(), "main", &staged, dir.path());
    assert_eq!(todo.len(), 2, "both notebooks exist on disk: {todo:?}");
}

#[test]
fn changed_since_push_reports_non_ascii_paths_verbatim() {
    let dir = tempdir().unwrap();
    let work = dir.path().join("work");
    let origin = dir.path().join("origin.git");
    std::fs::create_dir(&work).unwrap();
    let ready = scratch_repo(&work).is_some()
        && git(dir.path(), &["init", "-q", "--bare", origin.to_str().unwrap()])
        && git(&work, &["remote", "add", "origin", origin.to_str().unwrap()])
        && git(&work, &["push", "-q", "origin", "main"]);
    if !ready {
        eprintln!("git not available, skipping");
        return;
    }
    std::fs::write(work.join("análise.ipynb"), "{}").unwrap();
    assert!(git(&work, &["add", "análise.ipynb"]));
    assert!(git(&work, &["commit", "-q", "-m", "add notebook"]));

    let changed = GitRepo::new(&work).changed_files_since_last_push().unwrap();
    assert_eq!(changed, vec!["análise.ipynb".to_string()]);
}
