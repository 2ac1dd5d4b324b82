//! Shared test utilities for integration tests
//!
//! Builds throwaway upstream git repositories with tagged snapshots and
//! ledger files, and runs the binary against them.

#![allow(dead_code)]

use std::{fs, path::Path, process::Command};

use assert_fs::prelude::*;

/// Whether a usable `git` is on PATH; git-backed tests return early otherwise
pub fn git_available() -> bool
{
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `repo`, panicking on failure
pub fn git(
    repo: &Path,
    args: &[&str],
)
{
    let out = Command::new("git")
        .args(["-c", "user.name=Test User", "-c", "user.email=test@example.com", "-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .current_dir(repo)
        .output()
        .expect("spawn git");
    assert!(out.status.success(), "git {:?} failed: {}", args, String::from_utf8_lossy(&out.stderr));
}

/// Replace the tracked tree with `files`, commit, and tag the commit.
pub fn commit_snapshot(
    repo: &Path,
    tag: &str,
    files: &[&str],
)
{
    for entry in fs::read_dir(repo).expect("read repo")
    {
        let path = entry
            .expect("dir entry")
            .path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name == ".git" || name == "EXPECTED_UPSTREAM" || name.ends_with(".toml")
        {
            continue;
        }
        if path.is_dir()
        {
            fs::remove_dir_all(&path).expect("clear dir");
        }
        else
        {
            fs::remove_file(&path).expect("clear file");
        }
    }

    for file in files
    {
        let p = repo.join(file);
        fs::create_dir_all(p.parent().expect("parent")).expect("mkdir");
        fs::write(&p, format!("// {file}\n")).expect("write source");
    }

    git(repo, &["add", "-A", "--", ".", ":!EXPECTED_UPSTREAM", ":!*.toml"]);
    git(repo, &["commit", "-q", "--allow-empty", "-m", tag]);
    git(repo, &["tag", tag]);
}

/// Upstream repository with one jdk8-era and one jdk11-era tag.
pub fn make_upstream() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    git(tmp.path(), &["init", "-q"]);

    commit_snapshot(
        tmp.path(),
        "jdk8u/jdk8u121-b13",
        &["jdk/src/share/classes/java/util/List.java", "jdk/src/share/classes/java/util/Map.java", "jdk/test/java/util/ListTest.java"],
    );
    commit_snapshot(
        tmp.path(),
        "jdk11u/jdk-11+28",
        &[
            "src/java.base/share/classes/java/util/List.java",
            "src/java.base/share/classes/java/util/Map.java",
            "src/java.base/share/classes/java/util/Set.java",
            "src/java.base/share/classes/java/util/concurrent/Future.java",
            "test/jdk/java/util/ListTest.java",
        ],
    );

    tmp
}

pub const LEDGER: &str = "\
# Copyright header kept above the first entry
# dst_path,git_ref,src_path

ojluni/src/main/java/java/util/List.java,jdk8u/jdk8u121-b13,jdk/src/share/classes/java/util/List.java
# Locally patched
ojluni/src/main/java/java/util/Map.java,jdk8u/jdk8u121-b13,jdk/src/share/classes/java/util/Map.java
";

/// Write the ledger at the repository root
pub fn write_ledger(
    repo: &assert_fs::TempDir,
    text: &str,
)
{
    repo.child("EXPECTED_UPSTREAM")
        .write_str(text)
        .expect("write ledger");
}

pub fn read_ledger(repo: &assert_fs::TempDir) -> String
{
    fs::read_to_string(
        repo.child("EXPECTED_UPSTREAM")
            .path(),
    )
    .expect("read ledger")
}

/// The binary, run inside `repo` with a clean environment
pub fn bin(repo: &Path) -> assert_cmd::Command
{
    let mut cmd = assert_cmd::Command::cargo_bin("expected-upstream").expect("binary");
    cmd.current_dir(repo)
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

/// The binary in completion mode (`--autocomplete` must come first)
pub fn complete(
    repo: &Path,
    words: &[&str],
) -> assert_cmd::Command
{
    let mut cmd = assert_cmd::Command::cargo_bin("expected-upstream").expect("binary");
    cmd.current_dir(repo)
        .env_remove("RUST_LOG")
        .arg("--autocomplete")
        .args(words);
    cmd
}
