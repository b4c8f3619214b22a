//! End-to-end tests for the `completions` command.

mod common;
use common::prelude::*;

#[test]
fn test_completions_for_each_shell() {
    for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
        cargo_bin_cmd!("shiplog")
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("shiplog"));
    }
}

#[test]
fn test_completions_include_subcommands() {
    cargo_bin_cmd!("shiplog")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_completions_unknown_shell() {
    cargo_bin_cmd!("shiplog")
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_completions_need_no_project() {
    let temp = assert_fs::TempDir::new().unwrap();
    cargo_bin_cmd!("shiplog")
        .current_dir(temp.path())
        .args(["completions", "zsh"])
        .assert()
        .success();
}
