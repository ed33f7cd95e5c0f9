use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_shows_all_commands() {
    Command::cargo_bin("roost")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn config_help_shows_subcommands() {
    Command::cargo_bin("roost")
        .unwrap()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn config_path_honors_roost_home() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("roost")
        .unwrap()
        .env("ROOST_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("roost")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("roost"));
}
