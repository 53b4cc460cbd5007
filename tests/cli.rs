mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn rosterbase() -> Command {
    Command::cargo_bin("rosterbase").expect("binary exists")
}

#[test]
fn add_then_list_round_trips_through_the_backing_file() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("players.csv");

    rosterbase()
        .args(["add", "-i", data.to_str().unwrap()])
        .args(["--set", "name=Ana", "--set", "position=Forward", "--set", "goals=7"])
        .assert()
        .success()
        .stdout(contains("\"id\": 1").and(contains("\"goals\": 7")));

    rosterbase()
        .args(["list", "-i", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Ana").and(contains("Forward")));
}

#[test]
fn get_by_name_is_accent_insensitive() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("players.csv");

    rosterbase()
        .args(["add", "-i", data.to_str().unwrap(), "--set", "name=José"])
        .assert()
        .success();

    rosterbase()
        .args(["get", "-i", data.to_str().unwrap(), "--name", "jose"])
        .assert()
        .success()
        .stdout(contains("José"));
}

#[test]
fn missing_key_exits_with_the_not_found_code() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("players.csv");

    rosterbase()
        .args(["get", "-i", data.to_str().unwrap(), "42"])
        .assert()
        .code(2)
        .stderr(contains("no record matches id 42"));
}

#[test]
fn update_overwrites_only_the_supplied_fields() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("players.csv");

    for (name, goals) in [("A", "3"), ("B", "5")] {
        rosterbase()
            .args(["add", "-i", data.to_str().unwrap()])
            .args(["--set", &format!("name={name}"), "--set", &format!("goals={goals}")])
            .assert()
            .success();
    }

    rosterbase()
        .args(["update", "-i", data.to_str().unwrap(), "2", "--set", "goals=9"])
        .assert()
        .success()
        .stdout(
            contains("\"goals\": 9")
                .and(contains("\"name\": \"B\""))
                .and(contains("\"id\": 2")),
        );
}

#[test]
fn positional_delete_reindexes_subsequent_records() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("students.csv");

    for name in ["Ana", "Binh"] {
        rosterbase()
            .args(["add", "-i", data.to_str().unwrap(), "--profile", "students"])
            .args(["--set", &format!("name={name}")])
            .assert()
            .success();
    }

    rosterbase()
        .args(["delete", "-i", data.to_str().unwrap(), "--profile", "students"])
        .args(["0", "--key-mode", "position"])
        .assert()
        .success()
        .stdout(contains("Ana"));

    rosterbase()
        .args(["list", "-i", data.to_str().unwrap(), "--profile", "students"])
        .assert()
        .success()
        .stdout(contains("Binh").and(contains("Ana").not()));
}

#[test]
fn stats_on_a_missing_file_reports_an_empty_summary() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("absent.csv");

    rosterbase()
        .args(["stats", "-i", data.to_str().unwrap(), "-C", "goals"])
        .assert()
        .success()
        .stdout(contains("\"count\": 0").and(contains("N/A")));
}

#[test]
fn compare_of_an_unknown_name_exits_with_the_not_found_code() {
    let ws = TestWorkspace::new();
    let data = ws.path().join("players.csv");

    rosterbase()
        .args(["add", "-i", data.to_str().unwrap(), "--set", "name=Ana"])
        .assert()
        .success();

    rosterbase()
        .args(["compare", "-i", data.to_str().unwrap(), "Ana", "Nobody"])
        .assert()
        .code(2)
        .stderr(contains("no record named 'Nobody'"));
}

#[test]
fn schema_command_writes_a_loadable_profile() {
    let ws = TestWorkspace::new();
    let schema_path = ws.path().join("students-schema.yml");

    rosterbase()
        .args(["schema", "--profile", "students", "-o", schema_path.to_str().unwrap()])
        .assert()
        .success();

    let written = ws.read("students-schema.yml");
    assert!(written.contains("columns"));
    assert!(written.contains("grade"));

    // the written schema drives a store end to end
    let data = ws.path().join("students.csv");
    rosterbase()
        .args(["add", "-i", data.to_str().unwrap()])
        .args(["--schema", schema_path.to_str().unwrap()])
        .args(["--set", "name=Ana", "--set", "grade=10A1"])
        .assert()
        .success()
        .stdout(contains("10A1"));
}
