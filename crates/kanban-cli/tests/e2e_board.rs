//! E2E CLI workflow tests: init, signup, board/column/task/subtask commands,
//! and the JSON contract of success and error output.
//!
//! Each test runs the `kanban` binary as a subprocess in an isolated temp
//! directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

const ADA: &str = "ada@example.com";
const GRACE: &str = "grace@example.com";

/// Build a Command targeting the kanban binary, rooted in `dir`, acting as Ada.
fn kanban_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kanban"));
    cmd.current_dir(dir);
    // Keep the developer's user config and format out of the test.
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("FORMAT");
    cmd.env("KANBAN_USER", ADA);
    cmd.env("KANBAN_LOG", "error");
    cmd
}

/// Run with `--json`, assert success, and parse stdout.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = kanban_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

/// Run with `--json`, assert failure, and return the error object from stderr.
fn run_json_err(dir: &Path, args: &[&str]) -> Value {
    let output = kanban_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(!output.status.success(), "{args:?} unexpectedly succeeded");
    let json: Value =
        serde_json::from_slice(&output.stderr).expect("stderr should be a JSON error envelope");
    json["error"].clone()
}

/// Initialize a store and register Ada. Returns the default board.
fn setup() -> (TempDir, Value) {
    let dir = TempDir::new().expect("tempdir");
    kanban_cmd(dir.path()).arg("init").assert().success();
    let account = run_json(
        dir.path(),
        &["signup", "--name", "Ada", "--email", ADA],
    );
    (dir, account["board"].clone())
}

fn id_of(value: &Value) -> String {
    value["id"].as_i64().expect("numeric id").to_string()
}

fn column_id(board: &Value, index: usize) -> String {
    id_of(&board["columns"][index])
}

fn add_task(dir: &Path, column: &str, title: &str) -> String {
    id_of(&run_json(dir, &["task", "add", column, title]))
}

/// Task titles per column, in position order.
fn layout(dir: &Path, board: &str) -> Vec<Vec<String>> {
    let board = run_json(dir, &["board", "show", board]);
    board["columns"]
        .as_array()
        .expect("columns array")
        .iter()
        .map(|column| {
            column["tasks"]
                .as_array()
                .expect("tasks array")
                .iter()
                .map(|task| task["title"].as_str().expect("title").to_string())
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn signup_seeds_default_board() {
    let (_dir, board) = setup();
    assert_eq!(board["name"], "My First Board");
    let names: Vec<&str> = board["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["TODO", "DOING", "DONE"]);
}

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().expect("tempdir");
    kanban_cmd(dir.path()).arg("init").assert().success();

    let content = std::fs::read_to_string(dir.path().join(".kanban/config.toml"))
        .expect("config written");
    let config: toml::Table = toml::from_str(&content).expect("config is valid TOML");
    assert_eq!(config["signup"]["default_board"].as_str(), Some("My First Board"));
    assert_eq!(config["store"]["busy_timeout_ms"].as_integer(), Some(5000));
}

#[test]
fn commands_before_init_report_not_initialized() {
    let dir = TempDir::new().expect("tempdir");
    let err = run_json_err(dir.path(), &["board", "list"]);
    assert_eq!(err["error_code"], "E1001");
}

#[test]
fn duplicate_signup_is_rejected() {
    let (dir, _) = setup();
    let err = run_json_err(
        dir.path(),
        &["signup", "--name", "Ada Again", "--email", "ADA@example.com"],
    );
    assert_eq!(err["error_code"], "E4002");
}

#[test]
fn unknown_acting_user_is_rejected() {
    let (dir, _) = setup();
    let err = run_json_err(dir.path(), &["board", "list", "--user", "nobody@example.com"]);
    assert_eq!(err["error_code"], "E1003");
}

// ---------------------------------------------------------------------------
// Task moves
// ---------------------------------------------------------------------------

#[test]
fn move_within_and_across_columns_keeps_positions_dense() {
    let (dir, board) = setup();
    let dir = dir.path();
    let board_id = id_of(&board);
    let todo = column_id(&board, 0);
    let doing = column_id(&board, 1);

    let a = add_task(dir, &todo, "a");
    add_task(dir, &todo, "b");
    add_task(dir, &todo, "c");
    add_task(dir, &doing, "x");

    // a to the bottom of TODO.
    let moved = run_json(dir, &["task", "move", &a, "--to", &todo, "--index", "2"]);
    assert_eq!(moved["position"], 2);
    assert_eq!(layout(dir, &board_id)[0], ["b", "c", "a"]);

    // a to the top of DOING.
    let moved = run_json(dir, &["task", "move", &a, "--to", &doing, "--index", "0"]);
    assert_eq!(moved["column_id"].to_string(), doing);
    assert_eq!(moved["position"], 0);

    let columns = layout(dir, &board_id);
    assert_eq!(columns[0], ["b", "c"]);
    assert_eq!(columns[1], ["a", "x"]);

    kanban_cmd(dir).arg("verify").assert().success();
}

#[test]
fn stale_source_index_is_rejected_without_changes() {
    let (dir, board) = setup();
    let dir = dir.path();
    let board_id = id_of(&board);
    let todo = column_id(&board, 0);
    add_task(dir, &todo, "a");
    let b = add_task(dir, &todo, "b");

    let err = run_json_err(
        dir,
        &["task", "move", &b, "--to", &todo, "--index", "0", "--from", &todo, "--from-index", "0"],
    );
    assert_eq!(err["error_code"], "E3001");
    assert_eq!(layout(dir, &board_id)[0], ["a", "b"]);
}

#[test]
fn negative_index_is_an_invalid_move() {
    let (dir, board) = setup();
    let dir = dir.path();
    let todo = column_id(&board, 0);
    let a = add_task(dir, &todo, "a");

    let err = run_json_err(dir, &["task", "move", &a, "--to", &todo, "--index", "-1"]);
    assert_eq!(err["error_code"], "E3001");
}

#[test]
fn moving_to_another_board_is_rejected() {
    let (dir, board) = setup();
    let dir = dir.path();
    let todo = column_id(&board, 0);
    let a = add_task(dir, &todo, "a");

    let other = run_json(dir, &["board", "create", "Other", "--column", "Inbox"]);
    let inbox = column_id(&other, 0);

    let err = run_json_err(dir, &["task", "move", &a, "--to", &inbox, "--index", "0"]);
    assert_eq!(err["error_code"], "E3001");
}

#[test]
fn delete_task_closes_the_gap() {
    let (dir, board) = setup();
    let dir = dir.path();
    let board_id = id_of(&board);
    let todo = column_id(&board, 0);
    add_task(dir, &todo, "a");
    let b = add_task(dir, &todo, "b");
    add_task(dir, &todo, "c");

    kanban_cmd(dir).args(["task", "delete", &b]).assert().success();

    let board = run_json(dir, &["board", "show", &board_id]);
    let positions: Vec<i64> = board["columns"][0]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .map(|task| task["position"].as_i64().expect("position"))
        .collect();
    assert_eq!(positions, [0, 1]);
}

// ---------------------------------------------------------------------------
// Columns and boards
// ---------------------------------------------------------------------------

#[test]
fn column_move_and_delete_renumber_siblings() {
    let (dir, board) = setup();
    let dir = dir.path();
    let board_id = id_of(&board);
    let done = column_id(&board, 2);

    kanban_cmd(dir)
        .args(["column", "move", &done, "0"])
        .assert()
        .success();
    let shown = run_json(dir, &["board", "show", &board_id]);
    assert_eq!(shown["columns"][0]["name"], "DONE");
    assert_eq!(shown["columns"][2]["position"], 2);

    let todo = column_id(&board, 0);
    kanban_cmd(dir)
        .args(["column", "delete", &todo])
        .assert()
        .success();
    let shown = run_json(dir, &["board", "show", &board_id]);
    let names: Vec<&str> = shown["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["DONE", "DOING"]);
    assert_eq!(shown["columns"][1]["position"], 1);
}

#[test]
fn board_rename_replaces_column_list() {
    let (dir, board) = setup();
    let dir = dir.path();
    let board_id = id_of(&board);
    let todo = column_id(&board, 0);
    let doing = column_id(&board, 1);

    let spec_doing = format!("{doing}:In Progress");
    let spec_todo = format!("{todo}:Backlog");
    let shown = run_json(
        dir,
        &[
            "board", "rename", &board_id, "Roadmap", "--column", &spec_doing, "--column",
            &spec_todo, "--column", "Review",
        ],
    );

    assert_eq!(shown["name"], "Roadmap");
    let names: Vec<&str> = shown["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["In Progress", "Backlog", "Review"]);
}

#[test]
fn other_users_cannot_touch_a_board() {
    let (dir, board) = setup();
    let dir = dir.path();
    let board_id = id_of(&board);
    run_json(dir, &["signup", "--name", "Grace", "--email", GRACE]);

    let err = run_json_err(dir, &["board", "show", &board_id, "--user", GRACE]);
    assert_eq!(err["error_code"], "E4001");

    let boards = run_json(dir, &["board", "list", "--user", GRACE]);
    assert_eq!(boards.as_array().map(Vec::len), Some(1));
}

#[test]
fn missing_board_reports_not_found() {
    let (dir, _) = setup();
    let err = run_json_err(dir.path(), &["board", "show", "999"]);
    assert_eq!(err["error_code"], "E2001");
}

// ---------------------------------------------------------------------------
// Subtasks and output modes
// ---------------------------------------------------------------------------

#[test]
fn subtask_toggle_flips_completion() {
    let (dir, board) = setup();
    let dir = dir.path();
    let todo = column_id(&board, 0);
    let task = run_json(dir, &["task", "add", &todo, "Ship", "--subtask", "Tag"]);
    let subtask = id_of(&task["subtasks"][0]);
    assert_eq!(task["subtasks"][0]["is_completed"], false);

    let toggled = run_json(dir, &["subtask", "toggle", &subtask]);
    assert_eq!(toggled["is_completed"], true);
    let toggled = run_json(dir, &["subtask", "toggle", &subtask]);
    assert_eq!(toggled["is_completed"], false);
    let forced = run_json(dir, &["subtask", "toggle", &subtask, "--undone"]);
    assert_eq!(forced["is_completed"], false);
}

#[test]
fn text_board_output_lists_tasks() {
    let (dir, board) = setup();
    let dir = dir.path();
    let todo = column_id(&board, 0);
    add_task(dir, &todo, "Write docs");

    kanban_cmd(dir)
        .args(["board", "show", &id_of(&board), "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("COLUMN_ID\tCOLUMN\tPOSITION\tTASK_ID\tTITLE"))
        .stdout(predicate::str::contains("\tTODO\t0\t"))
        .stdout(predicate::str::contains("Write docs"));
}

#[test]
fn verify_reports_clean_store() {
    let (dir, _) = setup();
    let report = run_json(dir.path(), &["verify"]);
    assert_eq!(report["ok"], true);
    assert_eq!(report["violations"].as_array().map(Vec::len), Some(0));

    let repaired = run_json(dir.path(), &["repair"]);
    assert_eq!(repaired["renumbered"], 0);
}
