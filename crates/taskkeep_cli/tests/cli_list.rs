use std::path::Path;
use std::process::{Command, Output};

fn taskkeep(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskkeep"))
        .args(args)
        .env("TASKKEEP_DATA_DIR", dir)
        .env("TASKKEEP_CONFIG_PATH", dir.join("config.json"))
        .env_remove("TASKKEEP_LOG")
        .output()
        .expect("failed to run taskkeep")
}

fn ids(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .expect("json array")
        .iter()
        .map(|item| item["id"].as_str().expect("id string").to_string())
        .collect()
}

#[test]
fn list_json_orders_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let tasks = serde_json::json!([
        { "id": "1700000000000", "title": "oldest", "description": "x" },
        { "id": "1700000009000", "title": "newest", "description": "x" },
        { "id": "1700000005000", "title": "middle", "description": "x", "completed": true }
    ]);
    std::fs::write(dir.path().join("tasks.json"), tasks.to_string()).unwrap();

    let output = taskkeep(dir.path(), &["list", "--json"]);

    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        ids(&listed),
        vec!["1700000009000", "1700000005000", "1700000000000"]
    );
}

#[test]
fn list_plain_renders_table() {
    let dir = tempfile::tempdir().unwrap();
    assert!(taskkeep(dir.path(), &["add", "Buy milk", "2%"]).status.success());

    let output = taskkeep(dir.path(), &["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Title"));
    assert!(stdout.contains("Buy milk"));
    assert!(stdout.contains("open"));
}

#[test]
fn list_on_fresh_install_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    let output = taskkeep(dir.path(), &["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks yet."));
}

#[test]
fn list_with_corrupt_storage_falls_back_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tasks.json"), "not json").unwrap();

    let output = taskkeep(dir.path(), &["list", "--json"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("treating unreadable tasks as empty"));
}

#[test]
fn completed_json_orders_most_recent_first() {
    let dir = tempfile::tempdir().unwrap();
    let completed = serde_json::json!([
        { "id": "1", "title": "a", "description": "x", "completedAt": "2024-01-01 09:00" },
        { "id": "2", "title": "b", "description": "x", "completedAt": "garbled" },
        { "id": "3", "title": "c", "description": "x", "completedAt": "2024-01-03 10:00" }
    ]);
    std::fs::write(dir.path().join("completedTasks.json"), completed.to_string()).unwrap();

    let output = taskkeep(dir.path(), &["completed", "--json"]);

    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids(&listed), vec!["3", "1", "2"]);
}

#[test]
fn show_command_prints_task_or_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let tasks = serde_json::json!([{ "id": "7", "title": "Pay rent", "description": "due 1st" }]);
    std::fs::write(dir.path().join("tasks.json"), tasks.to_string()).unwrap();

    let output = taskkeep(dir.path(), &["show", "7"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pay rent"));
    assert!(stdout.contains("due 1st"));

    let missing = taskkeep(dir.path(), &["show", "8"]);
    assert!(!missing.status.success());
    let stderr = String::from_utf8_lossy(&missing.stderr);
    assert!(stderr.contains("ERROR: not_found - task 8 not found"));
}

#[test]
fn data_dir_can_come_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let config_path = dir.path().join("config.json");
    let config = serde_json::json!({ "data_dir": data_dir });
    std::fs::write(&config_path, config.to_string()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_taskkeep"))
        .args(["add", "a", "b"])
        .env_remove("TASKKEEP_DATA_DIR")
        .env("TASKKEEP_CONFIG_PATH", &config_path)
        .output()
        .expect("failed to run taskkeep");

    assert!(output.status.success());
    assert!(data_dir.join("tasks.json").exists());
}

#[test]
fn log_level_override_enables_debug_output() {
    let dir = tempfile::tempdir().unwrap();

    let quiet = taskkeep(dir.path(), &["add", "a", "b"]);
    assert!(quiet.status.success());
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("created task"));

    let output = taskkeep(
        dir.path(),
        &["add", "c", "d", "--config-override", "log_level=debug"],
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DEBUG"));
    assert!(stderr.contains("created task"));
}
