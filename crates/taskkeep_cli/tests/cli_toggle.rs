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

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn seed(dir: &Path) {
    let tasks = serde_json::json!([
        { "id": "1", "title": "Buy milk", "description": "2%" },
        { "id": "2", "title": "Pay rent", "description": "due 1st" }
    ]);
    std::fs::write(dir.join("tasks.json"), tasks.to_string()).unwrap();
}

#[test]
fn toggle_command_completes_task_and_writes_projection() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = taskkeep(dir.path(), &["toggle", "2"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Completed task: Pay rent (2)"));

    let tasks = read_json(&dir.path().join("tasks.json"));
    assert_eq!(tasks[1]["completed"], true);
    assert!(tasks[1]["completedAt"].is_string());

    let completed = read_json(&dir.path().join("completedTasks.json"));
    assert_eq!(completed.as_array().map(Vec::len), Some(1));
    assert_eq!(completed[0]["id"], "2");
    assert_eq!(completed[0]["completedAt"], tasks[1]["completedAt"]);
}

#[test]
fn toggle_command_reopens_and_keeps_completed_at() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    assert!(taskkeep(dir.path(), &["toggle", "1"]).status.success());
    let stamped = read_json(&dir.path().join("tasks.json"))[0]["completedAt"].clone();

    let output = taskkeep(dir.path(), &["toggle", "1"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Reopened task: Buy milk (1)"));

    let tasks = read_json(&dir.path().join("tasks.json"));
    assert_eq!(tasks[0]["completed"], false);
    assert_eq!(tasks[0]["completedAt"], stamped);

    let completed = read_json(&dir.path().join("completedTasks.json"));
    assert_eq!(completed, serde_json::json!([]));
}

#[test]
fn deleted_completed_task_stays_in_completed_list_until_repair() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    assert!(taskkeep(dir.path(), &["toggle", "2"]).status.success());
    assert!(taskkeep(dir.path(), &["delete", "2"]).status.success());

    let listed = taskkeep(dir.path(), &["completed", "--json"]);
    let completed: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(completed[0]["id"], "2");

    let derived = taskkeep(
        dir.path(),
        &["completed", "--json", "--config-override", "completed_source=derived"],
    );
    let completed: serde_json::Value = serde_json::from_slice(&derived.stdout).unwrap();
    assert_eq!(completed, serde_json::json!([]));

    let repaired = taskkeep(dir.path(), &["repair"]);
    assert!(repaired.status.success());
    let stdout = String::from_utf8_lossy(&repaired.stdout);
    assert!(stdout.contains("Rebuilt completed list: 0 task(s)"));

    let completed = read_json(&dir.path().join("completedTasks.json"));
    assert_eq!(completed, serde_json::json!([]));
}

#[test]
fn toggle_command_unknown_id_prints_no_change() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = taskkeep(dir.path(), &["toggle", "42", "--json"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "null");
}
