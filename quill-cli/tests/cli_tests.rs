use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

const PREDECESSOR: &str = "# alice <Thursday, 01 February 2024>\n\n### Check-in\nTalked about X\n\n## Goals\nShip feature Y\n\n### Actions\n- follow up\n\n### Tags\n#keeping-in-touch\n";

fn quill_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("quill").expect("quill binary");
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG");
    cmd
}

fn initialized_home() -> TempDir {
    let home = TempDir::new().expect("home");
    quill_cmd(home.path()).arg("init").assert().success();
    home
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else { return out };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(markdown_files(&path));
        } else if path.extension().is_some_and(|e| e == "md") {
            out.push(path);
        }
    }
    out.sort();
    out
}

#[test]
fn init_writes_config_and_seeds_templates() {
    let home = TempDir::new().unwrap();
    quill_cmd(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("config.yaml"));

    assert!(home.path().join(".quill/config.yaml").is_file());
    assert!(home.path().join(".quill/templates/meeting").is_dir());

    quill_cmd(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("already"));
}

#[test]
fn templates_lists_every_kind() {
    let home = initialized_home();
    quill_cmd(home.path())
        .arg("templates")
        .assert()
        .success()
        .stdout(contains("meeting"))
        .stdout(contains("relationship-log"))
        .stdout(contains("project-scaffold"));
}

#[test]
fn new_meeting_creates_one_note() {
    let home = initialized_home();
    quill_cmd(home.path())
        .args(["new", "meeting"])
        .assert()
        .success()
        .stdout(contains("written to"));

    let notes = markdown_files(&home.path().join("Notes"));
    assert_eq!(notes.len(), 1, "got: {notes:?}");
    let content = fs::read_to_string(&notes[0]).unwrap();
    assert!(content.starts_with("# _MEETING_ <"));
    assert!(!content.contains("{{"));
    assert!(!home.path().join(".quill/.staging").exists());
}

#[test]
fn new_dry_run_writes_nothing() {
    let home = initialized_home();
    quill_cmd(home.path())
        .args(["new", "daily", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"));
    assert!(!home.path().join("Notes").exists());
}

#[test]
fn new_relationship_log_carries_fields_forward() {
    let home = initialized_home();
    let series = home.path().join("Notes/Keeping_in_touch/alice");
    fs::create_dir_all(&series).unwrap();
    fs::write(series.join("2020-02-01_09-00-00.md"), PREDECESSOR).unwrap();

    quill_cmd(home.path())
        .args(["new", "kit", "--entity", "alice"])
        .assert()
        .success()
        .stdout(contains("Carried forward"));

    let docs = markdown_files(&series);
    assert_eq!(docs.len(), 2);
    let created = fs::read_to_string(&docs[1]).unwrap();
    assert!(created.contains("Talked about X"));
    assert!(created.contains("Ship feature Y"));
    assert!(created.contains("- follow up"));
}

#[test]
fn relationship_log_prompts_for_entity() {
    let home = initialized_home();
    quill_cmd(home.path())
        .args(["new", "relationship-log"])
        .write_stdin("erin\n")
        .assert()
        .success();
    assert_eq!(
        markdown_files(&home.path().join("Notes/Keeping_in_touch/erin")).len(),
        1
    );
}

#[test]
fn malformed_predecessor_fails_with_path() {
    let home = initialized_home();
    let series = home.path().join("Notes/Keeping_in_touch/bob");
    fs::create_dir_all(&series).unwrap();
    fs::write(series.join("2020-01-01_09-00-00.md"), "### Check-in\nno goals\n").unwrap();

    quill_cmd(home.path())
        .args(["new", "kit", "-e", "bob"])
        .assert()
        .failure()
        .stderr(contains("2020-01-01_09-00-00.md"));
    assert_eq!(markdown_files(&series).len(), 1);
}

#[test]
fn stale_staging_blocks_runs_until_cleaned() {
    let home = initialized_home();
    let staging = home.path().join(".quill/.staging");
    fs::create_dir_all(&staging).unwrap();

    quill_cmd(home.path())
        .args(["new", "meeting"])
        .assert()
        .failure()
        .stderr(contains("quill clean"));

    quill_cmd(home.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(contains("Removed"));
    assert!(!staging.exists());

    quill_cmd(home.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(contains("Nothing to clean"));
}

#[test]
fn entities_json_lists_series() {
    let home = initialized_home();
    let series = home.path().join("Notes/Keeping_in_touch/alice");
    fs::create_dir_all(&series).unwrap();
    fs::write(series.join("2020-02-01_09-00-00.md"), PREDECESSOR).unwrap();

    let output = quill_cmd(home.path())
        .args(["entities", "--json"])
        .output()
        .expect("run quill entities");
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(parsed[0]["name"], "alice");
    assert_eq!(parsed[0]["documents"], 1);
    assert_eq!(parsed[0]["latest"], "2020-02-01_09-00-00.md");
}

#[test]
fn retitle_dry_run_reports_without_renaming() {
    let home = initialized_home();
    let day = home.path().join("Notes/2024/01-January/15-Monday");
    fs::create_dir_all(&day).unwrap();
    let note = day.join("2024-01-15_10-30-00.md");
    fs::write(&note, "# Standup: infra <Monday, 15 January 2024>\n").unwrap();

    quill_cmd(home.path())
        .args(["retitle", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("2024-01-15_10-30-00 - Standup infra.md"));
    assert!(note.exists());

    quill_cmd(home.path()).arg("retitle").assert().success();
    assert!(day.join("2024-01-15_10-30-00 - Standup infra.md").exists());
}

#[test]
fn unknown_kind_is_rejected() {
    let home = TempDir::new().unwrap();
    quill_cmd(home.path())
        .args(["new", "weekly"])
        .assert()
        .failure()
        .stderr(contains("unknown template kind"));
}
