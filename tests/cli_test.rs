//! CLI binary integration tests using assert_cmd.
//!
//! These invoke the actual binary and verify command-line behavior and
//! exit codes.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const ARCHIVE: &str = r#"[
    {
        "uuid": "uuid-1",
        "name": "Weekend plans",
        "created_at": "2025-06-17T10:00:00Z",
        "updated_at": "2025-06-17T10:05:00Z",
        "chat_messages": [
            {"sender": "human", "text": "Any hiking ideas?"},
            {"sender": "assistant", "text": "Try the coastal trail."}
        ]
    },
    {
        "uuid": "uuid-2",
        "name": "Empty one",
        "created_at": "2025-06-17T11:00:00Z",
        "updated_at": "2025-06-17T11:00:00Z",
        "chat_messages": []
    }
]"#;

fn bin(temp_home: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_claude-chat-notes"));
    // Keep a user config.toml from leaking into the test run
    cmd.env("HOME", temp_home)
        .env("XDG_CONFIG_HOME", temp_home.join(".config"));
    cmd
}

#[test]
fn export_writes_notes_and_reports_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = tmp.path().join("conversations.json");
    fs::write(&archive, ARCHIVE).unwrap();
    let out = tmp.path().join("notes");

    bin(tmp.path())
        .arg("export")
        .arg(&out)
        .arg("--archive")
        .arg(&archive)
        .assert()
        .success()
        .stderr(predicate::str::contains("Done. 1 exported, 1 filtered"));

    assert!(out.join("2025-06-17_Weekend_plans.md").exists());
}

#[test]
fn export_missing_archive_exits_nonzero() {
    let tmp = tempfile::tempdir().unwrap();

    bin(tmp.path())
        .arg("export")
        .arg(tmp.path().join("notes"))
        .arg("--archive")
        .arg(tmp.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Archive not found"));
}

#[test]
fn export_accepts_export_directory_instead_of_file() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("conversations.json"), ARCHIVE).unwrap();
    let out = tmp.path().join("notes");

    bin(tmp.path())
        .arg("export")
        .arg(&out)
        .arg("--archive")
        .arg(tmp.path())
        .assert()
        .success();

    assert!(out.join("2025-06-17_Weekend_plans.md").exists());
}

#[test]
fn individual_failures_keep_exit_code_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = tmp.path().join("conversations.json");
    fs::write(
        &archive,
        r#"[{
            "uuid": "uuid-bad",
            "name": "Bad clock",
            "created_at": "not a timestamp",
            "updated_at": "not a timestamp",
            "chat_messages": [
                {"sender": "human", "text": "hi"},
                {"sender": "assistant", "text": "hello"}
            ]
        }]"#,
    )
    .unwrap();

    bin(tmp.path())
        .arg("export")
        .arg(tmp.path().join("notes"))
        .arg("--archive")
        .arg(&archive)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 error(s)"));
}

#[test]
fn tag_with_identity_command_leaves_notes_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("notes");
    fs::create_dir_all(&out).unwrap();
    let note = out.join("2025-06-17_Weekend_plans.md");
    let body = "# Weekend plans\n\n**Messages:** 1\n\n## Human\n\nhi\n";
    fs::write(&note, body).unwrap();

    // `cat` returns the note unchanged: no new tags, nothing written
    bin(tmp.path())
        .arg("tag")
        .arg(&out)
        .arg("--command")
        .arg("cat")
        .assert()
        .success()
        .stderr(predicate::str::contains("0 tagged"));

    assert_eq!(fs::read_to_string(&note).unwrap(), body);
}

#[test]
fn tag_missing_directory_exits_nonzero() {
    let tmp = tempfile::tempdir().unwrap();

    bin(tmp.path())
        .arg("tag")
        .arg(tmp.path().join("missing"))
        .assert()
        .failure();
}
