use std::process::Command;

const LOG: &str = r#"{"change_sets": [
    {"commit_hash": "c1", "author": "alice", "date": "2019-01-01T10:00:00Z",
     "issues": [], "code_changes": [{"file_path": "core/a/F.java", "change_type": "ADD"}]},
    {"commit_hash": "c2", "author": "bob", "date": "2019-01-02T10:00:00Z",
     "issues": [], "code_changes": [{"file_path": "core/a/F.java", "change_type": "MODIFY"}]},
    {"commit_hash": "c3", "author": "alice", "date": "2019-01-03T10:00:00Z",
     "issues": [], "code_changes": [{"file_path": "ui/b/G.java", "change_type": "ADD"}]}
]}"#;

#[test]
fn run_writes_jsonl_scores_and_rank_reads_them() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("log.json"), LOG).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_keydev"))
        .args([
            "run",
            "log.json",
            "--output",
            "scores.jsonl",
            "--window-days",
            "3",
        ])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "keydev run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let content = std::fs::read_to_string(dir.path().join("scores.jsonl")).unwrap();
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    assert!(!lines.is_empty(), "run should produce score lines");
    for line in &lines {
        let score: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(score.get("windowEnd").is_some());
        assert!(score.get("developer").is_some());
        assert!(score.get("jack").is_some());
        assert!(score.get("maven").is_some());
        assert!(score.get("connector").is_some());
    }

    let rank = Command::new(env!("CARGO_BIN_EXE_keydev"))
        .args(["rank", "scores.jsonl", "--metric", "jack"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        rank.status.success(),
        "keydev rank failed: {}",
        String::from_utf8_lossy(&rank.stderr)
    );
    let stdout = String::from_utf8_lossy(&rank.stdout);
    assert!(stdout.contains("alice"), "rank output: {stdout}");
}

#[test]
fn resumed_run_appends_no_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("log.json"), LOG).unwrap();

    let run = |resume: bool| {
        let mut args = vec!["run", "log.json", "--output", "scores.jsonl", "--window-days", "3"];
        if resume {
            args.push("--resume");
        }
        let output = Command::new(env!("CARGO_BIN_EXE_keydev"))
            .args(&args)
            .current_dir(dir.path())
            .output()
            .unwrap();
        assert!(output.status.success());
    };

    run(false);
    let first = std::fs::read_to_string(dir.path().join("scores.jsonl")).unwrap();
    run(true);
    let second = std::fs::read_to_string(dir.path().join("scores.jsonl")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn missing_dataset_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_keydev"))
        .args(["run", "nope.json"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}
