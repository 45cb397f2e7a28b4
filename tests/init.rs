use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_keydev"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "keydev init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join("keydev.toml");
    assert!(config_path.exists(), "keydev.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[window]"));
    assert!(content.contains("[graph]"));
    assert!(content.contains("[metrics]"));

    // Verify it's valid TOML that keydev-core can parse
    let _config: keydev_core::KeydevConfig = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("keydev.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_keydev"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}
