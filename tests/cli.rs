use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TARGET: &str = r"~/Library/Application\ Support/Claude/claude_desktop_config.json";

fn mcpdesk(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mcpdesk").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG").current_dir(home);
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("input.json");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn bootstrap_prints_fixed_command() {
    let home = TempDir::new().unwrap();
    let expected = format!(
        "test -f {t} && pbcopy < {t} || (echo '{{\\n  \"mcpServers\": {{}}\\n}}' | tee {t} | pbcopy)\n",
        t = TARGET
    );
    mcpdesk(home.path())
        .arg("bootstrap")
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn show_without_input_prints_empty_document() {
    let home = TempDir::new().unwrap();
    mcpdesk(home.path())
        .arg("show")
        .assert()
        .success()
        .stdout("{\n  \"mcpServers\": {}\n}\n");
}

#[test]
fn show_reads_stdin() {
    let home = TempDir::new().unwrap();
    mcpdesk(home.path())
        .args(["--input", "-", "show"])
        .write_stdin(r#"{"mcpServers":{"a":{"command":"node","args":["a.js"]}}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a.js\""));
}

#[test]
fn add_prints_apply_command() {
    let home = TempDir::new().unwrap();
    let input = write_config(&home, r#"{"mcpServers":{}}"#);
    let expected = format!(
        "echo \"{{\\n  \\\"mcpServers\\\": {{\\n    \\\"filesystem\\\": {{\\n      \\\"command\\\": \\\"mcp\\\",\\n      \\\"args\\\": [\\n        \\\"filesystem\\\"\\n      ]\\n    }}\\n  }}\\n}}\" > {}\n",
        TARGET
    );
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .args(["add", "filesystem"])
        .assert()
        .success()
        .stdout(expected)
        .stderr(predicate::str::contains("restart Claude.app"));
}

#[test]
fn add_terminal_server_prints_install_command() {
    let home = TempDir::new().unwrap();
    let input = write_config(&home, r#"{"mcpServers":{}}"#);
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .args(["add", "obsidian"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mcp-obsidian"))
        .stdout(predicate::str::contains("echo \"").not());
}

#[test]
fn remove_last_server_leaves_nothing_to_apply() {
    let home = TempDir::new().unwrap();
    let input = write_config(
        &home,
        r#"{"mcpServers":{"memory":{"command":"mcp","args":["memory"]}}}"#,
    );
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .args(["remove", "memory"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("nothing to apply"));
}

#[test]
fn malformed_input_fails() {
    let home = TempDir::new().unwrap();
    let input = write_config(&home, "not json");
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed JSON input"));
}

#[test]
fn unknown_server_fails() {
    let home = TempDir::new().unwrap();
    let input = write_config(&home, r#"{"mcpServers":{}}"#);
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .args(["add", "no-such-server"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown server: no-such-server"));
}

#[test]
fn save_writes_artifact_to_out_dir() {
    let home = TempDir::new().unwrap();
    let input = write_config(&home, r#"{"mcpServers":{},"keep":true}"#);
    let out = home.path().join("out");
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .arg("save")
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("saved:"));
    let written = fs::read_to_string(out.join("claude_desktop_config.json")).unwrap();
    assert_eq!(written, "{\n  \"mcpServers\": {},\n  \"keep\": true\n}");
}

#[test]
fn validate_reports_bad_shape() {
    let home = TempDir::new().unwrap();
    let input = write_config(&home, r#"{"mcpServers":{"x":{"command":"mcp"}}}"#);
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("server x"));
}

#[test]
fn catalog_overrides_come_from_config_file() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".mcpdesk");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.toml"),
        "[[catalog]]\nid = \"linear\"\ndescription = \"Linear issues\"\n",
    )
    .unwrap();
    mcpdesk(home.path())
        .arg("catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("linear"))
        .stdout(predicate::str::contains("Linear issues"));
}

#[test]
fn editing_without_input_is_refused() {
    let home = TempDir::new().unwrap();
    for args in [
        vec!["add", "filesystem"],
        vec!["remove", "memory"],
        vec!["apply"],
        vec!["save"],
    ] {
        mcpdesk(home.path())
            .args(&args)
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("load your config first"));
    }
    assert!(!home.path().join("claude_desktop_config.json").exists());
}

#[test]
fn apply_keeps_javascript_number_notation() {
    let home = TempDir::new().unwrap();
    let input = write_config(
        &home,
        r#"{"mcpServers":{"a":{"command":"x","args":[]}},"x":1.0,"y":1e22,"z":-0}"#,
    );
    mcpdesk(home.path())
        .arg("--input")
        .arg(&input)
        .arg("apply")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"\"x\": 1,\n"#))
        .stdout(predicate::str::contains(r#"\"y\": 1e+22,\n"#))
        .stdout(predicate::str::contains(r#"\"z\": 0\n}"#));
}

#[test]
fn copy_to_piped_stdout_falls_back_to_printing() {
    let home = TempDir::new().unwrap();
    mcpdesk(home.path())
        .args(["--copy", "bootstrap"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("test -f "))
        .stdout(predicate::str::contains("\x1b]52").not())
        .stderr(predicate::str::contains("copied").not());
}
