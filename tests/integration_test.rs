use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn spooldex_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spooldex"))
}

#[test]
fn test_hash_password_prints_sha256() {
    let output = spooldex_cmd()
        .args(["hash-password", "abc"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_hash_password_from_stdin_ignores_trailing_newline() {
    let mut child = spooldex_cmd()
        .args(["hash-password", "--stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    child.stdin.take().unwrap().write_all(b"abc\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_hash_password_without_input_fails() {
    let output = spooldex_cmd().args(["hash-password"]).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("provide a password"));
}

#[test]
fn test_serve_rejects_invalid_password_hash() {
    let tmp = TempDir::new().unwrap();

    let output = spooldex_cmd()
        .current_dir(tmp.path())
        .env("SPOOLDEX_PASSWORD_HASH", "not-a-digest")
        .args(["serve", "--bind", "127.0.0.1:0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("password hash"));
}

#[test]
fn test_serve_refuses_corrupt_inventory() {
    let tmp = TempDir::new().unwrap();
    let data_file = tmp.path().join("filaments.csv");
    std::fs::write(&data_file, "color,company\nRed,Creality\n").unwrap();

    let output = spooldex_cmd()
        .current_dir(tmp.path())
        .env_remove("SPOOLDEX_PASSWORD_HASH")
        .args(["serve", "--bind", "127.0.0.1:0", "--data-file"])
        .arg(&data_file)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("corrupted"));
}

#[test]
fn test_serve_with_missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();

    let output = spooldex_cmd()
        .current_dir(tmp.path())
        .args(["serve", "--config", "absent.yaml"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read absent.yaml"));
}
