//! Common test utilities and fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const TEST_MODEL: &str = "gemini-test";

/// Path of the mocked `generateContent` route for [`TEST_MODEL`].
pub fn generate_path() -> String {
    format!("/v1beta/models/{TEST_MODEL}:generateContent")
}

/// A successful `generateContent` response body carrying `text`.
pub fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 5}
    })
    .to_string()
}

/// Creates a temporary directory for test fixtures.
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Creates a mock project structure for testing.
pub fn create_mock_project(dir: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = dir.path().to_path_buf();

    for (path, content) in files {
        let file_path = root.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    root
}

/// A small Python web project with a vendored dependency tree to ignore.
pub fn python_project_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("requirements.txt", "flask==3.0.0\n"),
        ("app/main.py", "from flask import Flask\napp = Flask(__name__)\n"),
        ("app/__pycache__/main.cpython-312.pyc", ""),
        ("web/package.json", "{\"name\": \"web\"}\n"),
        ("web/node_modules/left-pad/package.json", "{\"name\": \"left-pad\"}\n"),
        (".git/HEAD", "ref: refs/heads/main\n"),
    ]
}

/// Builds a command for the compiled binary, isolated from the developer's
/// environment: runs inside `cwd`, with its own config home, no credential
/// and no `PARROTY_*` overrides unless the test adds them.
pub fn parroty_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_parroty"));
    cmd.current_dir(cwd)
        .env("XDG_CONFIG_HOME", cwd.join(".config"))
        .env("HOME", cwd)
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("PARROTY_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Runs the binary against a mock Gemini server at `endpoint`.
pub fn run_with_model(cwd: &Path, endpoint: &str, args: &[&str]) -> Output {
    parroty_cmd(cwd)
        .env("GEMINI_API_KEY", "test-key")
        .env("PARROTY_MODEL_NAME", TEST_MODEL)
        .env("PARROTY_MODEL_ENDPOINT", endpoint)
        .env("PARROTY_MODEL_RETRIES", "0")
        .args(args)
        .output()
        .expect("Failed to execute command")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
