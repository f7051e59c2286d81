// Shared test helpers for integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

pub fn binary_path() -> PathBuf {
    let path = PathBuf::from(env!("CARGO_BIN_EXE_plugin-hook"));
    assert!(path.exists(), "binary not found at {}", path.display());
    path
}

/// Output of one binary run.
pub struct HookRun {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl HookRun {
    /// Parses stdout as the single JSON decision document.
    pub fn json(&self) -> serde_json::Value {
        let mut lines = self.stdout.lines();
        let first = lines.next().expect("stdout should have a line");
        assert!(lines.next().is_none(), "stdout should be one line: {}", self.stdout);
        serde_json::from_str(first).expect("stdout should be valid JSON")
    }

    pub fn decision(&self) -> String {
        self.json()["decision"]
            .as_str()
            .expect("decision must be a string")
            .to_string()
    }
}

pub fn run_hook(stdin_input: &str) -> HookRun {
    run_binary(stdin_input, &["hook"], &[])
}

pub fn run_hook_with_config(stdin_input: &str, config_content: &str) -> HookRun {
    let tmpfile = write_config(config_content);
    let config_path = tmpfile.path().to_str().unwrap().to_string();
    run_binary(stdin_input, &["hook", "--config", &config_path], &[])
}

pub fn write_config(content: &str) -> NamedTempFile {
    let mut tmpfile = NamedTempFile::new().expect("failed to create temp config");
    tmpfile
        .write_all(content.as_bytes())
        .expect("failed to write config");
    tmpfile
}

/// Runs the binary with the given stdin, args and extra environment.
///
/// The hook's own variables are cleared first so the host environment
/// never leaks into a test.
pub fn run_binary(stdin_input: &str, args: &[&str], env: &[(&str, &str)]) -> HookRun {
    let mut cmd = Command::new(binary_path());
    cmd.args(args)
        .env_remove("CLAUDE_PROJECT_DIR")
        .env_remove("CLAUDE_PLUGIN_ROOT")
        .env_remove("PLUGIN_HOOK_LOG");
    for (key, value) in env {
        cmd.env(key, value);
    }
    let output = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            use std::io::ErrorKind;
            let write_result = child
                .stdin
                .take()
                .unwrap()
                .write_all(stdin_input.as_bytes());
            if let Err(e) = write_result {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
            child.wait_with_output()
        })
        .expect("failed to execute binary");

    HookRun {
        stdout: String::from_utf8(output.stdout).expect("stdout not valid UTF-8"),
        stderr: String::from_utf8(output.stderr).expect("stderr not valid UTF-8"),
        exit_code: output.status.code().unwrap_or(-1),
    }
}

pub fn bash_input_json(command: &str) -> String {
    serde_json::json!({
        "session_id": "sess-e2e-test",
        "cwd": "/tmp/test",
        "hook_event_name": "PreToolUse",
        "tool_name": "Bash",
        "tool_input": {"command": command},
    })
    .to_string()
}
