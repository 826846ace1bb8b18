//! Test daemon management.
//!
//! Runs `netband` with a throwaway config, feeds it console lines and
//! collects what it printed once stdin closes.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A `netband` instance bound to a temporary directory.
#[allow(dead_code)]
pub struct TestDaemon {
    dir: TempDir,
}

impl TestDaemon {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = format!(
            r#"
[bans]
file = "{}"
sweep_interval_secs = 1
save_on_exit = true

[punish]
escalation_ban_minutes = 10

[log]
level = "warn"
"#,
            dir.path().join("bans.cfg").display()
        );
        std::fs::write(dir.path().join("netban.toml"), config)?;
        Ok(Self { dir })
    }

    pub fn bans_file(&self) -> PathBuf {
        self.dir.path().join("bans.cfg")
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("netban.toml")
    }

    /// Run the daemon until it consumes `input` and exits on EOF.
    pub fn run(&self, input: &str) -> anyhow::Result<Output> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_netband"))
            .arg(self.config_file())
            .env("RUST_LOG", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }
        Ok(child.wait_with_output()?)
    }
}
