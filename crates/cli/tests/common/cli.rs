//! CLI command execution helpers with automatic timing
//!
//! Wraps the `hotreload` binary for one-shot runs (which must fail fast on
//! bad input) and for long-running watch sessions that the test stops.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct HotreloadCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
}

impl HotreloadCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_hotreload")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command.args(&self.args).current_dir(&self.working_dir);
        command
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }

    /// Start a watch session in the background
    pub fn spawn(&self) -> Result<WatchSession> {
        let child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn hotreload")?;

        Ok(WatchSession { child })
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

/// Running `hotreload` process, killed when dropped
pub struct WatchSession {
    child: Child,
}

impl WatchSession {
    /// True while the process has not exited
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll `check` every 50ms until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}

/// Macro for convenient command construction
///
/// Usage:
/// ```
/// hotreload!(dir, "src").assert_failure()?;
/// ```
#[macro_export]
macro_rules! hotreload {
    ($dir:expr $(, $arg:expr)*) => {{
        let mut cmd = $crate::common::cli::HotreloadCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
