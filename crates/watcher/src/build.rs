//! External build invocation
//!
//! The build runs inline in the event loop: it inherits the terminal so its
//! output is visible live, and the loop does not poll again until it exits.
//! There is no timeout; a hung build stalls the loop.

use std::fmt;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Command line of the full rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build from a program-first argument vector.
    ///
    /// Returns `None` for an empty vector.
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = argv.into_iter().map(Into::into);
        let program = iter.next()?;
        Some(Self {
            program,
            args: iter.collect(),
        })
    }
}

impl Default for BuildCommand {
    /// `mvn compile -T 1C`
    fn default() -> Self {
        Self::new("mvn").arg("compile").arg("-T").arg("1C")
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What happened to one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    /// Exited with a non-zero code
    Failed { code: i32 },
    /// Ended without an exit code (killed by a signal)
    Terminated,
    /// Could not be started at all
    SpawnFailed { reason: String },
}

/// Something the event loop can ask for a full rebuild.
///
/// `compile` never fails: problems are logged and reported through the
/// returned outcome so the loop keeps running.
#[async_trait]
pub trait Compiler: Send {
    async fn compile(&mut self) -> BuildOutcome;
}

/// Runs the configured build command as a child process.
#[derive(Debug, Clone, Default)]
pub struct BuildTrigger {
    command: BuildCommand,
}

impl BuildTrigger {
    pub fn new(command: BuildCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Compiler for BuildTrigger {
    async fn compile(&mut self) -> BuildOutcome {
        info!("Running build: {}", self.command);
        let started = Instant::now();

        let status = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        match status {
            Err(e) => {
                error!("Failed to launch `{}`: {}", self.command, e);
                BuildOutcome::SpawnFailed {
                    reason: e.to_string(),
                }
            }
            Ok(status) if status.success() => {
                info!(
                    "Build completed in {:.1?}, waiting for new changes",
                    started.elapsed()
                );
                BuildOutcome::Succeeded
            }
            Ok(status) => match status.code() {
                Some(code) => {
                    warn!("Build failed with exit code {} after {:.1?}", code, started.elapsed());
                    BuildOutcome::Failed { code }
                }
                None => {
                    warn!("Build terminated abnormally: {}", status);
                    BuildOutcome::Terminated
                }
            },
        }
    }
}
