//! The watch/debounce/dispatch loop
//!
//! ```text
//!   Idle ── poll(timeout) ──► batch ──► Dispatching ── rearm ──► Idle
//!    ▲          │
//!    └─ timeout ┘
//! ```
//!
//! Dispatching resolves each event against its directory and routes it:
//! modified source files go through the debounce gate to the compiler, new
//! directories go back to the registrar. Builds are awaited inline, so they
//! never overlap and events arriving meanwhile wait in the backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::build::Compiler;
use crate::config::WatchConfig;
use crate::debounce::DebounceTracker;
use crate::error::{Result, WatchError};
use crate::event::{ChangeEvent, ChangeKind, WatchBatch};
use crate::ignore::IgnoreRules;
use crate::platform::WatchBackend;
use crate::registrar::{TreeRegistrar, WatchRegistration, WatchRegistry};

/// Result of a single poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The poll timed out without a batch
    Idle,
    /// A batch was processed, running `builds` builds
    Dispatched { builds: usize },
}

/// Single-owner hot reload loop.
///
/// Owns the backend, the handle map, the debounce state and the compiler;
/// nothing is shared, so nothing is locked.
pub struct HotReloadLoop<B, C> {
    root: PathBuf,
    backend: B,
    registrar: TreeRegistrar,
    debounce: DebounceTracker,
    compiler: C,
    extensions: Vec<String>,
    poll_timeout: Duration,
}

impl<B, C> HotReloadLoop<B, C>
where
    B: WatchBackend,
    C: Compiler,
{
    /// Prepare a loop for `config.root`. Nothing is watched until `start`.
    pub fn new(config: &WatchConfig, backend: B, compiler: C) -> Result<Self> {
        let root = config
            .root
            .canonicalize()
            .map_err(|e| WatchError::InvalidRoot {
                path: config.root.clone(),
                reason: e.to_string(),
            })?;

        let ignore = IgnoreRules::load(&root, config.ignore.clone())?;

        Ok(Self {
            root,
            backend,
            registrar: TreeRegistrar::new(ignore),
            debounce: DebounceTracker::new(config.debounce),
            compiler,
            extensions: config.extensions.clone(),
            poll_timeout: config.poll_timeout,
        })
    }

    /// Register the whole tree under the root.
    pub fn start(&mut self) -> Result<Vec<WatchRegistration>> {
        let registrations = self.registrar.register_all(&mut self.backend, &self.root)?;
        info!("Scanning {} for file changes", self.root.display());
        Ok(registrations)
    }

    /// Poll and dispatch until the backend fails.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.step().await?;
        }
    }

    /// One Idle -> Dispatching -> Idle cycle.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let polled = self.backend.poll(self.poll_timeout).await?;

        let dropped = self.registrar.prune(&self.backend);
        if dropped > 0 {
            debug!("Stopped watching {} removed directories", dropped);
        }

        match polled {
            None => {
                debug!("No changes in the last {:?}", self.poll_timeout);
                Ok(StepOutcome::Idle)
            }
            Some(batch) => {
                let builds = self.dispatch(batch).await?;
                Ok(StepOutcome::Dispatched { builds })
            }
        }
    }

    /// Process one batch in delivery order, then re-arm its handle.
    ///
    /// Returns the number of builds run. Only backend-level failures while
    /// registering a new directory are returned as errors.
    pub async fn dispatch(&mut self, batch: WatchBatch) -> Result<usize> {
        let Some(dir) = self.registrar.registry().path_of(batch.handle).map(Path::to_path_buf) else {
            debug!("Ignoring batch for unknown watch {}", batch.handle);
            return Ok(0);
        };

        let mut builds = 0;

        for raw in &batch.events {
            let event = ChangeEvent::resolve(&dir, raw);

            match event.kind {
                ChangeKind::Modified if event.has_extension(&self.extensions) => {
                    if self.debounce.should_trigger(&event.path) {
                        info!("File changed: {}", event.path.display());
                        let outcome = self.compiler.compile().await;
                        debug!(?outcome, "Build finished");
                        builds += 1;
                    } else {
                        debug!("Debounced change to {}", event.path.display());
                    }
                }
                ChangeKind::Created if event.path.is_dir() => {
                    info!("Created new directory: {}", event.path.display());
                    match self.registrar.register_all(&mut self.backend, &event.path) {
                        Ok(_) => {}
                        Err(e) if e.is_recoverable() => {
                            warn!("Could not watch {}: {}", event.path.display(), e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                _ => {}
            }
        }

        if !self.backend.rearm(batch.handle) {
            debug!("Watch {} on {} is no longer valid", batch.handle, dir.display());
            self.registrar.forget(batch.handle);
        }

        Ok(builds)
    }

    /// Canonical watch root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &WatchRegistry {
        self.registrar.registry()
    }

    pub fn debounce(&self) -> &DebounceTracker {
        &self.debounce
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
