//! Recursive directory registration
//!
//! Registration is split in two: `discover` is a pure walk that lists the
//! directories below a root, and `TreeRegistrar::register_all` subscribes the
//! ones not yet watched. The event loop re-invokes it for every directory
//! created while running, so nested creation is tracked as well.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, WatchError};
use crate::event::WatchHandle;
use crate::ignore::IgnoreRules;
use crate::platform::WatchBackend;

/// One subscribed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRegistration {
    pub handle: WatchHandle,
    pub path: PathBuf,
}

/// Bidirectional handle <-> directory map.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    by_handle: HashMap<WatchHandle, PathBuf>,
    by_path: HashMap<PathBuf, WatchHandle>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory watched by `handle`.
    pub fn path_of(&self, handle: WatchHandle) -> Option<&Path> {
        self.by_handle.get(&handle).map(PathBuf::as_path)
    }

    /// Handle watching `dir`, if any.
    pub fn handle_of(&self, dir: &Path) -> Option<WatchHandle> {
        self.by_path.get(dir).copied()
    }

    pub fn contains_dir(&self, dir: &Path) -> bool {
        self.by_path.contains_key(dir)
    }

    fn insert(&mut self, handle: WatchHandle, dir: PathBuf) {
        self.by_path.insert(dir.clone(), handle);
        self.by_handle.insert(handle, dir);
    }

    /// Drop a handle whose directory went away.
    pub fn remove(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        let dir = self.by_handle.remove(&handle)?;
        self.by_path.remove(&dir);
        Some(dir)
    }

    /// Keep only the handles `keep` accepts.
    fn retain(&mut self, mut keep: impl FnMut(WatchHandle) -> bool) {
        let by_path = &mut self.by_path;
        self.by_handle.retain(|handle, dir| {
            let kept = keep(*handle);
            if !kept {
                by_path.remove(dir);
            }
            kept
        });
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

/// List `root` and every directory below it, skipping ignored subtrees.
///
/// Fails if `root` itself cannot be read. Unreadable entries further down
/// are logged and skipped.
pub fn discover(root: &Path, ignore: &IgnoreRules) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| WatchError::InvalidRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !metadata.is_dir() {
        return Err(WatchError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    if ignore.is_ignored_dir(root) {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir() && !ignore.is_ignored_dir(e.path()))
    {
        match entry {
            Ok(entry) => dirs.push(entry.into_path()),
            Err(source) if source.depth() == 0 => {
                return Err(WatchError::Walk {
                    path: root.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!("Skipping unreadable directory {}: {}", path, e);
            }
        }
    }

    Ok(dirs)
}

/// Owns the registry and the ignore rules applied while walking.
#[derive(Debug)]
pub struct TreeRegistrar {
    ignore: IgnoreRules,
    registry: WatchRegistry,
}

impl TreeRegistrar {
    pub fn new(ignore: IgnoreRules) -> Self {
        Self {
            ignore,
            registry: WatchRegistry::new(),
        }
    }

    /// Subscribe every not-yet-watched directory under `root`.
    ///
    /// Returns the registrations made by this call. Directories that vanish
    /// between the walk and their subscription are skipped; other
    /// subscription failures abort the call but keep what was already
    /// registered.
    pub fn register_all<B>(&mut self, backend: &mut B, root: &Path) -> Result<Vec<WatchRegistration>>
    where
        B: WatchBackend + ?Sized,
    {
        let dirs = discover(root, &self.ignore)?;
        let mut registered = Vec::new();

        for dir in dirs {
            if let Some(existing) = self.registry.handle_of(&dir) {
                if backend.is_active(existing) {
                    debug!("Already watching {}", dir.display());
                    continue;
                }
                debug!("Watch {} on {} is stale, subscribing again", existing, dir.display());
                self.registry.remove(existing);
            }

            let handle = match backend.subscribe(&dir) {
                Ok(handle) => handle,
                Err(e) if !dir.is_dir() => {
                    debug!("Directory {} vanished before it could be watched: {}", dir.display(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            info!("Watching directory: {}", dir.display());
            self.registry.insert(handle, dir.clone());
            registered.push(WatchRegistration { handle, path: dir });
        }

        Ok(registered)
    }

    /// Forget a handle the backend reported as invalid.
    pub fn forget(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        self.registry.remove(handle)
    }

    /// Forget every handle the backend no longer considers active.
    ///
    /// Returns how many were dropped.
    pub fn prune<B>(&mut self, backend: &B) -> usize
    where
        B: WatchBackend + ?Sized,
    {
        let before = self.registry.len();
        self.registry.retain(|handle| backend.is_active(handle));
        before - self.registry.len()
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }
}
