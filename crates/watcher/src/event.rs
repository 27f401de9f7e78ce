//! Watch handles, raw backend events, and classified change events.

use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque token for one subscribed directory.
///
/// Backends hand out handles from a monotonic counter, so a handle is never
/// reused for a different directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(u64);

impl WatchHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of change a subscription reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An entry appeared in the directory (new file, new subdirectory,
    /// or something renamed into it)
    Created,
    /// An entry's contents or metadata changed
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Created => f.write_str("created"),
            ChangeKind::Modified => f.write_str("modified"),
        }
    }
}

/// Event as delivered by a backend: the entry name is relative to the
/// directory the handle watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: ChangeKind,
    pub name: PathBuf,
}

impl RawEvent {
    pub fn new(kind: ChangeKind, name: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Events collected for one handle since it was last armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBatch {
    pub handle: WatchHandle,
    pub events: Vec<RawEvent>,
}

/// Raw event resolved against its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Type of change
    pub kind: ChangeKind,
    /// Absolute path of the affected entry
    pub path: PathBuf,
    /// Directory the event occurred under
    pub dir: PathBuf,
}

impl ChangeEvent {
    /// Resolve `raw` relative to the watched directory `dir`.
    pub fn resolve(dir: &Path, raw: &RawEvent) -> Self {
        Self {
            kind: raw.kind,
            path: dir.join(&raw.name),
            dir: dir.to_path_buf(),
        }
    }

    /// Check whether the affected path ends in one of `extensions`.
    ///
    /// Extensions are compared without the leading dot.
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| want == ext))
            .unwrap_or(false)
    }
}
