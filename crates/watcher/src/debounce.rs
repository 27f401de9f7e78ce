//! Per-path debouncing logic
//!
//! Editors tend to emit several modify events for a single save. The tracker
//! remembers when each path last started a build and rejects events that
//! arrive inside the debounce window, so a burst collapses to one build.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Gate deciding whether a change to a path is fresh enough to act on.
///
/// Entries are never evicted; the working set of a source tree is small
/// enough that this stays bounded in practice.
#[derive(Debug)]
pub struct DebounceTracker {
    /// Last accepted trigger per path
    last_trigger: HashMap<PathBuf, Instant>,
    /// Minimum spacing between accepted triggers of the same path
    window: Duration,
}

impl DebounceTracker {
    /// Create a tracker with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            last_trigger: HashMap::new(),
            window,
        }
    }

    /// Check `path` against the window using the current instant.
    pub fn should_trigger(&mut self, path: &Path) -> bool {
        self.should_trigger_at(path, Instant::now())
    }

    /// Check `path` against the window at `now`.
    ///
    /// Returns true and records `now` if the path has never triggered or its
    /// last accepted trigger is at least one window old. Rejections leave the
    /// state untouched, so a steady stream of events cannot push the window
    /// forward indefinitely.
    pub fn should_trigger_at(&mut self, path: &Path, now: Instant) -> bool {
        let fresh = match self.last_trigger.get(path) {
            Some(last) => now.saturating_duration_since(*last) >= self.window,
            None => true,
        };

        if fresh {
            self.last_trigger.insert(path.to_path_buf(), now);
        }
        fresh
    }

    /// Configured window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of paths that have triggered at least once.
    pub fn len(&self) -> usize {
        self.last_trigger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_trigger.is_empty()
    }
}

impl Default for DebounceTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}
