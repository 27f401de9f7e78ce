//! `notify`-based backend
//!
//! One non-recursive watch per directory. The notify callback runs on its
//! own thread and only forwards raw results into an unbounded channel; all
//! bookkeeping happens on the polling side.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::WatchBackend;
use crate::error::{Result, WatchError};
use crate::event::{ChangeKind, RawEvent, WatchBatch, WatchHandle};

/// Production backend built on the platform's recommended notify watcher.
pub struct NotifyBackend {
    /// Internal notify watcher
    watcher: RecommendedWatcher,

    /// Raw results from the notify thread
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Watched directory -> handle
    dirs: HashMap<PathBuf, WatchHandle>,

    /// Handle -> watched directory
    handles: HashMap<WatchHandle, PathBuf>,

    /// Handles allowed to deliver their next batch
    armed: HashSet<WatchHandle>,

    /// Events received but not yet delivered, in arrival order
    pending: VecDeque<(WatchHandle, RawEvent)>,

    /// Next handle id; never reused
    next_id: u64,
}

impl NotifyBackend {
    /// Create a backend with no subscriptions.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // The receiver only disappears when the backend is dropped
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher,
            rx,
            dirs: HashMap::new(),
            handles: HashMap::new(),
            armed: HashSet::new(),
            pending: VecDeque::new(),
            next_id: 1,
        })
    }

    /// Number of directories currently subscribed.
    pub fn watched_count(&self) -> usize {
        self.dirs.len()
    }

    /// Translate one notify event into queued raw events, releasing the
    /// watches of directories it reports gone.
    fn ingest(&mut self, res: notify::Result<Event>) -> Result<()> {
        let event = res?;

        if event.need_rescan() {
            warn!("Notification queue overflowed; some changes may have been missed");
        }

        for gone in departed(&event) {
            let stale: Vec<PathBuf> = self
                .dirs
                .keys()
                .filter(|dir| dir.starts_with(gone))
                .cloned()
                .collect();

            for dir in stale {
                if let Some(handle) = self.release(&dir) {
                    debug!("Watch {} on {} ended: directory removed", handle, dir.display());
                }
            }
        }

        for (kind, path) in classify(&event) {
            let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
                continue;
            };

            match self.dirs.get(dir) {
                Some(handle) => self
                    .pending
                    .push_back((*handle, RawEvent::new(kind, PathBuf::from(name)))),
                None => debug!("Dropping event for unwatched path {}", path.display()),
            }
        }

        Ok(())
    }

    /// Drop the watch on `dir`. Its handle never becomes valid again.
    fn release(&mut self, dir: &Path) -> Option<WatchHandle> {
        let handle = self.dirs.remove(dir)?;

        // The kernel usually dropped the watch together with the directory
        if let Err(e) = self.watcher.unwatch(dir) {
            debug!("Unwatching {} failed: {}", dir.display(), e);
        }

        self.handles.remove(&handle);
        self.armed.remove(&handle);
        self.pending.retain(|(h, _)| *h != handle);
        Some(handle)
    }

    /// Pull everything the notify thread has already produced.
    fn drain_ready(&mut self) -> Result<()> {
        while let Ok(res) = self.rx.try_recv() {
            self.ingest(res)?;
        }
        Ok(())
    }

    /// Take all pending events of the first armed handle that has any.
    fn take_batch(&mut self) -> Option<WatchBatch> {
        let handle = self
            .pending
            .iter()
            .map(|(handle, _)| *handle)
            .find(|handle| self.armed.contains(handle))?;

        let mut events = Vec::new();
        self.pending.retain(|(h, event)| {
            if *h == handle {
                events.push(event.clone());
                false
            } else {
                true
            }
        });

        self.armed.remove(&handle);
        Some(WatchBatch { handle, events })
    }
}

#[async_trait]
impl WatchBackend for NotifyBackend {
    fn subscribe(&mut self, dir: &Path) -> Result<WatchHandle> {
        if let Some(handle) = self.dirs.get(dir) {
            return Ok(*handle);
        }

        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Subscribe {
                path: dir.to_path_buf(),
                source,
            })?;

        let handle = WatchHandle::new(self.next_id);
        self.next_id += 1;

        self.dirs.insert(dir.to_path_buf(), handle);
        self.handles.insert(handle, dir.to_path_buf());
        self.armed.insert(handle);

        Ok(handle)
    }

    async fn poll(&mut self, timeout: Duration) -> Result<Option<WatchBatch>> {
        let deadline = Instant::now() + timeout;

        loop {
            self.drain_ready()?;
            if let Some(batch) = self.take_batch() {
                return Ok(Some(batch));
            }

            match timeout_at(deadline, self.rx.recv()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(WatchError::ChannelClosed),
                Ok(Some(res)) => self.ingest(res)?,
            }
        }
    }

    fn rearm(&mut self, handle: WatchHandle) -> bool {
        let Some(dir) = self.handles.get(&handle).cloned() else {
            return false;
        };

        if !dir.is_dir() {
            self.release(&dir);
            return false;
        }

        self.armed.insert(handle);
        true
    }

    fn is_active(&self, handle: WatchHandle) -> bool {
        self.handles.contains_key(&handle)
    }
}

/// Map a notify event onto created/modified entries.
///
/// A rename into a directory counts as a creation there. Removals, accesses
/// and renames away are not reported.
fn classify(event: &Event) -> Vec<(ChangeKind, PathBuf)> {
    match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .map(|p| (ChangeKind::Created, p.clone()))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .first()
            .map(|p| vec![(ChangeKind::Created, p.clone())])
            .unwrap_or_default(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .get(1)
            .map(|p| vec![(ChangeKind::Created, p.clone())])
            .unwrap_or_default(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter(|p| p.exists())
            .map(|p| (ChangeKind::Created, p.clone()))
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .map(|p| (ChangeKind::Modified, p.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Paths an event reports as gone from their location.
fn departed(event: &Event) -> Vec<&Path> {
    match &event.kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().map(PathBuf::as_path).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.first().map(PathBuf::as_path).into_iter().collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .filter(|p| !p.exists())
            .map(PathBuf::as_path)
            .collect(),
        _ => Vec::new(),
    }
}
