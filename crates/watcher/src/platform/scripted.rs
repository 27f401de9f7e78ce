//! Deterministic backend for unit tests.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::WatchBackend;
use crate::error::{Result, WatchError};
use crate::event::{RawEvent, WatchBatch, WatchHandle};

/// Backend that replays queued batches and records every call.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    next_id: u64,
    /// Every successful subscription, in order
    pub subscribed: Vec<(WatchHandle, PathBuf)>,
    /// Handles passed to `rearm`, in order
    pub rearmed: Vec<WatchHandle>,
    /// Directories whose subscription is refused
    pub refuse: HashSet<PathBuf>,
    /// Handles whose directory went away
    revoked: HashSet<WatchHandle>,
    /// Batches to deliver, addressed by directory
    queue: VecDeque<(PathBuf, Vec<RawEvent>)>,
    /// Fail the poll once the queue is exhausted instead of timing out
    pub fail_when_drained: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Queue a batch for the handle currently watching `dir`.
    pub fn push(&mut self, dir: &Path, events: Vec<RawEvent>) {
        self.queue.push_back((dir.to_path_buf(), events));
    }

    /// Latest handle subscribed for `dir`.
    pub fn handle_of(&self, dir: &Path) -> Option<WatchHandle> {
        self.subscribed
            .iter()
            .rev()
            .find(|(_, path)| path == dir)
            .map(|(handle, _)| *handle)
    }

    /// Behave as if `dir` had been removed: its current handle goes dead.
    pub fn revoke(&mut self, dir: &Path) {
        if let Some(handle) = self.handle_of(dir) {
            self.revoked.insert(handle);
        }
    }
}

#[async_trait]
impl WatchBackend for ScriptedBackend {
    fn subscribe(&mut self, dir: &Path) -> Result<WatchHandle> {
        if self.refuse.contains(dir) {
            return Err(WatchError::Subscribe {
                path: dir.to_path_buf(),
                source: notify::Error::generic("subscription refused"),
            });
        }

        let handle = WatchHandle::new(self.next_id);
        self.next_id += 1;
        self.subscribed.push((handle, dir.to_path_buf()));
        Ok(handle)
    }

    async fn poll(&mut self, _timeout: Duration) -> Result<Option<WatchBatch>> {
        match self.queue.pop_front() {
            Some((dir, events)) => {
                let handle = self
                    .handle_of(&dir)
                    .unwrap_or_else(|| WatchHandle::new(u64::MAX));
                Ok(Some(WatchBatch { handle, events }))
            }
            None if self.fail_when_drained => Err(WatchError::ChannelClosed),
            None => Ok(None),
        }
    }

    fn rearm(&mut self, handle: WatchHandle) -> bool {
        self.rearmed.push(handle);
        self.is_active(handle)
            && self
                .subscribed
                .iter()
                .find(|(h, _)| *h == handle)
                .map(|(_, path)| path.is_dir())
                .unwrap_or(false)
    }

    fn is_active(&self, handle: WatchHandle) -> bool {
        !self.revoked.contains(&handle) && self.subscribed.iter().any(|(h, _)| *h == handle)
    }
}
