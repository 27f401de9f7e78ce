//! Filesystem notification backends
//!
//! The event loop only needs three operations from the OS facility:
//! subscribe a single directory, wait a bounded time for a batch of events,
//! and re-arm a handle once its batch has been processed. A handle delivers
//! at most one batch until it is re-armed; events that arrive in between
//! stay queued in the backend.

mod native;
#[cfg(test)]
pub(crate) mod scripted;

pub use native::NotifyBackend;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::{WatchBatch, WatchHandle};

/// OS notification facility as seen by the event loop.
#[async_trait]
pub trait WatchBackend: Send {
    /// Subscribe `dir` (non-recursively) to created/modified notifications.
    fn subscribe(&mut self, dir: &Path) -> Result<WatchHandle>;

    /// Wait up to `timeout` for the next batch from an armed handle.
    ///
    /// `Ok(None)` means the wait timed out. Errors are unrecoverable.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<WatchBatch>>;

    /// Re-enable delivery for `handle`.
    ///
    /// Returns false if the handle is no longer valid (its directory is
    /// gone); the caller should forget it.
    fn rearm(&mut self, handle: WatchHandle) -> bool;

    /// False once the handle's directory was removed or moved away.
    ///
    /// A later `subscribe` of the same path hands out a fresh handle.
    fn is_active(&self, handle: WatchHandle) -> bool;
}
