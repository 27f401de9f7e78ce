//! File system watching for hot reload
//!
//! This crate provides the watch/debounce/dispatch loop:
//! - Recursive directory registration, including directories created later
//! - Per-path debouncing (500ms by default)
//! - Event classification (modified source files vs. new directories)
//! - Serialized invocation of an external full-rebuild command

pub mod build;
pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod event_loop;
pub mod ignore;
pub mod platform;
pub mod registrar;

pub use build::{BuildCommand, BuildOutcome, BuildTrigger, Compiler};
pub use config::WatchConfig;
pub use debounce::DebounceTracker;
pub use error::{Result, WatchError};
pub use event::{ChangeEvent, ChangeKind, RawEvent, WatchBatch, WatchHandle};
pub use event_loop::{HotReloadLoop, StepOutcome};
pub use self::ignore::{IgnoreConfig, IgnoreRules};
pub use platform::{NotifyBackend, WatchBackend};
pub use registrar::{discover, TreeRegistrar, WatchRegistration, WatchRegistry};
