//! Configuration for a hot reload session.

use std::path::PathBuf;
use std::time::Duration;

use crate::build::BuildCommand;
use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::ignore::IgnoreConfig;

/// Default source extension.
pub const DEFAULT_EXTENSION: &str = "java";

/// Default bound on a single poll wait, in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;

/// Everything the event loop needs to know about what to watch and what to run.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Root of the watched tree
    pub root: PathBuf,

    /// Source extensions without the leading dot
    pub extensions: Vec<String>,

    /// Minimum spacing between builds triggered by the same file
    pub debounce: Duration,

    /// Bound on a single poll wait
    pub poll_timeout: Duration,

    /// Full rebuild command
    pub build: BuildCommand,

    /// Directories excluded from registration
    pub ignore: IgnoreConfig,
}

impl WatchConfig {
    /// Create a config with defaults for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            build: BuildCommand::default(),
            ignore: IgnoreConfig::default(),
        }
    }

    /// Replace the watched extensions. Leading dots are stripped.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_build_command(mut self, build: BuildCommand) -> Self {
        self.build = build;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreConfig) -> Self {
        self.ignore = ignore;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::new("/proj");

        assert_eq!(config.root, Path::new("/proj"));
        assert_eq!(config.extensions, vec!["java"]);
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.poll_timeout, Duration::from_secs(10));
        assert_eq!(config.build.to_string(), "mvn compile -T 1C");
        assert!(config.ignore.use_builtin);
    }

    #[test]
    fn test_extensions_are_normalized() {
        let config = WatchConfig::new("/proj").with_extensions([".kt", "java", ""]);
        assert_eq!(config.extensions, vec!["kt", "java"]);
    }

    #[test]
    fn test_builder_setters() {
        let config = WatchConfig::new("/proj")
            .with_debounce(Duration::from_millis(50))
            .with_poll_timeout(Duration::from_secs(1))
            .with_build_command(BuildCommand::new("make"))
            .with_ignore(IgnoreConfig::none());

        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.poll_timeout, Duration::from_secs(1));
        assert_eq!(config.build.program, "make");
        assert!(!config.ignore.use_builtin);
    }
}
