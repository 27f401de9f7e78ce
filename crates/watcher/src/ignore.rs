//! Directory ignore rules for registration
//!
//! Supports multiple sources of ignore patterns:
//! 1. Built-in directory names (VCS metadata, IDE folders, build output)
//! 2. The root's .gitignore (optional, enabled by default)
//! 3. Config-based patterns (gitignore syntax, from the command line)
//!
//! Only directories are filtered. Pruning a directory keeps its whole subtree
//! out of the watch set, which matters for build output: the build writes
//! into `target/` and those writes must not feed back into the loop.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

use crate::error::Result;

/// Directory names that are never worth watching for source changes.
pub const BUILTIN_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".jj",
    ".idea",
    ".vscode",
    ".gradle",
    "node_modules",
    "target",
];

/// Ignore rule manager for a single watch root.
#[derive(Debug)]
pub struct IgnoreRules {
    /// Watch root; never ignored itself
    root: PathBuf,

    /// Combined .gitignore and config patterns
    patterns: Option<Gitignore>,

    /// Configuration
    config: IgnoreConfig,
}

impl IgnoreRules {
    /// Load ignore rules for a watch root.
    pub fn load(root: &Path, config: IgnoreConfig) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut sources = 0;

        if config.use_gitignore {
            let gitignore_path = root.join(".gitignore");
            if gitignore_path.is_file() {
                if let Some(err) = builder.add(&gitignore_path) {
                    warn!("Partially invalid {}: {}", gitignore_path.display(), err);
                }
                sources += 1;
            }
        }

        for pattern in &config.additional_patterns {
            builder.add_line(None, pattern)?;
            sources += 1;
        }

        let patterns = if sources > 0 {
            Some(builder.build()?)
        } else {
            None
        };

        Ok(Self {
            root: root.to_path_buf(),
            patterns,
            config,
        })
    }

    /// Rules that ignore nothing.
    pub fn disabled(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            patterns: None,
            config: IgnoreConfig::none(),
        }
    }

    /// Check if a directory should be left unwatched.
    pub fn is_ignored_dir(&self, path: &Path) -> bool {
        if path == self.root {
            return false;
        }

        if self.config.use_builtin && is_builtin_ignored(path) {
            debug!("Skipping built-in ignored directory {}", path.display());
            return true;
        }

        if let Some(ref patterns) = self.patterns {
            if path.starts_with(&self.root) && patterns.matched(path, true).is_ignore() {
                debug!("Skipping ignored directory {}", path.display());
                return true;
            }
        }

        false
    }

    /// Watch root these rules are anchored to.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_builtin_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| BUILTIN_IGNORED_DIRS.contains(&name))
        .unwrap_or(false)
}

/// Ignore configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreConfig {
    /// Skip the built-in directory names (default: true)
    pub use_builtin: bool,

    /// Honour the root's .gitignore (default: true)
    pub use_gitignore: bool,

    /// Additional gitignore-style patterns
    pub additional_patterns: Vec<String>,
}

impl IgnoreConfig {
    /// Configuration that ignores nothing.
    pub fn none() -> Self {
        Self {
            use_builtin: false,
            use_gitignore: false,
            additional_patterns: vec![],
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_builtin: true,
            use_gitignore: true,
            additional_patterns: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_dirs_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let rules = IgnoreRules::load(root, IgnoreConfig::default()).unwrap();

        assert!(rules.is_ignored_dir(&root.join(".git")));
        assert!(rules.is_ignored_dir(&root.join("target")));
        assert!(rules.is_ignored_dir(&root.join("web/node_modules")));
        assert!(!rules.is_ignored_dir(&root.join("src")));
        assert!(!rules.is_ignored_dir(&root.join("src/main/java")));
    }

    #[test]
    fn test_root_is_never_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("target");
        fs::create_dir_all(&root).unwrap();

        let rules = IgnoreRules::load(&root, IgnoreConfig::default()).unwrap();
        assert!(!rules.is_ignored_dir(&root));
    }

    #[test]
    fn test_gitignore_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "generated/\n*.log\n").unwrap();

        let rules = IgnoreRules::load(root, IgnoreConfig::default()).unwrap();
        assert!(rules.is_ignored_dir(&root.join("generated")));
        assert!(!rules.is_ignored_dir(&root.join("src")));
    }

    #[test]
    fn test_gitignore_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();

        let config = IgnoreConfig {
            use_gitignore: false,
            ..IgnoreConfig::default()
        };
        let rules = IgnoreRules::load(root, config).unwrap();

        assert!(!rules.is_ignored_dir(&root.join("generated")));
        // Built-in names still apply
        assert!(rules.is_ignored_dir(&root.join(".git")));
    }

    #[test]
    fn test_additional_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = IgnoreConfig {
            use_builtin: true,
            use_gitignore: false,
            additional_patterns: vec!["out/".to_string()],
        };

        let rules = IgnoreRules::load(root, config).unwrap();
        assert!(rules.is_ignored_dir(&root.join("out")));
        assert!(!rules.is_ignored_dir(&root.join("src")));
    }

    #[test]
    fn test_disabled_rules_ignore_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let rules = IgnoreRules::disabled(root);

        assert!(!rules.is_ignored_dir(&root.join(".git")));
        assert!(!rules.is_ignored_dir(&root.join("target")));
        assert_eq!(rules.root(), root);
    }
}
