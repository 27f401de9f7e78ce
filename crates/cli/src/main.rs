//! Hotreload CLI - rebuild on source changes

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, Level};
use watcher::{BuildCommand, IgnoreConfig, WatchConfig};

mod watch;

/// Hotreload - run a full rebuild whenever a source file changes
#[derive(Parser, Debug)]
#[command(name = "hotreload")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory tree to watch
    path: PathBuf,

    /// Source file extension that triggers a rebuild (repeatable)
    #[arg(short = 'e', long = "ext", value_name = "EXT", default_value = "java")]
    extensions: Vec<String>,

    /// Minimum time between builds triggered by the same file
    #[arg(long, value_name = "MS", default_value_t = 500)]
    debounce_ms: u64,

    /// How long to wait for events before polling again
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_timeout_secs: u64,

    /// Watch every directory under PATH, ignored ones included
    ///
    /// By default .git, target, node_modules and similar build or VCS
    /// directories are skipped, as is anything the root .gitignore matches.
    /// Explicit --ignore patterns still apply.
    #[arg(long)]
    no_ignore: bool,

    /// Extra gitignore-style pattern for directories to skip (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    ignore_patterns: Vec<String>,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,

    /// Build command to run instead of `mvn compile -T 1C`
    #[arg(last = true, value_name = "BUILD_COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn into_config(self) -> WatchConfig {
        let ignore = if self.no_ignore {
            IgnoreConfig {
                additional_patterns: self.ignore_patterns,
                ..IgnoreConfig::none()
            }
        } else {
            IgnoreConfig {
                additional_patterns: self.ignore_patterns,
                ..IgnoreConfig::default()
            }
        };

        let mut config = WatchConfig::new(self.path)
            .with_extensions(self.extensions)
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_poll_timeout(Duration::from_secs(self.poll_timeout_secs))
            .with_ignore(ignore);

        if let Some(build) = BuildCommand::from_argv(self.command) {
            config = config.with_build_command(build);
        }

        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; the build owns stdout
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = watch::run(cli.into_config()).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
