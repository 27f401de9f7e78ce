//! Run the hot reload loop until it fails or the user interrupts it

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::info;
use watcher::{BuildTrigger, HotReloadLoop, NotifyBackend, WatchConfig};

pub async fn run(config: WatchConfig) -> Result<()> {
    // 1. Startup: any failure here is fatal before the loop starts
    let backend = NotifyBackend::new()
        .context("Failed to start the file notification service")?;
    let trigger = BuildTrigger::new(config.build.clone());

    let mut hot = HotReloadLoop::new(&config, backend, trigger)
        .with_context(|| format!("Cannot watch {}", config.root.display()))?;

    let registrations = hot
        .start()
        .with_context(|| format!("Failed to register {}", config.root.display()))?;

    // 2. Banner
    eprintln!(
        "{} {} ({} directories)",
        "Watching".green().bold(),
        hot.root().display().to_string().cyan(),
        registrations.len()
    );
    eprintln!(
        "  {} .{}  {} {}",
        "sources:".dimmed(),
        config.extensions.join(", ."),
        "build:".dimmed(),
        config.build.to_string().yellow()
    );

    // 3. Loop until the backend dies or Ctrl+C
    tokio::select! {
        res = hot.run() => res.context("File watching stopped"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}
