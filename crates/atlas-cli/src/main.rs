//! Podcast Atlas command-line tool.
//!
//! # Usage
//!
//! ```bash
//! atlas generate [all|clusters|speakers|projection|timelines] [--variant NAME] [--seed N]
//! atlas resolve <FILE> [--variant NAME | --podcast ID]
//! atlas manifest [--origin URL]
//! atlas fetch <FILE>... [--variant NAME] [--origin URL]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/podcast-atlas/config.toml)
//! 3. Environment variables (ATLAS_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use atlas_cli::{
    handle_fetch, handle_generate, handle_manifest, handle_resolve, init_logging, load_settings,
    Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.data_dir.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Generate {
            target,
            variant,
            seed,
        } => {
            tokio::task::spawn_blocking(move || handle_generate(settings, target, variant, seed))
                .await??;
        }
        Commands::Resolve {
            file,
            variant,
            podcast,
        } => {
            handle_resolve(&settings, &file, variant.as_deref(), podcast.as_deref())?;
        }
        Commands::Manifest { origin } => {
            handle_manifest(&settings, origin).await?;
        }
        Commands::Fetch {
            files,
            variant,
            origin,
        } => {
            handle_fetch(&settings, &files, variant.as_deref(), origin).await?;
        }
    }

    Ok(())
}
