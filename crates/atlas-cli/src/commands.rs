//! Command implementations.

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use atlas_client::{AtlasClient, ResolverConfig, VariantResolver};
use atlas_pipeline::Generator;
use atlas_types::Settings;

use crate::cli::Target;

/// Load settings and apply global CLI overrides.
pub fn load_settings(
    config_path: Option<&str>,
    log_level: Option<&str>,
    data_dir: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    if let Some(dir) = data_dir {
        settings.data_dir = dir.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level. Logs go to stderr so command output stays parseable.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Run a generation pass.
pub fn handle_generate(
    mut settings: Settings,
    target: Target,
    variant: Option<String>,
    seed: Option<u64>,
) -> Result<()> {
    if let Some(variant) = variant {
        settings.variant = variant;
    }
    info!(
        podcast = %settings.podcast_id,
        variant = %settings.variant,
        data_dir = %settings.data_dir,
        "Starting generation run"
    );

    let report = Generator::new(settings)
        .with_seed(seed)
        .run(&target.steps())
        .context("Generation run failed")?;

    for step in &report.steps {
        println!(
            "{:<22} {:>6} items  {:>8.2?}",
            step.step.as_str(),
            step.items,
            step.elapsed
        );
    }
    for file in &report.files {
        match &file.public {
            Some(public) => println!(
                "wrote {} ({} bytes, copy at {})",
                file.canonical.display(),
                file.bytes,
                public.display()
            ),
            None => println!("wrote {} ({} bytes)", file.canonical.display(), file.bytes),
        }
    }
    println!(
        "variant {} done in {:.2?}",
        report.variant, report.elapsed
    );
    Ok(())
}

/// Fetch path for `file`, variant-scoped or podcast-scoped.
pub fn resolve_command(
    settings: &Settings,
    file: &str,
    variant: Option<&str>,
    podcast: Option<&str>,
) -> String {
    let resolver = VariantResolver::new(ResolverConfig::from(&settings.client));
    match podcast {
        Some(podcast_id) => resolver.podcast_path(podcast_id, file),
        None => resolver.resolve_path(file, variant),
    }
}

pub fn handle_resolve(
    settings: &Settings,
    file: &str,
    variant: Option<&str>,
    podcast: Option<&str>,
) -> Result<()> {
    println!("{}", resolve_command(settings, file, variant, podcast));
    Ok(())
}

fn client_for(settings: &Settings, origin: Option<String>) -> Result<AtlasClient> {
    let mut client_settings = settings.client.clone();
    if origin.is_some() {
        client_settings.origin = origin;
    }
    AtlasClient::from_settings(&client_settings).context("Failed to create client")
}

/// Print the manifest, or the fallback when it cannot be loaded.
pub async fn handle_manifest(settings: &Settings, origin: Option<String>) -> Result<()> {
    let client = client_for(settings, origin)?;
    let manifest = client.manifest().await;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

/// Fetch artifacts concurrently and print each one. Fails if any fetch did.
pub async fn handle_fetch(
    settings: &Settings,
    files: &[String],
    variant: Option<&str>,
    origin: Option<String>,
) -> Result<()> {
    let client = client_for(settings, origin)?;
    let names: Vec<&str> = files.iter().map(String::as_str).collect();

    let mut failed = 0usize;
    for (name, result) in client.load_all(&names, variant).await {
        match result {
            Ok(document) => {
                if names.len() > 1 {
                    println!("== {name} ==");
                }
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            Err(e) => {
                error!(file = %name, error = %e, "Fetch failed");
                eprintln!("{name}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} fetches failed", names.len());
    }
    Ok(())
}
