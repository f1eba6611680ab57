//! # Butterfly-mirror CLI
//!
//! Command-line interface for the butterfly-mirror library.
//! Behaviour is driven by an env file and the process environment; flags only
//! choose where configuration comes from and how much is printed.

use std::collections::HashMap;
use std::path::PathBuf;

use butterfly_mirror::{
    needs_download, ApplyMode, DownloadJob, DownloadOptions, EnvFile, Error, Result, Settings,
};
use clap::Parser;
use log::{debug, error, info, warn};

mod cli;

/// Command-line interface for butterfly-mirror
#[derive(Parser)]
#[command(name = "butterfly-mirror")]
#[command(about = "Mirror, merge and upload regional OpenStreetMap extracts")]
#[command(long_about = "Keeps regional OpenStreetMap extracts fresh, merges them and uploads the result:
  butterfly-mirror                          # Use ./.osm.env (or ./.env)
  butterfly-mirror --env-file prod.env      # Use another env file
  butterfly-mirror --dry-run                # Show what would be downloaded

Recognized settings:
  DATA_DIR, OSM_LOCATIONS, OSM_SOURCE, S3_ENABLED, S3_ACCOUNT_ID,
  S3_ENDPOINT_URL, S3_BUCKET_NAME, S3_ACCESS_KEY_ID, S3_ACCESS_KEY_SECRET,
  S3_REGION, OSMIUM_BIN")]
#[command(version)]
struct Cli {
    /// Env file to load settings from
    #[arg(long, default_value = ".osm.env")]
    env_file: PathBuf,

    /// Env file used when --env-file does not exist
    #[arg(long, default_value = ".env")]
    fallback_env_file: PathBuf,

    /// Let env file values replace variables already set in the environment
    #[arg(long)]
    override_env: bool,

    /// Show the planned downloads without touching the network
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let settings = load_settings(&cli)?;
    info!(
        "Locations: {}",
        settings
            .locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );

    if cli.dry_run {
        return dry_run(&settings);
    }

    let progress = cli::ProgressManager::new();
    let options = DownloadOptions {
        progress: Some(progress.callback()),
        ..Default::default()
    };

    let outcome = butterfly_mirror::default_pipeline(settings)
        .with_download_options(options)
        .run()
        .await;
    progress.finish();

    let outcome = outcome?;
    debug!("Run finished: {outcome:?}");
    Ok(())
}

/// Combine the process environment with the env file
fn load_settings(cli: &Cli) -> Result<Settings> {
    let env_file = EnvFile::load(&cli.env_file, &cli.fallback_env_file)?;
    if env_file.is_empty() {
        warn!("⚠️  {} defines no settings", env_file.path().display());
    }
    debug!(
        "Loaded {} settings from {}",
        env_file.len(),
        env_file.path().display()
    );

    let mut vars: HashMap<String, String> = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();

    let mode = if cli.override_env {
        ApplyMode::Override
    } else {
        ApplyMode::SetDefault
    };
    env_file.apply(&mut vars, mode);

    Settings::from_vars(&vars)
}

/// Print the jobs a real run would perform
fn dry_run(settings: &Settings) -> Result<()> {
    let source = settings.source_url.as_deref().ok_or(Error::MissingSource)?;
    let download_dir = settings.download_dir();

    for location in &settings.locations {
        let job = DownloadJob::new(location, source, &download_dir);
        let action = if needs_download(&job.path) {
            "download"
        } else {
            "keep (fresh)"
        };
        eprintln!(
            "🔍 [DRY RUN] {}: {action} {} -> {}",
            job.location,
            job.url,
            job.path.display()
        );
    }

    eprintln!(
        "🔍 [DRY RUN] Merge into {}",
        settings.output_path().display()
    );

    if settings.s3_enabled {
        eprintln!(
            "🔍 [DRY RUN] Upload to {} bucket '{}'",
            settings.storage.endpoint_url, settings.storage.bucket_name
        );
    } else {
        eprintln!("🔍 [DRY RUN] Upload disabled");
    }

    Ok(())
}
