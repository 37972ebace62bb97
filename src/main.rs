//! classkit - check and inspect class manifests

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use classkit::manifest::{Manifest, Natives};
use classkit::{Registry, Settings};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Declare the classes of one or more manifests and report the result
#[derive(Parser, Debug)]
#[command(name = "classkit", version, about = "Check class composition manifests")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip validation, conflict checks and sealing
    #[arg(long)]
    lenient: bool,

    /// Print class summaries as JSON
    #[arg(long)]
    json: bool,

    /// Manifest files, applied in order to one registry
    #[arg(required = true)]
    manifests: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    if args.lenient {
        settings.strict = false;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let natives = Natives::permissive();
    let mut registry = Registry::with_settings(settings);

    for path in &args.manifests {
        let manifest = Manifest::load(path)?;
        let declared = registry
            .apply_manifest(&manifest, &natives)
            .with_context(|| format!("in manifest {}", path.display()))?;
        info!(manifest = %path.display(), classes = declared.len(), "applied manifest");
    }

    let summaries: Vec<_> = registry.classes().iter().map(|c| c.summary()).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        let sealed = if summary.sealed { " (sealed)" } else { "" };
        println!("{}{}", summary.name, sealed);
        if !summary.includes.is_empty() {
            println!("  includes: {}", summary.includes.join(", "));
        }
        for member in &summary.members {
            println!(
                "  {} {} [{:?}] from {}",
                member.kind, member.key, member.visibility, member.origin
            );
        }
        if !summary.events.is_empty() {
            println!("  events: {}", summary.events.join(", "));
        }
        for o in &summary.overrides {
            println!("  override: {} ({} -> {})", o.key, o.replaced, o.by);
        }
    }

    Ok(())
}
