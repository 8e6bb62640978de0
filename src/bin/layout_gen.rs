//! Layout generator CLI
//! Loads a TOML scenario, generates a layout and prints an ASCII preview

use std::path::PathBuf;

use citadel_layout::core::error::{LayoutError, Result};
use citadel_layout::shapes::LibraryCache;
use citadel_layout::{render_ascii, Scenario};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Layout generator - place rooms and connectors for a level graph
#[derive(Parser, Debug)]
#[command(name = "layout_gen")]
#[command(about = "Generate a room layout from a TOML scenario")]
struct Args {
    /// Scenario file (templates, catalog, graph, settings)
    #[arg(long)]
    scenario: PathBuf,

    /// Random seed; overrides the scenario's seed
    #[arg(long)]
    seed: Option<u64>,

    /// Attempts with consecutive seeds before giving up
    #[arg(long, default_value_t = 1)]
    attempts: u32,

    /// Write the placement map as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Skip the ASCII preview
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("citadel_layout=info")),
        )
        .init();

    let args = Args::parse();
    let scenario = Scenario::from_path(&args.scenario)?;
    let base_seed = args.seed.unwrap_or(scenario.seed);
    let mut cache = LibraryCache::new();

    let mut last_error = None;
    for attempt in 0..args.attempts.max(1) {
        let seed = base_seed.wrapping_add(attempt as u64);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        match scenario.generate(&mut cache, &mut rng) {
            Ok(result) => {
                tracing::info!("Seed {} succeeded on attempt {}", seed, attempt + 1);
                if !args.quiet {
                    println!("{}", render_ascii(&result));
                    for (id, module) in &result.rooms {
                        println!("room {:>3}: {:<16} at ({}, {})", id, module.name, module.root.x, module.root.y);
                    }
                    for (edge, module) in &result.connectors {
                        println!("edge {:>3}: {:<16} at ({}, {})", edge, module.name, module.root.x, module.root.y);
                    }
                }
                if let Some(path) = &args.json {
                    std::fs::write(path, result.to_json()?)?;
                    tracing::info!("Wrote {}", path.display());
                }
                return Ok(());
            }
            // Only an exhausted search is worth another seed
            Err(err @ LayoutError::SearchExhausted { .. }) => {
                tracing::warn!("Seed {} failed: {}", seed, err);
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_error.unwrap_or_else(|| LayoutError::SearchExhausted {
        detail: "no attempts were made".to_string(),
    }))
}
