//! Command-line argument parsing for the map generator.

use std::path::PathBuf;

use clap::Parser;

use crate::config::MapgenConfig;

/// Map generator command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "dnd-rs-mapgen", about = "Generate or load a cached overworld")]
pub struct CliArgs {
    /// Config file (TOML, or a bare world config as JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// World width in tiles.
    #[arg(long, allow_negative_numbers = true)]
    pub width: Option<i32>,

    /// World height in tiles.
    #[arg(long, allow_negative_numbers = true)]
    pub height: Option<i32>,

    /// World seed.
    #[arg(long, allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Directory of the world cache database.
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Skip the cache entirely.
    #[arg(long)]
    pub no_cache: bool,

    /// Drop any cached world for this key before generating.
    #[arg(long)]
    pub regenerate: bool,

    /// Write the world as JSON to this file.
    #[arg(long)]
    pub dump_json: Option<PathBuf>,

    /// Print an ASCII rendering of the map.
    #[arg(long)]
    pub dump_ascii: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl MapgenConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.world.width = w;
        }
        if let Some(h) = args.height {
            self.world.height = h;
        }
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(ref dir) = args.cache_dir {
            self.cache.directory = dir.clone();
        }
        if args.no_cache {
            self.cache.enabled = false;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }
}
