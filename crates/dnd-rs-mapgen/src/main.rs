mod cli;
mod config;

use std::path::Path;

use clap::Parser;
use dnd_rs_worldgen::{LevelDbCache, NoCache, PoiKind, WorldCache, WorldGenerator};
use tracing::{error, info, warn};

use cli::CliArgs;
use config::{MapgenConfig, DEFAULT_CONFIG_PATH};

fn load_config(args: &CliArgs) -> MapgenConfig {
    let (path, explicit) = match args.config {
        Some(ref p) => (p.as_path(), true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };
    if !explicit && !path.exists() {
        return MapgenConfig::default();
    }
    match MapgenConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn open_cache(config: &MapgenConfig) -> Box<dyn WorldCache> {
    if !config.cache.enabled {
        info!("World cache disabled");
        return Box::new(NoCache);
    }
    let dir = Path::new(&config.cache.directory);
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("Cannot create cache directory {}: {e}; continuing without cache", dir.display());
        return Box::new(NoCache);
    }
    match LevelDbCache::open(dir) {
        Ok(cache) => {
            info!("World cache at {}", dir.display());
            Box::new(cache)
        }
        Err(e) => {
            warn!("Cannot open world cache at {}: {e}; continuing without cache", dir.display());
            Box::new(NoCache)
        }
    }
}

fn main() {
    let args = CliArgs::parse();
    let mut config = load_config(&args);
    config.apply_cli_overrides(&args);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("DnD-RS mapgen v{}", env!("CARGO_PKG_VERSION"));

    let generator = match WorldGenerator::new(&config.world) {
        Ok(g) => g,
        Err(e) => {
            error!("Cannot generate world: {e}");
            std::process::exit(1);
        }
    };

    let mut cache = open_cache(&config);
    let key = generator.cache_key();
    if args.regenerate {
        match cache.remove(&key) {
            Ok(()) => info!("Dropped cached world {key:?}"),
            Err(e) => warn!("Failed to drop cached world {key:?}: {e}"),
        }
    }

    let generated = generator.generate_cached(cache.as_mut());
    let world = &generated.world;
    let report = &generated.report;

    info!(
        "World: seed {}, {}x{} ({:?})",
        world.seed, world.width, world.height, report.source
    );
    info!(
        "Locations: {} castles, {} towns, {} dungeons",
        world.locations.count_of(PoiKind::Castle),
        world.locations.count_of(PoiKind::Town),
        world.locations.count_of(PoiKind::Dungeon)
    );
    if let Some(requested) = report.pois_requested {
        if report.pois_placed < requested {
            info!("Placed {}/{requested} requested POIs", report.pois_placed);
        }
    }
    let (sx, sy) = world.starting_position();
    info!("Start: {} at ({sx}, {sy})", world.tile(sx as i64, sy as i64).label());

    if args.dump_ascii {
        println!("{}", world.render_ascii());
    }

    if let Some(ref path) = args.dump_json {
        let written = world
            .to_json_pretty()
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => info!("Wrote {}", path.display()),
            Err(e) => {
                error!("Failed to write {}: {e}", path.display());
                std::process::exit(1);
            }
        }
    }
}
