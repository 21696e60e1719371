//! World assembly: runs the generation pipeline and fronts it with a cache.
//!
//! [`generate_world`] is the entry point the rest of the game uses. It looks
//! the `(seed, width, height)` key up in a [`WorldCache`], and on a miss (or
//! an unreadable entry) runs heightmap, biomes, rivers, POIs, and roads in
//! that order, names the POIs, and stores the result.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::biome::classify_heightmap;
use crate::cache::{CacheKey, WorldCache};
use crate::config::{ValidatedConfig, WorldConfig};
use crate::error::WorldGenError;
use crate::heightmap::generate_heightmap;
use crate::poi::{place_pois, Poi, PoiKind};
use crate::rivers::{carve_rivers, RiverStats};
use crate::roads::{connect_pois, RoadStats};
use crate::world::{Location, Locations, World};

/// Where a returned world came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldSource {
    Fresh,
    Cache,
}

/// Diagnostics for one generation request.
///
/// A degraded world is still a valid world; this only records how far the
/// result fell short of what the config asked for. Cached worlds do not
/// store their diagnostics, so a cache hit reports `pois_requested: None`
/// and empty river and road stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub source: WorldSource,
    /// `None` when the world came from the cache.
    pub pois_requested: Option<usize>,
    pub pois_placed: usize,
    pub rivers: RiverStats,
    pub roads: RoadStats,
}

impl GenerationReport {
    fn cached(world: &World) -> Self {
        Self {
            source: WorldSource::Cache,
            pois_requested: None,
            pois_placed: world.locations.len(),
            rivers: RiverStats::default(),
            roads: RoadStats::default(),
        }
    }

    /// Requested POIs that were not placed; `None` when unknown.
    pub fn poi_shortfall(&self) -> Option<usize> {
        self.pois_requested
            .map(|requested| requested.saturating_sub(self.pois_placed))
    }

    /// Whether any stage produced less than requested.
    pub fn is_degraded(&self) -> bool {
        self.poi_shortfall().is_some_and(|n| n > 0)
            || self.rivers.unterminated > 0
            || self.rivers.traced < self.rivers.requested
            || self.roads.reached < self.roads.requested
    }
}

/// A world together with its generation report.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedWorld {
    pub world: World,
    pub report: GenerationReport,
}

/// Runs the pipeline for one validated config.
pub struct WorldGenerator {
    config: ValidatedConfig,
}

impl WorldGenerator {
    /// Validate the config. Fails only on unusable dimensions.
    pub fn new(config: &WorldConfig) -> Result<Self, WorldGenError> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    pub fn from_validated(config: ValidatedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.config.seed, self.config.width, self.config.height)
    }

    /// Generate a world from scratch, bypassing any cache.
    pub fn generate(&self) -> GeneratedWorld {
        let cfg = &self.config;
        let started = Instant::now();

        // Phase 1: Heightmap
        let heightmap = generate_heightmap(cfg.width, cfg.height, cfg.seed, &cfg.noise);

        // Phase 2: Biomes
        let mut biomes = classify_heightmap(&heightmap, &cfg.thresholds);

        // Phase 3: Rivers (turns river tiles into water)
        let (rivers, river_stats) = carve_rivers(&heightmap, &mut biomes, cfg.rivers);
        debug!(
            "Carved {}/{} rivers ({} unterminated)",
            river_stats.traced, river_stats.requested, river_stats.unterminated
        );

        // Phase 4: POIs
        let mut rng = StdRng::seed_from_u64(cfg.seed as u64);
        let placement = place_pois(&biomes, &cfg.poi, cfg.min_spacing, &mut rng);

        // Phase 5: Roads
        let (roads, road_stats) = connect_pois(&biomes, &placement.pois, &cfg.pass_costs);
        debug!(
            "Laid {}/{} roads ({} blocked, {} exhausted)",
            road_stats.reached, road_stats.requested, road_stats.blocked, road_stats.exhausted
        );

        // Phase 6: Names
        let locations = name_locations(&placement.pois);

        let report = GenerationReport {
            source: WorldSource::Fresh,
            pois_requested: Some(placement.requested),
            pois_placed: placement.pois.len(),
            rivers: river_stats,
            roads: road_stats,
        };
        if river_stats.unterminated > 0 || road_stats.exhausted > 0 || road_stats.blocked > 0 {
            warn!(
                "World {} ({}x{}) degraded: {} river(s) hit the step budget, {} road(s) abandoned",
                cfg.seed,
                cfg.width,
                cfg.height,
                river_stats.unterminated,
                road_stats.blocked + road_stats.exhausted
            );
        }
        debug!(
            "Generated world {} ({}x{}) in {:.1?}",
            cfg.seed,
            cfg.width,
            cfg.height,
            started.elapsed()
        );

        GeneratedWorld {
            world: World {
                width: cfg.width,
                height: cfg.height,
                seed: cfg.seed,
                heightmap,
                biomes,
                rivers,
                roads,
                locations,
            },
            report,
        }
    }

    /// Return the cached world for this key, or generate and store one.
    ///
    /// Cache failures are logged and never returned: an unreadable entry is
    /// treated as a miss and a failed write still returns the fresh world.
    pub fn generate_cached(&self, cache: &mut dyn WorldCache) -> GeneratedWorld {
        let key = self.cache_key();

        match cache.get(&key) {
            Ok(Some(world))
                if world.seed == key.seed && world.width == key.width && world.height == key.height =>
            {
                info!("Loaded world {} ({}x{}) from cache", key.seed, key.width, key.height);
                let report = GenerationReport::cached(&world);
                return GeneratedWorld { world, report };
            }
            Ok(Some(world)) => warn!(
                "Cache entry for {key:?} holds world {} ({}x{}), regenerating",
                world.seed, world.width, world.height
            ),
            Ok(None) => info!("No cached world for {key:?}, generating"),
            Err(e) => warn!("Cached world for {key:?} is unreadable, regenerating: {e}"),
        }

        let generated = self.generate();
        if let Err(e) = cache.put(&key, &generated.world) {
            warn!("Failed to cache world {key:?}: {e}");
        }
        generated
    }
}

/// Name POIs by type in placement order ("Castle 1", "Town 1", ...).
fn name_locations(pois: &[Poi]) -> Locations {
    let mut counters = [0usize; 3];
    let mut locations = Locations::new();
    for poi in pois {
        let slot = match poi.kind {
            PoiKind::Town => 0,
            PoiKind::Castle => 1,
            PoiKind::Dungeon => 2,
        };
        counters[slot] += 1;
        locations.insert(Location {
            x: poi.x,
            y: poi.y,
            kind: poi.kind,
            name: format!("{} {}", poi.kind.label(), counters[slot]),
        });
    }
    locations
}

/// Generate (or load) the world described by `config`.
///
/// Errors only when the config describes no usable world.
pub fn generate_world(config: &WorldConfig, cache: &mut dyn WorldCache) -> Result<World, WorldGenError> {
    Ok(WorldGenerator::new(config)?.generate_cached(cache).world)
}
