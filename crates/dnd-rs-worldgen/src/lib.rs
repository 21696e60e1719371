//! Overworld generation: terrain, biomes, rivers, POIs, roads, and a
//! persistent world cache.

pub mod biome;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod heightmap;
pub mod noise;
pub mod poi;
pub mod rivers;
pub mod roads;
pub mod world;

pub use biome::{Biome, BiomeThresholds};
pub use cache::{CacheKey, LevelDbCache, MemoryCache, NoCache, WorldCache};
pub use config::{ValidatedConfig, WorldConfig};
pub use error::{CacheError, CodecError, ConfigError, WorldGenError};
pub use generator::{generate_world, GeneratedWorld, GenerationReport, WorldGenerator, WorldSource};
pub use grid::Grid;
pub use poi::PoiKind;
pub use world::{Location, Locations, Tile, World};
