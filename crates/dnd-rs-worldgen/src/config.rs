//! World generation configuration.
//!
//! [`WorldConfig`] is what gets deserialized from a config file: every field
//! has a default and nothing is required. [`WorldConfig::validate`] turns it
//! into a [`ValidatedConfig`], repairing soft problems (bad scale, inverted
//! thresholds, negative counts) and rejecting only unusable dimensions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::biome::BiomeThresholds;
use crate::error::{ConfigError, WorldGenError};
use crate::poi::PoiCounts;
use crate::roads::PassCosts;

/// Smallest noise scale accepted; anything lower is clamped up to it.
pub const MIN_SCALE: f64 = 1e-6;
const MIN_PERSISTENCE: f64 = 0.01;
const MIN_LACUNARITY: f64 = 1.01;
/// Highest lacunarity accepted.
pub const MAX_LACUNARITY: f64 = 16.0;
/// Most fBm layers accepted.
pub const MAX_OCTAVES: u32 = 16;

/// Noise section as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub scale: f64,
    pub octaves: i32,
    pub persistence: f64,
    pub lacunarity: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 32.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl NoiseConfig {
    /// Clamp every parameter into its usable range.
    pub fn sanitized(&self) -> NoiseParams {
        let scale = if self.scale.is_finite() && self.scale > MIN_SCALE {
            self.scale
        } else {
            MIN_SCALE
        };
        let persistence = if self.persistence.is_nan() {
            0.5
        } else {
            self.persistence.clamp(MIN_PERSISTENCE, 1.0)
        };
        let lacunarity = if self.lacunarity.is_nan() {
            2.0
        } else {
            self.lacunarity.clamp(MIN_LACUNARITY, MAX_LACUNARITY)
        };
        NoiseParams {
            scale,
            octaves: (self.octaves.max(1) as u32).min(MAX_OCTAVES),
            persistence,
            lacunarity,
        }
    }
}

/// Noise parameters after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    /// Grid cells per noise lattice unit; always positive.
    pub scale: f64,
    /// Number of fBm layers, in `1..=MAX_OCTAVES`.
    pub octaves: u32,
    /// Amplitude multiplier per octave, in `(0, 1]`.
    pub persistence: f64,
    /// Frequency multiplier per octave, in `[1.01, MAX_LACUNARITY]`.
    pub lacunarity: f64,
}

/// POI section as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiConfig {
    pub towns: i32,
    pub castles: i32,
    pub dungeons: i32,
    pub min_spacing: i32,
}

impl Default for PoiConfig {
    fn default() -> Self {
        Self {
            towns: 6,
            castles: 3,
            dungeons: 6,
            min_spacing: 4,
        }
    }
}

/// Full world generation config. Loaded once per generation and never
/// mutated while a world is being built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: i32,
    pub height: i32,
    pub seed: i64,
    pub noise: NoiseConfig,
    pub biomes: BiomeThresholds,
    pub poi: PoiConfig,
    /// Number of rivers to carve.
    pub rivers: i32,
    /// Per-biome road pass-costs.
    pub roads: PassCosts,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            seed: 1337,
            noise: NoiseConfig::default(),
            biomes: BiomeThresholds::default(),
            poi: PoiConfig::default(),
            rivers: 5,
            roads: PassCosts::default(),
        }
    }
}

impl WorldConfig {
    /// Load a config file. `.json` files are parsed as JSON, everything else
    /// as TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(toml::from_str(&contents)?)
        }
    }

    /// Load a config file, falling back to defaults if it is missing or broken.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("worldgen config not found at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                error!("Error reading {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Check dimensions and clamp everything else into range.
    pub fn validate(&self) -> Result<ValidatedConfig, WorldGenError> {
        let invalid = WorldGenError::InvalidDimensions {
            width: self.width as i64,
            height: self.height as i64,
        };
        if self.width <= 0 || self.height <= 0 {
            return Err(invalid);
        }
        let width = self.width as usize;
        let height = self.height as usize;
        // Every grid is width * height cells; the river budget is twice that.
        if width
            .checked_mul(height)
            .and_then(|cells| cells.checked_mul(2))
            .is_none()
        {
            return Err(invalid);
        }

        Ok(ValidatedConfig {
            width,
            height,
            seed: self.seed,
            noise: self.noise.sanitized(),
            thresholds: self.biomes.repaired(),
            poi: PoiCounts {
                castles: self.poi.castles.max(0) as usize,
                towns: self.poi.towns.max(0) as usize,
                dungeons: self.poi.dungeons.max(0) as usize,
            },
            min_spacing: self.poi.min_spacing.max(0) as usize,
            rivers: self.rivers.max(0) as usize,
            pass_costs: self.roads,
        })
    }
}

/// A config that has passed [`WorldConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub width: usize,
    pub height: usize,
    pub seed: i64,
    pub noise: NoiseParams,
    pub thresholds: BiomeThresholds,
    pub poi: PoiCounts,
    pub min_spacing: usize,
    pub rivers: usize,
    pub pass_costs: PassCosts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dnd_rs_cfg_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = WorldConfig::default();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 48);
        assert_eq!(config.seed, 1337);
        assert_eq!(config.noise.scale, 32.0);
        assert_eq!(config.noise.octaves, 4);
        assert_eq!(config.biomes.water, 0.30);
        assert_eq!(config.biomes.forest, 0.80);
        assert_eq!(config.poi.towns, 6);
        assert_eq!(config.poi.castles, 3);
        assert_eq!(config.poi.dungeons, 6);
        assert_eq!(config.poi.min_spacing, 4);
        assert_eq!(config.rivers, 5);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
            width = 20
            seed = 42

            [noise]
            octaves = 6

            [poi]
            castles = 1
        "#;
        let config: WorldConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.width, 20);
        assert_eq!(config.height, 48); // default
        assert_eq!(config.seed, 42);
        assert_eq!(config.noise.octaves, 6);
        assert_eq!(config.noise.scale, 32.0); // default
        assert_eq!(config.poi.castles, 1);
        assert_eq!(config.poi.towns, 6); // default
        assert_eq!(config.roads.grass, 3); // default
    }

    #[test]
    fn parse_worldgen_json() {
        let json = r#"{
            "width": 10,
            "height": 12,
            "biomes": {"water": 0.2, "sand": 0.25, "grass": 0.6, "forest": 0.75},
            "rivers": 0
        }"#;
        let path = temp_file("worldgen.json", json);
        let config = WorldConfig::load(&path).unwrap();
        assert_eq!(config.width, 10);
        assert_eq!(config.height, 12);
        assert_eq!(config.biomes.sand, 0.25);
        assert_eq!(config.rivers, 0);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("missing_{}.toml", rand::random::<u64>()));
        assert_eq!(WorldConfig::load_or_default(&path), WorldConfig::default());
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let path = temp_file("worldgen.toml", "width = [not toml");
        assert!(matches!(WorldConfig::load(&path), Err(ConfigError::Toml(_))));
        assert_eq!(WorldConfig::load_or_default(&path), WorldConfig::default());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn validate_rejects_non_positive_dimensions() {
        for (width, height) in [(0, 10), (10, 0), (-3, 5)] {
            let config = WorldConfig {
                width,
                height,
                ..WorldConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(WorldGenError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn validate_clamps_soft_errors() {
        let config = WorldConfig {
            noise: NoiseConfig {
                scale: -4.0,
                octaves: 0,
                persistence: 3.0,
                lacunarity: 0.5,
            },
            poi: PoiConfig {
                towns: -1,
                castles: -2,
                dungeons: 3,
                min_spacing: -5,
            },
            rivers: -7,
            ..WorldConfig::default()
        };
        let valid = config.validate().unwrap();
        assert_eq!(valid.noise.scale, MIN_SCALE);
        assert_eq!(valid.noise.octaves, 1);
        assert_eq!(valid.noise.persistence, 1.0);
        assert!(valid.noise.lacunarity > 1.0);
        assert_eq!(valid.poi.towns, 0);
        assert_eq!(valid.poi.castles, 0);
        assert_eq!(valid.poi.dungeons, 3);
        assert_eq!(valid.min_spacing, 0);
        assert_eq!(valid.rivers, 0);
    }

    #[test]
    fn validate_caps_runaway_noise() {
        let config = WorldConfig {
            noise: NoiseConfig {
                scale: 32.0,
                octaves: i32::MAX,
                persistence: 0.5,
                lacunarity: 1e300,
            },
            ..WorldConfig::default()
        };
        let noise = config.validate().unwrap().noise;
        assert_eq!(noise.octaves, MAX_OCTAVES);
        assert_eq!(noise.lacunarity, MAX_LACUNARITY);

        let infinite = NoiseConfig {
            lacunarity: f64::INFINITY,
            ..NoiseConfig::default()
        };
        assert_eq!(infinite.sanitized().lacunarity, MAX_LACUNARITY);
    }

    #[test]
    fn validate_repairs_thresholds() {
        let config = WorldConfig {
            biomes: BiomeThresholds {
                water: 0.5,
                sand: 0.2,
                grass: 0.9,
                forest: 0.1,
            },
            ..WorldConfig::default()
        };
        let t = config.validate().unwrap().thresholds;
        assert!(t.water <= t.sand && t.sand <= t.grass && t.grass <= t.forest);
    }
}
