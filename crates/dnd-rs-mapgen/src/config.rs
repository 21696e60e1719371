use serde::Deserialize;
use std::path::Path;

use dnd_rs_worldgen::{ConfigError, WorldConfig};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "mapgen.toml";

#[derive(Debug, Default, Deserialize)]
pub struct MapgenConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_directory")]
    pub directory: String,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_directory() -> String {
    "data/cache".into()
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            directory: default_cache_directory(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl MapgenConfig {
    /// Load a mapgen config. A `.json` file is read as a bare world config
    /// (the `worldgen.json` layout) with default cache and logging settings.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            return Ok(Self {
                world: WorldConfig::load(path)?,
                ..Self::default()
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [world]
            width = 80
            height = 60
            seed = 12345
            rivers = 3

            [world.poi]
            towns = 4

            [cache]
            directory = "cache/worlds"

            [logging]
            level = "debug"
        "#;
        let config: MapgenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.world.width, 80);
        assert_eq!(config.world.height, 60);
        assert_eq!(config.world.seed, 12345);
        assert_eq!(config.world.rivers, 3);
        assert_eq!(config.world.poi.towns, 4);
        assert_eq!(config.world.poi.castles, 3); // default
        assert_eq!(config.cache.directory, "cache/worlds");
        assert!(config.cache.enabled); // default
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: MapgenConfig = toml::from_str("").unwrap();
        assert_eq!(config.world, WorldConfig::default());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.directory, "data/cache");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_json_world_config() {
        let dir = std::env::temp_dir().join(format!("dnd_rs_mapgen_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("worldgen.json");
        std::fs::write(&path, r#"{"width": 20, "height": 10, "seed": 7}"#).unwrap();

        let config = MapgenConfig::load(&path).unwrap();
        assert_eq!(config.world.width, 20);
        assert_eq!(config.world.height, 10);
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.cache.directory, "data/cache");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_file_fails() {
        let result = MapgenConfig::load("/nonexistent/mapgen.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
