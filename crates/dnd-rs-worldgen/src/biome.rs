//! Biome definitions and height-threshold classification.
//!
//! The biome set is fixed. Each biome is picked purely from the normalized
//! height of its tile; rivers later force tiles to [`Biome::Water`].

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Minimum gap inserted when repairing an out-of-order threshold.
const THRESHOLD_BUMP: f64 = 0.01;

/// Terrain classification of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Water,
    Sand,
    #[default]
    Grass,
    Forest,
    Mountain,
}

/// Static properties of a biome.
#[derive(Debug, Clone)]
pub struct BiomeDef {
    pub biome: Biome,
    /// Stable numeric id used by the persisted world format.
    pub id: u8,
    /// Name used in config files and the JSON output.
    pub name: &'static str,
    /// Terrain label shown to players for plain tiles.
    pub terrain: &'static str,
    /// Character used by the ASCII map dump.
    pub symbol: char,
}

/// All biome definitions, ordered from lowest to highest ground.
static BIOME_DEFS: &[BiomeDef] = &[
    BiomeDef {
        biome: Biome::Water,
        id: 0,
        name: "water",
        terrain: "water",
        symbol: '~',
    },
    BiomeDef {
        biome: Biome::Sand,
        id: 1,
        name: "sand",
        terrain: "sand",
        symbol: '*',
    },
    BiomeDef {
        biome: Biome::Grass,
        id: 2,
        name: "grass",
        terrain: "plains",
        symbol: '.',
    },
    BiomeDef {
        biome: Biome::Forest,
        id: 3,
        name: "forest",
        terrain: "forest",
        symbol: 'T',
    },
    BiomeDef {
        biome: Biome::Mountain,
        id: 4,
        name: "mountain",
        terrain: "mountain",
        symbol: '^',
    },
];

impl Biome {
    pub const ALL: [Biome; 5] = [
        Biome::Water,
        Biome::Sand,
        Biome::Grass,
        Biome::Forest,
        Biome::Mountain,
    ];

    pub fn def(self) -> &'static BiomeDef {
        // BIOME_DEFS is indexed by declaration order.
        &BIOME_DEFS[self as usize]
    }

    pub fn id(self) -> u8 {
        self.def().id
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// Player-facing terrain label ("plains" for grass).
    pub fn terrain(self) -> &'static str {
        self.def().terrain
    }

    pub fn symbol(self) -> char {
        self.def().symbol
    }

    /// Look up a biome by its persisted id.
    pub fn from_id(id: u8) -> Option<Self> {
        BIOME_DEFS.iter().find(|d| d.id == id).map(|d| d.biome)
    }

    /// Look up a biome by its config/JSON name.
    pub fn from_name(name: &str) -> Option<Self> {
        BIOME_DEFS.iter().find(|d| d.name == name).map(|d| d.biome)
    }
}

/// Upper height bounds for the four lowest biomes. Anything at or above
/// `forest` is mountain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeThresholds {
    pub water: f64,
    pub sand: f64,
    pub grass: f64,
    pub forest: f64,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            water: 0.30,
            sand: 0.36,
            grass: 0.65,
            forest: 0.80,
        }
    }
}

impl BiomeThresholds {
    /// Force the thresholds into non-decreasing order within `[0, 1]`.
    ///
    /// A value below its predecessor is bumped to predecessor + 0.01, capped
    /// at 1.0. NaN is treated as equal to the predecessor.
    pub fn repaired(&self) -> Self {
        let mut prev = 0.0_f64;
        let mut fix = |v: f64| {
            let v = if v.is_nan() { prev } else { v.clamp(0.0, 1.0) };
            let v = if v < prev {
                (prev + THRESHOLD_BUMP).min(1.0)
            } else {
                v
            };
            prev = v;
            v
        };
        Self {
            water: fix(self.water),
            sand: fix(self.sand),
            grass: fix(self.grass),
            forest: fix(self.forest),
        }
    }

    /// Classify one height. Thresholds must already be repaired.
    pub fn classify(&self, height: f64) -> Biome {
        if height < self.water {
            Biome::Water
        } else if height < self.sand {
            Biome::Sand
        } else if height < self.grass {
            Biome::Grass
        } else if height < self.forest {
            Biome::Forest
        } else {
            Biome::Mountain
        }
    }
}

/// Derive the biome grid from a normalized heightmap.
pub fn classify_heightmap(heightmap: &Grid<f64>, thresholds: &BiomeThresholds) -> Grid<Biome> {
    let thresholds = thresholds.repaired();
    heightmap.map(|&h| thresholds.classify(h))
}
