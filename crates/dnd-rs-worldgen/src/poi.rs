//! Placement of towns, castles, and dungeons with spacing and biome rules.
//!
//! Placement is rejection sampling with a fixed attempt budget per POI.
//! When the budget runs out the POI is skipped, so a crowded or watery map
//! simply ends up with fewer POIs than requested.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::biome::Biome;
use crate::grid::{manhattan, Grid};

/// Random tiles tried per POI before giving up on it.
pub const PLACEMENT_ATTEMPTS: usize = 4000;

/// Point-of-interest type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiKind {
    Town,
    Castle,
    Dungeon,
}

impl PoiKind {
    /// Stable numeric id used by the persisted world format.
    pub fn id(self) -> u8 {
        match self {
            Self::Town => 0,
            Self::Castle => 1,
            Self::Dungeon => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Town),
            1 => Some(Self::Castle),
            2 => Some(Self::Dungeon),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Town => "town",
            Self::Castle => "castle",
            Self::Dungeon => "dungeon",
        }
    }

    /// Prefix for generated location names ("Town 1", "Castle 2", ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::Town => "Town",
            Self::Castle => "Castle",
            Self::Dungeon => "Dungeon",
        }
    }

    /// Whether this POI type may be built on `biome`.
    pub fn allows(self, biome: Biome) -> bool {
        match self {
            Self::Town | Self::Castle => matches!(biome, Biome::Grass | Biome::Forest),
            Self::Dungeon => matches!(biome, Biome::Mountain | Biome::Forest | Biome::Grass),
        }
    }
}

/// A placed point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Poi {
    pub x: usize,
    pub y: usize,
    pub kind: PoiKind,
}

impl Poi {
    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

/// How many POIs of each type to place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoiCounts {
    pub castles: usize,
    pub towns: usize,
    pub dungeons: usize,
}

impl PoiCounts {
    pub fn total(&self) -> usize {
        self.castles + self.towns + self.dungeons
    }
}

/// Result of a placement pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// POIs in placement order: castles, then towns, then dungeons.
    pub pois: Vec<Poi>,
    pub requested: usize,
}

impl Placement {
    /// Number of requested POIs that could not be placed.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.pois.len())
    }
}

/// Place castles, then towns, then dungeons on eligible tiles.
///
/// Every POI is at Manhattan distance `>= min_spacing` from all POIs placed
/// before it, whatever their type. Two POIs never share a tile, even with a
/// spacing of zero, since locations are keyed by position.
pub fn place_pois<R: Rng>(
    biomes: &Grid<Biome>,
    counts: &PoiCounts,
    min_spacing: usize,
    rng: &mut R,
) -> Placement {
    let mut pois: Vec<Poi> = Vec::with_capacity(counts.total());
    let order = [
        (PoiKind::Castle, counts.castles),
        (PoiKind::Town, counts.towns),
        (PoiKind::Dungeon, counts.dungeons),
    ];

    if biomes.width() > 0 && biomes.height() > 0 {
        for (kind, count) in order {
            for _ in 0..count {
                if let Some(poi) = spawn(biomes, &pois, kind, min_spacing, rng) {
                    pois.push(poi);
                }
            }
        }
    }

    let placement = Placement {
        pois,
        requested: counts.total(),
    };
    if placement.shortfall() > 0 {
        debug!(
            "Placed {}/{} POIs; {} ran out of attempts",
            placement.pois.len(),
            placement.requested,
            placement.shortfall()
        );
    }
    placement
}

fn spawn<R: Rng>(
    biomes: &Grid<Biome>,
    placed: &[Poi],
    kind: PoiKind,
    min_spacing: usize,
    rng: &mut R,
) -> Option<Poi> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let x = rng.gen_range(0..biomes.width());
        let y = rng.gen_range(0..biomes.height());
        if can_place(biomes, placed, kind, min_spacing, (x, y)) {
            return Some(Poi { x, y, kind });
        }
    }
    None
}

fn can_place(
    biomes: &Grid<Biome>,
    placed: &[Poi],
    kind: PoiKind,
    min_spacing: usize,
    pos: (usize, usize),
) -> bool {
    if !kind.allows(biomes[pos]) {
        return false;
    }
    placed.iter().all(|p| {
        let d = manhattan(p.pos(), pos);
        d > 0 && d >= min_spacing
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts(castles: usize, towns: usize, dungeons: usize) -> PoiCounts {
        PoiCounts {
            castles,
            towns,
            dungeons,
        }
    }

    #[test]
    fn kind_ids_roundtrip() {
        for kind in [PoiKind::Town, PoiKind::Castle, PoiKind::Dungeon] {
            assert_eq!(PoiKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(PoiKind::from_id(9), None);
    }

    #[test]
    fn eligibility_rules() {
        assert!(PoiKind::Town.allows(Biome::Grass));
        assert!(PoiKind::Castle.allows(Biome::Forest));
        assert!(!PoiKind::Town.allows(Biome::Mountain));
        assert!(!PoiKind::Castle.allows(Biome::Sand));
        assert!(PoiKind::Dungeon.allows(Biome::Mountain));
        assert!(!PoiKind::Dungeon.allows(Biome::Water));
        assert!(!PoiKind::Dungeon.allows(Biome::Sand));
    }

    #[test]
    fn placement_order_is_castles_towns_dungeons() {
        let biomes = Grid::filled(40, 40, Biome::Forest);
        let mut rng = StdRng::seed_from_u64(1);
        let placement = place_pois(&biomes, &counts(2, 3, 2), 3, &mut rng);
        let kinds: Vec<_> = placement.pois.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PoiKind::Castle,
                PoiKind::Castle,
                PoiKind::Town,
                PoiKind::Town,
                PoiKind::Town,
                PoiKind::Dungeon,
                PoiKind::Dungeon,
            ]
        );
        assert_eq!(placement.shortfall(), 0);
    }

    #[test]
    fn spacing_and_biomes_respected() {
        let biomes = Grid::from_fn(30, 30, |x, y| match (x + y) % 4 {
            0 => Biome::Water,
            1 => Biome::Grass,
            2 => Biome::Mountain,
            _ => Biome::Sand,
        });
        let mut rng = StdRng::seed_from_u64(99);
        let placement = place_pois(&biomes, &counts(3, 6, 6), 4, &mut rng);
        for (i, a) in placement.pois.iter().enumerate() {
            assert!(a.kind.allows(biomes[a.pos()]), "{a:?} on ineligible tile");
            for b in &placement.pois[i + 1..] {
                assert!(manhattan(a.pos(), b.pos()) >= 4, "{a:?} too close to {b:?}");
            }
        }
    }

    #[test]
    fn no_eligible_tiles_places_nothing() {
        let biomes = Grid::filled(10, 10, Biome::Water);
        let mut rng = StdRng::seed_from_u64(5);
        let placement = place_pois(&biomes, &counts(1, 1, 1), 0, &mut rng);
        assert!(placement.pois.is_empty());
        assert_eq!(placement.shortfall(), 3);
    }

    #[test]
    fn crowded_map_places_fewer() {
        // A 3x3 grass map fits one POI at spacing 10.
        let biomes = Grid::filled(3, 3, Biome::Grass);
        let mut rng = StdRng::seed_from_u64(5);
        let placement = place_pois(&biomes, &counts(0, 4, 0), 10, &mut rng);
        assert_eq!(placement.pois.len(), 1);
        assert_eq!(placement.shortfall(), 3);
    }

    #[test]
    fn zero_spacing_never_stacks_pois() {
        let biomes = Grid::filled(2, 1, Biome::Grass);
        let mut rng = StdRng::seed_from_u64(3);
        let placement = place_pois(&biomes, &counts(0, 5, 0), 0, &mut rng);
        assert_eq!(placement.pois.len(), 2);
        assert_ne!(placement.pois[0].pos(), placement.pois[1].pos());
    }

    #[test]
    fn deterministic_for_same_rng_seed() {
        let biomes = Grid::filled(25, 25, Biome::Grass);
        let a = place_pois(&biomes, &counts(3, 6, 6), 4, &mut StdRng::seed_from_u64(1337));
        let b = place_pois(&biomes, &counts(3, 6, 6), 4, &mut StdRng::seed_from_u64(1337));
        assert_eq!(a, b);
    }
}
