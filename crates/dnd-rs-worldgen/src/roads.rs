//! Greedy road generation between POIs.
//!
//! Towns link to their nearest castle (or nearest other town when there are
//! no castles) and consecutive castles link to each other. Each link is laid
//! by a greedy walker that prefers cheap terrain, then closeness to the
//! target, and never steps onto water.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::biome::Biome;
use crate::grid::{manhattan, Grid};
use crate::poi::{Poi, PoiKind};

/// Per-biome cost of laying road. Lower is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassCosts {
    pub water: u32,
    pub sand: u32,
    pub grass: u32,
    pub forest: u32,
    pub mountain: u32,
}

impl Default for PassCosts {
    fn default() -> Self {
        Self {
            water: 9999,
            sand: 6,
            grass: 3,
            forest: 5,
            mountain: 8,
        }
    }
}

impl PassCosts {
    pub fn cost(&self, biome: Biome) -> u32 {
        match biome {
            Biome::Water => self.water,
            Biome::Sand => self.sand,
            Biome::Grass => self.grass,
            Biome::Forest => self.forest,
            Biome::Mountain => self.mountain,
        }
    }
}

/// How a single road attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadOutcome {
    Reached,
    /// Surrounded by water; the partial road is kept.
    Blocked,
    /// Ran out of steps; the partial road is kept.
    Exhausted,
}

/// Outcome counts for one road pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadStats {
    pub requested: usize,
    pub reached: usize,
    pub blocked: usize,
    pub exhausted: usize,
}

impl RoadStats {
    fn record(&mut self, outcome: RoadOutcome) {
        self.requested += 1;
        match outcome {
            RoadOutcome::Reached => self.reached += 1,
            RoadOutcome::Blocked => self.blocked += 1,
            RoadOutcome::Exhausted => self.exhausted += 1,
        }
    }
}

/// Lay one road from `start` toward `end`, marking every tile stepped on.
///
/// The start tile itself is not marked. At most `width * height` steps.
pub fn lay_road(
    biomes: &Grid<Biome>,
    roads: &mut Grid<bool>,
    start: (usize, usize),
    end: (usize, usize),
    costs: &PassCosts,
) -> RoadOutcome {
    let max_steps = biomes.width() * biomes.height();
    let mut pos = start;
    let mut steps = 0;

    while pos != end {
        if steps >= max_steps {
            return RoadOutcome::Exhausted;
        }
        steps += 1;

        let mut candidates: Vec<(usize, usize)> = biomes.neighbors(pos.0, pos.1).collect();
        candidates.sort_by_key(|&c| (costs.cost(biomes[c]), manhattan(c, end)));

        match candidates.into_iter().find(|&c| biomes[c] != Biome::Water) {
            Some(next) => {
                roads.set(next.0, next.1, true);
                pos = next;
            }
            None => return RoadOutcome::Blocked,
        }
    }
    RoadOutcome::Reached
}

/// The first position in `pool` closest to `from`.
fn nearest(from: (usize, usize), pool: &[(usize, usize)]) -> Option<(usize, usize)> {
    pool.iter().copied().min_by_key(|&q| manhattan(from, q))
}

/// Build the road grid for a set of placed POIs.
pub fn connect_pois(biomes: &Grid<Biome>, pois: &[Poi], costs: &PassCosts) -> (Grid<bool>, RoadStats) {
    let mut roads = Grid::filled(biomes.width(), biomes.height(), false);
    let mut stats = RoadStats::default();

    let positions_of = |kind: PoiKind| -> Vec<(usize, usize)> {
        pois.iter().filter(|p| p.kind == kind).map(Poi::pos).collect()
    };
    let towns = positions_of(PoiKind::Town);
    let castles = positions_of(PoiKind::Castle);

    for &town in &towns {
        let target = nearest(town, &castles).or_else(|| {
            let others: Vec<_> = towns.iter().copied().filter(|&q| q != town).collect();
            nearest(town, &others)
        });
        if let Some(target) = target {
            let outcome = lay_road(biomes, &mut roads, town, target, costs);
            if outcome != RoadOutcome::Reached {
                debug!("Road {town:?} -> {target:?} abandoned: {outcome:?}");
            }
            stats.record(outcome);
        }
    }

    for pair in castles.windows(2) {
        let outcome = lay_road(biomes, &mut roads, pair[0], pair[1], costs);
        if outcome != RoadOutcome::Reached {
            debug!("Road {:?} -> {:?} abandoned: {outcome:?}", pair[0], pair[1]);
        }
        stats.record(outcome);
    }

    (roads, stats)
}
