//! River carving from local peaks down to water or the map edge.
//!
//! Each river walks greedily downhill. A small uphill slack lets it cross
//! noise-level bumps, and when every neighbor is visited or too high it is
//! forced onto the lowest neighbor anyway. The walk stops on water, on the
//! border, or when its step budget runs out; partial rivers are kept.

use tracing::debug;

use crate::biome::Biome;
use crate::grid::Grid;

/// How far uphill a river may step to get out of a shallow pit.
pub const HEIGHT_SLACK: f64 = 0.01;

/// Outcome counts for one carving pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiverStats {
    pub requested: usize,
    /// Rivers actually traced (limited by the number of peaks).
    pub traced: usize,
    /// Rivers that ran out of steps before reaching water or the border.
    pub unterminated: usize,
}

/// Cells at least as high as all their 4-neighbors, highest first, at most
/// `count` of them. Ties keep row-major order.
pub fn find_local_peaks(heightmap: &Grid<f64>, count: usize) -> Vec<(usize, usize)> {
    if count == 0 {
        return Vec::new();
    }
    let mut peaks: Vec<(usize, usize, f64)> = heightmap
        .iter()
        .filter(|&(x, y, &h)| heightmap.neighbors(x, y).all(|(nx, ny)| h >= heightmap[(nx, ny)]))
        .map(|(x, y, &h)| (x, y, h))
        .collect();
    peaks.sort_by(|a, b| b.2.total_cmp(&a.2));
    peaks.into_iter().take(count).map(|(x, y, _)| (x, y)).collect()
}

/// Trace `river_count` rivers and turn every river tile into water.
///
/// Termination checks read the biomes as they were before this pass, so a
/// river does not stop where an earlier river crossed.
pub fn carve_rivers(
    heightmap: &Grid<f64>,
    biomes: &mut Grid<Biome>,
    river_count: usize,
) -> (Grid<bool>, RiverStats) {
    let (width, height) = (heightmap.width(), heightmap.height());
    let mut rivers = Grid::filled(width, height, false);
    let mut stats = RiverStats {
        requested: river_count,
        ..RiverStats::default()
    };
    let sources = find_local_peaks(heightmap, river_count);
    let max_steps = width * height * 2;

    for (sx, sy) in sources {
        stats.traced += 1;
        if !trace_river(heightmap, biomes, &mut rivers, (sx, sy), max_steps) {
            stats.unterminated += 1;
            debug!("River from ({sx}, {sy}) exhausted its {max_steps}-step budget");
        }
    }

    for (x, y, &is_river) in rivers.iter() {
        if is_river {
            biomes.set(x, y, Biome::Water);
        }
    }

    (rivers, stats)
}

/// Walk one river, marking tiles. Returns whether it reached an outlet.
fn trace_river(
    heightmap: &Grid<f64>,
    biomes: &Grid<Biome>,
    rivers: &mut Grid<bool>,
    source: (usize, usize),
    max_steps: usize,
) -> bool {
    let mut visited = Grid::filled(heightmap.width(), heightmap.height(), false);
    let (mut x, mut y) = source;

    for _ in 0..max_steps {
        visited.set(x, y, true);
        rivers.set(x, y, true);
        if biomes[(x, y)] == Biome::Water || heightmap.is_border(x, y) {
            return true;
        }

        let mut neighbors: Vec<(usize, usize)> = heightmap.neighbors(x, y).collect();
        neighbors.sort_by(|a, b| heightmap[*a].total_cmp(&heightmap[*b]));

        let limit = heightmap[(x, y)] + HEIGHT_SLACK;
        let next = neighbors
            .iter()
            .copied()
            .find(|&n| !visited[n] && heightmap[n] <= limit)
            .or_else(|| neighbors.first().copied());

        match next {
            Some((nx, ny)) => {
                x = nx;
                y = ny;
            }
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{classify_heightmap, BiomeThresholds};

    /// A cone peaking at the center of the map.
    fn cone(size: usize) -> Grid<f64> {
        let c = (size / 2) as f64;
        let max = c * 2.0;
        Grid::from_fn(size, size, |x, y| {
            let d = (x as f64 - c).abs() + (y as f64 - c).abs();
            1.0 - d / max
        })
    }

    #[test]
    fn zero_rivers_is_a_no_op() {
        let hm = cone(9);
        let mut biomes = classify_heightmap(&hm, &BiomeThresholds::default());
        let before = biomes.clone();
        let (rivers, stats) = carve_rivers(&hm, &mut biomes, 0);
        assert!(rivers.cells().iter().all(|&r| !r));
        assert_eq!(biomes, before);
        assert_eq!(stats.traced, 0);
    }

    #[test]
    fn cone_has_single_peak_at_center() {
        let hm = cone(9);
        assert_eq!(find_local_peaks(&hm, 5), vec![(4, 4)]);
    }

    #[test]
    fn peaks_sorted_highest_first() {
        let mut hm = Grid::filled(7, 7, 0.0);
        hm.set(1, 1, 0.5);
        hm.set(5, 5, 0.9);
        hm.set(3, 3, 0.7);
        let peaks = find_local_peaks(&hm, 3);
        assert_eq!(peaks, vec![(5, 5), (3, 3), (1, 1)]);
    }

    #[test]
    fn river_runs_from_peak_to_border() {
        let hm = cone(9);
        let mut biomes = Grid::filled(9, 9, Biome::Grass);
        let (rivers, stats) = carve_rivers(&hm, &mut biomes, 1);
        assert_eq!(stats.traced, 1);
        assert_eq!(stats.unterminated, 0);
        assert!(rivers[(4, 4)], "source tile must be part of the river");
        let touches_border = rivers.iter().any(|(x, y, &r)| r && rivers.is_border(x, y));
        assert!(touches_border, "river should reach the map edge");
    }

    #[test]
    fn river_stops_at_existing_water() {
        // Ridge peaking at (6, 4), falling steeply west toward a lake column.
        let hm = Grid::from_fn(9, 9, |x, y| {
            let dx = x as f64 - 6.0;
            let slope = if dx < 0.0 { -dx * 0.15 } else { dx * 0.05 };
            1.0 - slope - (y as f64 - 4.0).abs() * 0.01
        });
        let mut biomes = Grid::filled(9, 9, Biome::Grass);
        for y in 0..9 {
            biomes.set(4, y, Biome::Water);
        }
        let (rivers, stats) = carve_rivers(&hm, &mut biomes, 1);
        assert_eq!(stats.unterminated, 0);
        let tiles: Vec<_> = rivers
            .iter()
            .filter(|(_, _, &r)| r)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(tiles, vec![(4, 4), (5, 4), (6, 4)]);
    }

    #[test]
    fn river_tiles_become_water() {
        let hm = cone(11);
        let mut biomes = Grid::filled(11, 11, Biome::Mountain);
        let (rivers, _) = carve_rivers(&hm, &mut biomes, 3);
        for (x, y, &r) in rivers.iter() {
            if r {
                assert_eq!(biomes[(x, y)], Biome::Water, "river tile ({x}, {y}) not water");
            }
        }
    }

    #[test]
    fn flat_plateau_terminates() {
        // Every cell is a peak; walks must still end within budget.
        let hm = Grid::filled(6, 6, 0.5);
        let mut biomes = Grid::filled(6, 6, Biome::Grass);
        let (rivers, stats) = carve_rivers(&hm, &mut biomes, 4);
        assert_eq!(stats.traced, 4);
        assert!(rivers.cells().iter().any(|&r| r));
    }

    #[test]
    fn single_cell_map() {
        let hm = Grid::filled(1, 1, 0.0);
        let mut biomes = Grid::filled(1, 1, Biome::Grass);
        let (rivers, stats) = carve_rivers(&hm, &mut biomes, 2);
        assert_eq!(stats.traced, 1);
        assert!(rivers[(0, 0)]);
        assert_eq!(biomes[(0, 0)], Biome::Water);
    }
}
