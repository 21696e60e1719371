//! The generated world and the read-only queries the game runs against it.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::biome::Biome;
use crate::grid::Grid;
use crate::poi::PoiKind;

/// Build the `"x,y"` key locations are addressed by.
pub fn location_key(x: usize, y: usize) -> String {
    format!("{x},{y}")
}

/// Parse an `"x,y"` location key.
pub fn parse_location_key(key: &str) -> Option<(usize, usize)> {
    let (x, y) = key.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// A named POI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub x: usize,
    pub y: usize,
    pub kind: PoiKind,
    pub name: String,
}

impl Location {
    pub fn pos(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn key(&self) -> String {
        location_key(self.x, self.y)
    }
}

/// Value half of a serialized location entry.
#[derive(Serialize, Deserialize)]
struct LocationValue {
    #[serde(rename = "type")]
    kind: PoiKind,
    name: String,
}

/// Locations in placement order, serialized as an `"x,y"`-keyed map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    entries: Vec<Location>,
}

impl Locations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, replacing any existing one on the same tile.
    pub fn insert(&mut self, location: Location) {
        match self.entries.iter_mut().find(|l| l.pos() == location.pos()) {
            Some(existing) => *existing = location,
            None => self.entries.push(location),
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Location> {
        self.entries.iter().find(|l| l.x == x && l.y == y)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&Location> {
        let (x, y) = parse_location_key(key)?;
        self.get(x, y)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: PoiKind) -> usize {
        self.entries.iter().filter(|l| l.kind == kind).count()
    }
}

impl Serialize for Locations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for loc in &self.entries {
            let value = LocationValue {
                kind: loc.kind,
                name: loc.name.clone(),
            };
            map.serialize_entry(&loc.key(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Locations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LocationsVisitor;

        impl<'de> Visitor<'de> for LocationsVisitor {
            type Value = Locations;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of \"x,y\" keys to locations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Locations, A::Error> {
                let mut locations = Locations::new();
                while let Some((key, value)) = access.next_entry::<String, LocationValue>()? {
                    let (x, y) = parse_location_key(&key)
                        .ok_or_else(|| de::Error::custom(format!("bad location key {key:?}")))?;
                    locations.insert(Location {
                        x,
                        y,
                        kind: value.kind,
                        name: value.name,
                    });
                }
                Ok(locations)
            }
        }

        deserializer.deserialize_map(LocationsVisitor)
    }
}

/// What occupies a single tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tile<'a> {
    /// Outside the map.
    Void,
    Location(&'a Location),
    Terrain { biome: Biome, river: bool, road: bool },
}

impl Tile<'_> {
    /// Short description: the location name, the terrain label, or "void".
    pub fn label(&self) -> &str {
        match self {
            Tile::Void => "void",
            Tile::Location(loc) => &loc.name,
            Tile::Terrain { biome, .. } => biome.terrain(),
        }
    }
}

/// A fully generated, immutable world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub width: usize,
    pub height: usize,
    pub seed: i64,
    pub heightmap: Grid<f64>,
    pub biomes: Grid<Biome>,
    pub rivers: Grid<bool>,
    pub roads: Grid<bool>,
    pub locations: Locations,
}

impl World {
    /// Where a new player starts: the first dungeon, else the first location,
    /// else the origin.
    pub fn starting_position(&self) -> (usize, usize) {
        self.locations
            .iter()
            .find(|l| l.kind == PoiKind::Dungeon)
            .or_else(|| self.locations.iter().next())
            .map_or((0, 0), Location::pos)
    }

    pub fn biome_at(&self, x: usize, y: usize) -> Option<Biome> {
        self.biomes.get(x, y).copied()
    }

    /// Describe the tile at signed coordinates.
    pub fn tile(&self, x: i64, y: i64) -> Tile<'_> {
        if !self.biomes.contains(x, y) {
            return Tile::Void;
        }
        let (x, y) = (x as usize, y as usize);
        if let Some(loc) = self.locations.get(x, y) {
            return Tile::Location(loc);
        }
        Tile::Terrain {
            biome: self.biomes[(x, y)],
            river: self.rivers[(x, y)],
            road: self.roads[(x, y)],
        }
    }

    /// Render the whole map, one character per tile.
    ///
    /// Biome symbols, `#` for roads on dry land, and `C`/`t`/`D` for castles,
    /// towns and dungeons.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for (y, row) in self.biomes.rows().enumerate() {
            if y > 0 {
                out.push('\n');
            }
            for (x, &biome) in row.iter().enumerate() {
                let ch = match self.locations.get(x, y) {
                    Some(loc) => match loc.kind {
                        PoiKind::Castle => 'C',
                        PoiKind::Town => 't',
                        PoiKind::Dungeon => 'D',
                    },
                    None if self.roads[(x, y)] && biome != Biome::Water => '#',
                    None => biome.symbol(),
                };
                out.push(ch);
            }
        }
        out
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: usize, y: usize, kind: PoiKind, name: &str) -> Location {
        Location {
            x,
            y,
            kind,
            name: name.into(),
        }
    }

    fn small_world(locations: &[Location]) -> World {
        let mut locs = Locations::new();
        for l in locations {
            locs.insert(l.clone());
        }
        let mut biomes = Grid::filled(4, 3, Biome::Grass);
        biomes.set(0, 0, Biome::Water);
        biomes.set(3, 2, Biome::Mountain);
        let mut roads = Grid::filled(4, 3, false);
        roads.set(1, 1, true);
        roads.set(0, 0, true);
        World {
            width: 4,
            height: 3,
            seed: 9,
            heightmap: Grid::filled(4, 3, 0.5),
            biomes,
            rivers: Grid::filled(4, 3, false),
            roads,
            locations: locs,
        }
    }

    #[test]
    fn location_keys() {
        assert_eq!(location_key(3, 17), "3,17");
        assert_eq!(parse_location_key("3,17"), Some((3, 17)));
        assert_eq!(parse_location_key("3;17"), None);
        assert_eq!(parse_location_key("-1,2"), None);
    }

    #[test]
    fn start_prefers_dungeon() {
        let world = small_world(&[
            loc(1, 0, PoiKind::Town, "Town 1"),
            loc(2, 2, PoiKind::Dungeon, "Dungeon 1"),
            loc(3, 0, PoiKind::Town, "Town 2"),
        ]);
        assert_eq!(world.starting_position(), (2, 2));
    }

    #[test]
    fn start_falls_back_to_first_location() {
        let world = small_world(&[
            loc(3, 1, PoiKind::Castle, "Castle 1"),
            loc(1, 0, PoiKind::Town, "Town 1"),
        ]);
        assert_eq!(world.starting_position(), (3, 1));
    }

    #[test]
    fn start_defaults_to_origin() {
        assert_eq!(small_world(&[]).starting_position(), (0, 0));
    }

    #[test]
    fn tile_lookup() {
        let world = small_world(&[loc(2, 1, PoiKind::Town, "Town 1")]);
        assert_eq!(world.tile(-1, 0), Tile::Void);
        assert_eq!(world.tile(4, 0), Tile::Void);
        assert!(matches!(world.tile(2, 1), Tile::Location(l) if l.name == "Town 1"));
        assert_eq!(
            world.tile(1, 1),
            Tile::Terrain {
                biome: Biome::Grass,
                river: false,
                road: true
            }
        );
    }

    #[test]
    fn tile_labels() {
        let world = small_world(&[loc(2, 1, PoiKind::Town, "Town 1")]);
        assert_eq!(world.tile(2, 1).label(), "Town 1");
        assert_eq!(world.tile(1, 1).label(), "plains");
        assert_eq!(world.tile(0, 0).label(), "water");
        assert_eq!(world.tile(3, 2).label(), "mountain");
        assert_eq!(world.tile(9, 9).label(), "void");
    }

    #[test]
    fn ascii_render() {
        let world = small_world(&[loc(2, 1, PoiKind::Castle, "Castle 1")]);
        // Road on the water tile at (0, 0) is not drawn.
        assert_eq!(world.render_ascii(), "~...\n.#C.\n...^");
    }

    #[test]
    fn insert_replaces_same_tile() {
        let mut locs = Locations::new();
        locs.insert(loc(1, 1, PoiKind::Town, "Town 1"));
        locs.insert(loc(1, 1, PoiKind::Castle, "Castle 1"));
        assert_eq!(locs.len(), 1);
        assert_eq!(locs.get(1, 1).unwrap().kind, PoiKind::Castle);
    }

    #[test]
    fn json_matches_output_contract() {
        let world = small_world(&[
            loc(3, 1, PoiKind::Dungeon, "Dungeon 1"),
            loc(1, 2, PoiKind::Town, "Town 1"),
        ]);
        let value: serde_json::Value = serde_json::from_str(&world.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["width"], 4);
        assert_eq!(value["biomes"][0][0], "water");
        assert_eq!(value["roads"][1][1], true);
        assert_eq!(value["locations"]["3,1"]["type"], "dungeon");
        assert_eq!(value["locations"]["1,2"]["name"], "Town 1");

        let back: World = serde_json::from_str(&world.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, world);
        let order: Vec<_> = back.locations.iter().map(Location::key).collect();
        assert_eq!(order, vec!["3,1", "1,2"]);
    }
}
