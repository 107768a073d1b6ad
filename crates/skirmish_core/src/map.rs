//! Map snapshots and the map catalog.
//!
//! Map data is authored in its own coordinate space (`width` × `height`)
//! and scaled into the simulation world when a match starts. The catalog is
//! pure data; only [`MapCatalog::load`] touches the filesystem.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GameError};
use crate::math::{Fixed, Vec2Fixed};
use crate::team::Team;

/// A point in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPoint {
    /// X in map space.
    pub x: i32,
    /// Y in map space.
    pub y: i32,
}

impl MapPoint {
    /// Create a point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Per-team spawn coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoints {
    /// Blue spawn.
    pub blue: MapPoint,
    /// Red spawn.
    pub red: MapPoint,
}

/// A named capturable point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePoint {
    /// Display name.
    pub name: String,
    /// X in map space.
    pub x: i32,
    /// Y in map space.
    pub y: i32,
}

/// Map data as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Stable identifier (`"waterloo"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Width of the map's coordinate space.
    pub width: u32,
    /// Height of the map's coordinate space.
    pub height: u32,
    /// Background tileset, presentation only.
    #[serde(default)]
    pub background: String,
    /// Team spawn coordinates.
    pub spawn_points: SpawnPoints,
    /// Capturable towns.
    #[serde(default)]
    pub capture_points: Vec<CapturePoint>,
}

/// A map scaled into simulation world coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMap {
    /// Map identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// World width.
    pub width: u32,
    /// World height.
    pub height: u32,
    /// Blue spawn in world space.
    pub blue_spawn: Vec2Fixed,
    /// Red spawn in world space.
    pub red_spawn: Vec2Fixed,
    /// Capture points in world space.
    pub objectives: Vec<(String, Vec2Fixed)>,
}

impl WorldMap {
    /// Spawn point for a team.
    #[must_use]
    pub const fn spawn(&self, team: Team) -> Vec2Fixed {
        match team {
            Team::Blue => self.blue_spawn,
            Team::Red => self.red_spawn,
        }
    }
}

impl MapSnapshot {
    /// Scale map coordinates into a `world_width` × `world_height` world.
    #[must_use]
    pub fn to_world(&self, world_width: u32, world_height: u32) -> WorldMap {
        let scale_x = Fixed::saturating_from_num(world_width)
            / Fixed::saturating_from_num(self.width.max(1));
        let scale_y = Fixed::saturating_from_num(world_height)
            / Fixed::saturating_from_num(self.height.max(1));
        let scale = |x: i32, y: i32| {
            Vec2Fixed::new(
                Fixed::from_num(x).saturating_mul(scale_x),
                Fixed::from_num(y).saturating_mul(scale_y),
            )
        };

        WorldMap {
            id: self.id.clone(),
            name: self.name.clone(),
            width: world_width,
            height: world_height,
            blue_spawn: scale(self.spawn_points.blue.x, self.spawn_points.blue.y),
            red_spawn: scale(self.spawn_points.red.x, self.spawn_points.red.y),
            objectives: self
                .capture_points
                .iter()
                .map(|point| (point.name.clone(), scale(point.x, point.y)))
                .collect(),
        }
    }

    /// Check internal consistency. Returns a list of problems.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push(format!("Map '{}' has an empty id", self.name));
        }
        if self.width == 0 || self.height == 0 {
            errors.push(format!("Map '{}' has zero size", self.id));
        }

        let in_bounds = |x: i32, y: i32| {
            x >= 0 && y >= 0 && (x as u32) <= self.width && (y as u32) <= self.height
        };
        for (label, point) in [
            ("blue spawn", self.spawn_points.blue),
            ("red spawn", self.spawn_points.red),
        ] {
            if !in_bounds(point.x, point.y) {
                errors.push(format!("Map '{}' {label} is out of bounds", self.id));
            }
        }
        for point in &self.capture_points {
            if !in_bounds(point.x, point.y) {
                errors.push(format!(
                    "Map '{}' capture point '{}' is out of bounds",
                    self.id, point.name
                ));
            }
        }
        errors
    }
}

/// Collection of selectable maps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapCatalog {
    /// Maps in menu order.
    pub maps: Vec<MapSnapshot>,
}

fn town(name: &str, x: i32, y: i32) -> CapturePoint {
    CapturePoint {
        name: name.to_string(),
        x,
        y,
    }
}

impl MapCatalog {
    /// The three stock maps.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            maps: vec![
                MapSnapshot {
                    id: "waterloo".into(),
                    name: "Waterloo".into(),
                    width: 2000,
                    height: 1200,
                    background: "grass".into(),
                    spawn_points: SpawnPoints {
                        blue: MapPoint::new(260, 940),
                        red: MapPoint::new(1740, 250),
                    },
                    capture_points: vec![
                        town("Capital", 1760, 180),
                        town("Front Town", 940, 540),
                        town("West Town", 520, 320),
                    ],
                },
                MapSnapshot {
                    id: "desert_siege".into(),
                    name: "Desert Siege".into(),
                    width: 2200,
                    height: 1300,
                    background: "desert".into(),
                    spawn_points: SpawnPoints {
                        blue: MapPoint::new(280, 980),
                        red: MapPoint::new(1940, 260),
                    },
                    capture_points: vec![
                        town("Capital", 1960, 170),
                        town("Dune Town", 1140, 640),
                        town("Oasis", 760, 360),
                    ],
                },
                MapSnapshot {
                    id: "flat_land".into(),
                    name: "Flat Land".into(),
                    width: 2000,
                    height: 1200,
                    background: "grass".into(),
                    spawn_points: SpawnPoints {
                        blue: MapPoint::new(200, 900),
                        red: MapPoint::new(1800, 200),
                    },
                    capture_points: vec![
                        town("Capital", 1700, 150),
                        town("Front Town", 900, 500),
                        town("Riverside", 520, 720),
                    ],
                },
            ],
        }
    }

    /// Parse a catalog from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let catalog: Self = ron::from_str(text)?;
        if let Some(problem) = catalog.validate().into_iter().next() {
            return Err(ConfigError::Invalid {
                field: "maps",
                message: problem,
            });
        }
        Ok(catalog)
    }

    /// Read and parse a RON catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&contents)
    }

    /// Find a map by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MapSnapshot> {
        self.maps.iter().find(|map| map.id == id)
    }

    /// Find a map by id or fail with [`GameError::UnknownMap`].
    pub fn require(&self, id: &str) -> crate::error::Result<&MapSnapshot> {
        self.get(id)
            .ok_or_else(|| GameError::UnknownMap(id.to_string()))
    }

    /// Check every map and look for duplicate ids.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self.maps.iter().flat_map(MapSnapshot::validate).collect();
        for (i, map) in self.maps.iter().enumerate() {
            if self.maps[..i].iter().any(|other| other.id == map.id) {
                errors.push(format!("Duplicate map id '{}'", map.id));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = MapCatalog::builtin();
        assert_eq!(catalog.maps.len(), 3);
        assert!(catalog.validate().is_empty());
        assert!(catalog.get("desert_siege").is_some());
        assert!(catalog.get("atlantis").is_none());
    }

    #[test]
    fn test_to_world_scales_points() {
        let catalog = MapCatalog::builtin();
        let world = catalog.get("waterloo").unwrap().to_world(3000, 2000);
        // 3000/2000 = 1.5 on x, 2000/1200 on y
        assert_eq!(world.blue_spawn.x, Fixed::from_num(390));
        assert_eq!(world.objectives.len(), 3);
        assert_eq!(world.objectives[1].0, "Front Town");
        assert_eq!(world.objectives[1].1.x, Fixed::from_num(1410));
        assert!((world.objectives[1].1.y - Fixed::from_num(900)).abs() < Fixed::from_num(0.001));
    }

    #[test]
    fn test_require_unknown_map() {
        let err = MapCatalog::builtin().require("atlantis").unwrap_err();
        assert_eq!(err.to_string(), "Unknown map: atlantis");
    }

    #[test]
    fn test_catalog_from_ron() {
        let text = r#"(
            maps: [(
                id: "tiny",
                name: "Tiny",
                width: 100,
                height: 100,
                spawn_points: (blue: (x: 10, y: 10), red: (x: 90, y: 90)),
                capture_points: [(name: "Middle", x: 50, y: 50)],
            )],
        )"#;
        let catalog = MapCatalog::from_ron_str(text).unwrap();
        assert_eq!(catalog.maps[0].capture_points[0].name, "Middle");
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let text = r#"(maps: [(id: "bad", name: "Bad", width: 10, height: 10,
            spawn_points: (blue: (x: 1, y: 1), red: (x: 50, y: 1)))])"#;
        assert!(matches!(
            MapCatalog::from_ron_str(text),
            Err(ConfigError::Invalid { field: "maps", .. })
        ));
    }
}
