//! # Room Catalog
//!
//! The designer-authored room pool: archetypes per room kind, portal and doorway
//! archetypes, and the scalar knobs that shape a run.
//!
//! Catalogs are plain JSON. [`RoomCatalog::sample`] provides a small built-in catalog used
//! by the CLI when no file is given, and by the test suites.

use super::SeedSequence;
use crate::world::{ConnectionPoint, PointRole, RoomKind, Transform};
use crate::{config, PortalcrawlError, PortalcrawlResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Authored description of a connection point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
    pub label: String,
    /// Offset from the room origin
    pub offset: Vec3,
    /// Facing in degrees about +Z
    #[serde(default)]
    pub yaw: f32,
}

impl PointSpec {
    pub fn new(label: impl Into<String>, offset: Vec3, yaw: f32) -> Self {
        Self {
            label: label.into(),
            offset,
            yaw,
        }
    }

    pub fn to_point(&self, role: PointRole) -> ConnectionPoint {
        ConnectionPoint::new(self.label.clone(), role, Transform::new(self.offset, self.yaw))
    }
}

/// A placeable room blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomArchetype {
    pub name: String,
    /// Half extents of the room's blocking footprint
    pub half_extents: Vec3,
    pub entrance: PointSpec,
    #[serde(default)]
    pub exits: Vec<PointSpec>,
    /// Only meaningful for battle rooms
    #[serde(default)]
    pub puzzle_points: Vec<PointSpec>,
    /// Half extents of the walkable box covered by a navigation volume
    #[serde(default)]
    pub nav_half_extents: Option<Vec3>,
    #[serde(default)]
    pub minimap_texture: Option<String>,
}

/// Portal archetype pools, chosen by what the portal connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortalPool {
    BattleRoom,
    PuzzleRoom,
    SafeRoom,
    StartRoom,
}

impl std::fmt::Display for PortalPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PortalPool::BattleRoom => "battle_room_portals",
            PortalPool::PuzzleRoom => "puzzle_room_portals",
            PortalPool::SafeRoom => "safe_room_portals",
            PortalPool::StartRoom => "start_room_portal",
        };
        f.write_str(name)
    }
}

/// Designer-authored room container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomCatalog {
    /// Number of battle rooms on the main path
    pub map_size: u32,
    /// Battle rooms between safe-room transitions (0 disables safe rooms)
    #[serde(default)]
    pub safe_room_frequency: u32,
    /// Battle rooms per puzzle-room window (0 disables puzzle rooms)
    #[serde(default)]
    pub puzzle_room_frequency: u32,
    #[serde(default)]
    pub has_boss_room: bool,
    #[serde(default)]
    pub unique_battle_rooms: bool,
    #[serde(default)]
    pub unique_puzzle_rooms: bool,
    #[serde(default)]
    pub unique_safe_rooms: bool,

    pub start_rooms: Vec<RoomArchetype>,
    #[serde(default)]
    pub battle_rooms: Vec<RoomArchetype>,
    #[serde(default)]
    pub puzzle_rooms: Vec<RoomArchetype>,
    #[serde(default)]
    pub safe_rooms: Vec<RoomArchetype>,
    #[serde(default)]
    pub boss_rooms: Vec<RoomArchetype>,

    #[serde(default)]
    pub battle_room_portals: Vec<String>,
    #[serde(default)]
    pub puzzle_room_portals: Vec<String>,
    #[serde(default)]
    pub safe_room_portals: Vec<String>,
    #[serde(default)]
    pub start_room_portal: Option<String>,

    /// Doorway spawned between ordinary rooms
    #[serde(default)]
    pub passage_way: Option<String>,
    /// Doorway spawned when the predecessor is the start room
    #[serde(default)]
    pub start_room_passage_way: Option<String>,

    #[serde(default = "default_nav_pool_size")]
    pub nav_volume_pool_size: usize,
}

fn default_nav_pool_size() -> usize {
    config::DEFAULT_NAV_VOLUME_POOL_SIZE
}

impl RoomCatalog {
    /// Parses a catalog from JSON and validates it.
    pub fn from_json_str(json: &str) -> PortalcrawlResult<Self> {
        let catalog: RoomCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads a catalog from a JSON file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> PortalcrawlResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Writes the catalog as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> PortalcrawlResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Archetype pool for a room kind.
    pub fn rooms(&self, kind: RoomKind) -> &[RoomArchetype] {
        match kind {
            RoomKind::Start => &self.start_rooms,
            RoomKind::Battle => &self.battle_rooms,
            RoomKind::Puzzle => &self.puzzle_rooms,
            RoomKind::Safe => &self.safe_rooms,
            RoomKind::Boss => &self.boss_rooms,
        }
    }

    /// Looks up an archetype of any kind by name.
    pub fn archetype(&self, name: &str) -> Option<&RoomArchetype> {
        self.start_rooms
            .iter()
            .chain(&self.battle_rooms)
            .chain(&self.puzzle_rooms)
            .chain(&self.safe_rooms)
            .chain(&self.boss_rooms)
            .find(|archetype| archetype.name == name)
    }

    /// Portal archetypes for a pool. The start pool holds at most one entry.
    pub fn portals(&self, pool: PortalPool) -> Vec<String> {
        match pool {
            PortalPool::BattleRoom => self.battle_room_portals.clone(),
            PortalPool::PuzzleRoom => self.puzzle_room_portals.clone(),
            PortalPool::SafeRoom => self.safe_room_portals.clone(),
            PortalPool::StartRoom => self.start_room_portal.iter().cloned().collect(),
        }
    }

    /// Checks that the catalog can drive a run.
    pub fn validate(&self) -> PortalcrawlResult<()> {
        if self.start_rooms.is_empty() {
            return Err(PortalcrawlError::InvalidCatalog(
                "catalog has no start rooms".to_string(),
            ));
        }
        if self.map_size > 0 && self.battle_rooms.is_empty() {
            return Err(PortalcrawlError::InvalidCatalog(format!(
                "map size is {} but there are no battle rooms",
                self.map_size
            )));
        }
        if self.has_boss_room && self.boss_rooms.is_empty() {
            return Err(PortalcrawlError::InvalidCatalog(
                "boss room enabled but the boss pool is empty".to_string(),
            ));
        }
        for kind in [
            RoomKind::Start,
            RoomKind::Battle,
            RoomKind::Puzzle,
            RoomKind::Safe,
            RoomKind::Boss,
        ] {
            for archetype in self.rooms(kind) {
                if archetype.name.is_empty() {
                    return Err(PortalcrawlError::InvalidCatalog(format!(
                        "{} room with an empty name",
                        kind
                    )));
                }
                if archetype.entrance.label.is_empty() {
                    return Err(PortalcrawlError::InvalidCatalog(format!(
                        "room {} has no entrance",
                        archetype.name
                    )));
                }
                if archetype.half_extents.min_element() <= 0.0 {
                    return Err(PortalcrawlError::InvalidCatalog(format!(
                        "room {} has a degenerate footprint",
                        archetype.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Small catalog with one square footprint shared by every room.
    ///
    /// Rooms are 2000 units across. Entrances sit on the west wall facing east; exits
    /// sit on the east, north, and south walls facing outward; battle rooms carry two
    /// puzzle points.
    pub fn sample() -> Self {
        let half = Vec3::new(1000.0, 1000.0, 300.0);
        let entrance = PointSpec::new("west", Vec3::new(-1000.0, 0.0, 0.0), 0.0);
        let exits = vec![
            PointSpec::new("east", Vec3::new(1000.0, 0.0, 0.0), 0.0),
            PointSpec::new("north", Vec3::new(0.0, 1000.0, 0.0), 90.0),
            PointSpec::new("south", Vec3::new(0.0, -1000.0, 0.0), -90.0),
        ];
        let puzzle_points = vec![
            PointSpec::new("alcove_north", Vec3::new(500.0, 900.0, 0.0), 90.0),
            PointSpec::new("alcove_south", Vec3::new(500.0, -900.0, 0.0), -90.0),
        ];
        let room = |name: &str, exits: Vec<PointSpec>, puzzle: Vec<PointSpec>, nav: bool| {
            RoomArchetype {
                name: name.to_string(),
                half_extents: half,
                entrance: entrance.clone(),
                exits,
                puzzle_points: puzzle,
                nav_half_extents: nav.then(|| Vec3::new(900.0, 900.0, 300.0)),
                minimap_texture: Some(format!("{}_icon", name)),
            }
        };

        Self {
            map_size: 5,
            safe_room_frequency: 0,
            puzzle_room_frequency: 0,
            has_boss_room: false,
            unique_battle_rooms: false,
            unique_puzzle_rooms: false,
            unique_safe_rooms: false,
            start_rooms: vec![room("courtyard", exits.clone(), Vec::new(), false)],
            battle_rooms: vec![
                room("barracks", exits.clone(), puzzle_points.clone(), true),
                room("crypt", exits.clone(), puzzle_points.clone(), true),
                room("armory", exits.clone(), puzzle_points.clone(), true),
                room("catacomb", exits.clone(), puzzle_points.clone(), true),
                room("forge", exits.clone(), puzzle_points, true),
            ],
            puzzle_rooms: vec![
                room("mirror_hall", Vec::new(), Vec::new(), false),
                room("lever_vault", Vec::new(), Vec::new(), false),
                room("rune_gallery", Vec::new(), Vec::new(), false),
            ],
            safe_rooms: vec![
                room("campfire", Vec::new(), Vec::new(), false),
                room("shrine", Vec::new(), Vec::new(), false),
            ],
            boss_rooms: vec![room("throne", Vec::new(), Vec::new(), true)],
            battle_room_portals: vec!["portal_stone".to_string(), "portal_iron".to_string()],
            puzzle_room_portals: vec!["portal_riddle".to_string()],
            safe_room_portals: vec!["portal_hearth".to_string()],
            start_room_portal: Some("portal_start".to_string()),
            passage_way: Some("door_wood".to_string()),
            start_room_passage_way: Some("door_gate".to_string()),
            nav_volume_pool_size: config::DEFAULT_NAV_VOLUME_POOL_SIZE,
        }
    }
}

/// Picks one entry from `pool` with a single draw.
///
/// With `remove_on_pick` the entry is taken out of the pool so later picks in the same run
/// cannot repeat it. Empty and one-entry pools do not draw.
pub fn pick<T: Clone>(sequence: &mut SeedSequence, pool: &mut Vec<T>, remove_on_pick: bool) -> Option<T> {
    let index = sequence.index(pool.len())?;
    if remove_on_pick {
        Some(pool.remove(index))
    } else {
        pool.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_catalog_is_valid() {
        let catalog = RoomCatalog::sample();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.rooms(RoomKind::Battle).len(), 5);
        assert!(catalog.archetype("throne").is_some());
        assert!(catalog.archetype("nowhere").is_none());
        assert_eq!(catalog.portals(PortalPool::StartRoom), vec!["portal_start".to_string()]);
    }

    #[test]
    fn test_validation_rejects_missing_start_rooms() {
        let mut catalog = RoomCatalog::sample();
        catalog.start_rooms.clear();
        assert!(matches!(
            catalog.validate(),
            Err(PortalcrawlError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_validation_rejects_boss_without_pool() {
        let mut catalog = RoomCatalog::sample();
        catalog.has_boss_room = true;
        catalog.boss_rooms.clear();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_degenerate_footprint() {
        let mut catalog = RoomCatalog::sample();
        catalog.battle_rooms[0].half_extents = Vec3::new(0.0, 10.0, 10.0);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_catalog() {
        let catalog = RoomCatalog::sample();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed = RoomCatalog::from_json_str(&json).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "map_size": 0,
            "start_rooms": [{
                "name": "hall",
                "half_extents": [10.0, 10.0, 5.0],
                "entrance": { "label": "in", "offset": [-10.0, 0.0, 0.0] }
            }]
        }"#;
        let catalog = RoomCatalog::from_json_str(json).unwrap();
        assert!(!catalog.has_boss_room);
        assert_eq!(catalog.safe_room_frequency, 0);
        assert_eq!(catalog.nav_volume_pool_size, config::DEFAULT_NAV_VOLUME_POOL_SIZE);
        assert!(catalog.start_rooms[0].exits.is_empty());
    }

    #[test]
    fn test_pick_without_removal_keeps_pool() {
        let mut sequence = SeedSequence::new(5);
        let mut pool = vec!["a", "b", "c"];
        let picked = pick(&mut sequence, &mut pool, false);
        assert!(picked.is_some());
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_pick_with_removal_never_repeats() {
        let mut sequence = SeedSequence::new(77);
        let mut pool = vec![1, 2, 3, 4, 5];
        let mut seen = HashSet::new();
        while let Some(value) = pick(&mut sequence, &mut pool, true) {
            assert!(seen.insert(value));
        }
        assert_eq!(seen.len(), 5);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pick_from_empty_pool() {
        let mut sequence = SeedSequence::new(5);
        let mut pool: Vec<u8> = Vec::new();
        assert_eq!(pick(&mut sequence, &mut pool, true), None);
        assert_eq!(sequence.draws(), 0);
    }
}
