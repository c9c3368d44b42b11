//! # Generation Module
//!
//! Room-graph dungeon generation: deterministic draws, archetype picking, room placement,
//! topology, and teardown.
//!
//! A run starts from a [`RoomCatalog`] and a set of [`MapGenerationParams`]. The
//! [`MapGenerator`] lays out a start room, a chain of battle rooms with puzzle side
//! branches and safe-room transitions, and an optional boss room at the end. Every random
//! choice comes from a [`SeedSequence`], so the same catalog and seed always reproduce the
//! same map.

pub mod catalog;
pub mod generator;
pub mod navmesh;
pub mod placement;
pub mod rng;
pub mod teardown;

pub use catalog::*;
pub use generator::*;
pub use navmesh::*;
pub use placement::*;
pub use rng::*;

use crate::config;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Parameters for one generation run.
///
/// Built once per run, usually from a catalog plus a seed, and never changed while the run
/// is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapGenerationParams {
    /// Battle rooms on the main path
    pub battle_room_count: u32,
    /// Battle rooms between safe-room transitions (0 disables safe rooms)
    pub safe_room_frequency: u32,
    /// Battle rooms per puzzle window (0 disables puzzle rooms)
    pub puzzle_room_frequency: u32,
    pub has_boss_room: bool,
    pub unique_battle_rooms: bool,
    pub unique_puzzle_rooms: bool,
    pub unique_safe_rooms: bool,
    /// Seed of the draw sequence
    pub seed: u32,
}

impl MapGenerationParams {
    /// Plain main path with no branches and no boss.
    ///
    /// # Examples
    ///
    /// ```
    /// use portalcrawl::MapGenerationParams;
    ///
    /// let params = MapGenerationParams::new(5, 0, 0, 42);
    /// assert_eq!(params.linear_room_count(), 5);
    /// assert!(!params.has_safe_rooms());
    /// ```
    pub fn new(
        battle_room_count: u32,
        safe_room_frequency: u32,
        puzzle_room_frequency: u32,
        seed: u32,
    ) -> Self {
        Self {
            battle_room_count,
            safe_room_frequency,
            puzzle_room_frequency,
            has_boss_room: false,
            unique_battle_rooms: false,
            unique_puzzle_rooms: false,
            unique_safe_rooms: false,
            seed,
        }
    }

    /// Reads the scalar knobs of a catalog.
    pub fn from_catalog(catalog: &RoomCatalog, seed: u32) -> Self {
        Self {
            battle_room_count: catalog.map_size,
            safe_room_frequency: catalog.safe_room_frequency,
            puzzle_room_frequency: catalog.puzzle_room_frequency,
            has_boss_room: catalog.has_boss_room,
            unique_battle_rooms: catalog.unique_battle_rooms,
            unique_puzzle_rooms: catalog.unique_puzzle_rooms,
            unique_safe_rooms: catalog.unique_safe_rooms,
            seed,
        }
    }

    /// Small run that exercises every branch.
    pub fn for_testing(seed: u32) -> Self {
        Self {
            battle_room_count: 4,
            safe_room_frequency: 2,
            puzzle_room_frequency: 2,
            has_boss_room: true,
            unique_battle_rooms: true,
            unique_puzzle_rooms: false,
            unique_safe_rooms: false,
            seed,
        }
    }

    pub fn with_boss_room(mut self, has_boss_room: bool) -> Self {
        self.has_boss_room = has_boss_room;
        self
    }

    pub fn has_safe_rooms(&self) -> bool {
        self.safe_room_frequency > 0
    }

    pub fn has_puzzle_rooms(&self) -> bool {
        self.puzzle_room_frequency > 0
    }

    /// Number of main-path steps after the start room, saturating at `u32::MAX`.
    pub fn linear_room_count(&self) -> u32 {
        let safe_transitions = if self.has_safe_rooms() {
            self.battle_room_count / self.safe_room_frequency
        } else {
            0
        };
        self.battle_room_count.saturating_add(safe_transitions)
    }

    /// Expected number of safe-room transitions in a run.
    pub fn expected_safe_transitions(&self) -> u32 {
        self.linear_room_count() - self.battle_room_count
    }
}

impl Default for MapGenerationParams {
    fn default() -> Self {
        Self::new(5, 0, 0, 42)
    }
}

/// Fresh random seed in `[0, MAX_SEED]`.
pub fn create_seed() -> u32 {
    rand::thread_rng().gen_range(0..=config::MAX_SEED)
}
