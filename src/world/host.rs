//! # World Host
//!
//! Capability interface supplied by the engine-integration layer.
//!
//! The generator never touches engine types. It asks the host to spawn archetypes, move
//! and destroy the resulting actors, test for blocking geometry, and fire the opaque
//! population hooks that rooms expose.

use super::Transform;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an actor owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorHandle(pub u64);

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Index into the host's pool of navigation bounds volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavVolumeId(pub usize);

/// Failure reported by the host when an actor cannot be spawned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// The archetype name does not resolve to anything spawnable
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),

    /// The host refused the spawn (collision handling, budget, ...)
    #[error("spawn of {archetype} rejected: {reason}")]
    Rejected { archetype: String, reason: String },
}

/// Room-specific behaviours the generator triggers without knowing what they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PopulationHook {
    /// Battle rooms: spawn the enemy wave
    SpawnEnemies,
    /// Battle rooms: remove whatever the enemy spawner created
    DestroyEnemies,
    /// Start, puzzle, and boss rooms: spawn their entity set
    SpawnEntities,
    /// Boss rooms: remove their entity set
    DestroyEntities,
    /// Boss rooms: prepare the antechamber
    SetUpPrepRoom,
    /// Start room: finalize the minimap once the layout is known
    FinalizeMinimap,
}

/// Engine services used by the generator.
///
/// Spawning and probing are synchronous from the generator's point of view. A failed
/// spawn is never fatal on its own; the generator logs it and treats the room or portal as
/// not placed.
pub trait WorldHost {
    /// Spawns an archetype at `transform`.
    fn spawn(&mut self, archetype: &str, transform: Transform) -> Result<ActorHandle, SpawnError>;

    /// Moves an existing actor.
    fn set_transform(&mut self, handle: ActorHandle, transform: Transform);

    /// Destroys an actor. Called exactly once per spawned actor.
    fn destroy(&mut self, handle: ActorHandle);

    /// Whether the actor would encroach on blocking geometry at `transform`.
    fn is_blocked(&self, handle: ActorHandle, transform: Transform) -> bool;

    /// Fires a population hook on a room actor.
    fn trigger(&mut self, handle: ActorHandle, hook: PopulationHook);

    /// Shows or hides the placeholder mesh that marks a connection point as a dead end.
    fn set_placeholder(&mut self, handle: ActorHandle, point_label: &str, visible: bool);

    /// Moves a pooled navigation volume over a room's walkable box.
    fn fit_nav_volume(&mut self, volume: NavVolumeId, transform: Transform, half_extents: Vec3);
}
