//! # Portalcrawl
//!
//! Procedural room-graph dungeon layouts for 3D action games.
//!
//! ## Architecture Overview
//!
//! A map is a chain of prefabricated rooms. The generator decides which archetype goes
//! where, places each room relative to its predecessor, and wires up the connections:
//!
//! - **Catalog**: designer-authored room, portal, and doorway archetypes plus run settings
//! - **Seed Sequence**: every random choice is a reseeded draw, so one seed is one map
//! - **Placement**: doorway alignment with collision fallback, or teleport portal pairs
//! - **Topology**: a main path of battle rooms, puzzle side branches, safe-room
//!   transitions, and an optional boss room
//! - **World Host**: the engine capability boundary for spawning, collision, and hooks
//!
//! The crate ships a [`SandboxWorld`] host so layouts can be generated and inspected
//! without an engine.

pub mod events;
pub mod generation;
pub mod hud;
pub mod world;

pub use events::*;
pub use generation::*;
pub use hud::*;
pub use world::*;

/// Core error type for map generation.
#[derive(thiserror::Error, Debug)]
pub enum PortalcrawlError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Catalog content cannot drive a run
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A portal was needed but its pool is empty
    #[error("No portal archetype in the {pool} pool")]
    MissingPortalArchetype { pool: PortalPool },

    /// Every boss room spawn attempt failed
    #[error("Boss room could not be spawned after {attempts} attempts")]
    BossRoomUnavailable { attempts: u32 },

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the crate.
pub type PortalcrawlResult<T> = Result<T, PortalcrawlError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Layout constants.
pub mod config {
    use glam::Vec3;

    /// World location of the start room
    pub const START_ROOM_ANCHOR: Vec3 = Vec3::new(10000.0, 10000.0, 10000.0);

    /// Step between portal-connected rooms in the staging area
    pub const PORTAL_ROOM_OFFSET: Vec3 = Vec3::new(100000.0, 100000.0, 0.0);

    /// Distance between a portal and the connection point it guards
    pub const PORTAL_SPAWN_CLEARANCE: f32 = 100.0;

    /// Upper bound of generated seeds
    pub const MAX_SEED: u32 = 10000;

    /// Boss room spawn attempts before a run gives up
    pub const BOSS_SPAWN_ATTEMPTS: u32 = 8;

    /// Navigation volumes available to one map
    pub const DEFAULT_NAV_VOLUME_POOL_SIZE: usize = 16;
}
