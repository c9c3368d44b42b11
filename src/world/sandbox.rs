//! # Sandbox World
//!
//! A self-contained [`WorldHost`] that keeps actors in memory.
//!
//! Room footprints come from the catalog, and collision is axis-aligned box overlap against
//! every other placed room and any static obstacles. Spawns are logged, and destroys and
//! hooks go into one ordered journal. The CLI generates against it, and the test suites use
//! its bookkeeping to check teardown.

use super::{Aabb, ActorHandle, NavVolumeId, PopulationHook, SpawnError, Transform, WorldHost};
use crate::generation::RoomCatalog;
use glam::Vec3;
use std::collections::{BTreeMap, HashMap, HashSet};

/// An actor living in the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxActor {
    pub archetype: String,
    pub transform: Transform,
    /// Present for room archetypes; portals and doors do not block
    pub footprint: Option<Vec3>,
}

/// A destroy or hook call, as recorded by [`SandboxWorld::journal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxEvent {
    Hook(ActorHandle, PopulationHook),
    Destroyed(ActorHandle),
}

#[derive(Debug, Default, Clone)]
pub struct SandboxWorld {
    footprints: HashMap<String, Vec3>,
    actors: BTreeMap<ActorHandle, SandboxActor>,
    next_handle: u64,
    obstacles: Vec<Aabb>,
    failing_archetypes: HashSet<String>,
    spawn_log: Vec<(ActorHandle, String)>,
    destroy_counts: HashMap<ActorHandle, u32>,
    journal: Vec<SandboxEvent>,
    placeholders: HashMap<(ActorHandle, String), bool>,
    nav_volumes: BTreeMap<NavVolumeId, (Transform, Vec3)>,
}

impl SandboxWorld {
    /// Sandbox that knows the footprints of every room in `catalog`.
    pub fn new(catalog: &RoomCatalog) -> Self {
        let footprints = catalog
            .start_rooms
            .iter()
            .chain(&catalog.battle_rooms)
            .chain(&catalog.puzzle_rooms)
            .chain(&catalog.safe_rooms)
            .chain(&catalog.boss_rooms)
            .map(|archetype| (archetype.name.clone(), archetype.half_extents))
            .collect();
        Self {
            footprints,
            next_handle: 1,
            ..Self::default()
        }
    }

    /// Adds static blocking geometry.
    pub fn add_obstacle(&mut self, bounds: Aabb) {
        self.obstacles.push(bounds);
    }

    /// Makes every spawn of `archetype` fail.
    pub fn fail_spawns_of(&mut self, archetype: impl Into<String>) {
        self.failing_archetypes.insert(archetype.into());
    }

    pub fn actor(&self, handle: ActorHandle) -> Option<&SandboxActor> {
        self.actors.get(&handle)
    }

    pub fn live_actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Every successful spawn, in order.
    pub fn spawn_log(&self) -> &[(ActorHandle, String)] {
        &self.spawn_log
    }

    /// How many times `handle` was destroyed.
    pub fn destroy_count(&self, handle: ActorHandle) -> u32 {
        self.destroy_counts.get(&handle).copied().unwrap_or(0)
    }

    pub fn total_destroy_calls(&self) -> u32 {
        self.destroy_counts.values().sum()
    }

    /// Every destroy and hook call, in the order they happened.
    pub fn journal(&self) -> &[SandboxEvent] {
        &self.journal
    }

    pub fn hook_count(&self, hook: PopulationHook) -> usize {
        self.journal
            .iter()
            .filter(|event| matches!(event, SandboxEvent::Hook(_, fired) if *fired == hook))
            .count()
    }

    pub fn placeholder_visible(&self, handle: ActorHandle, label: &str) -> Option<bool> {
        self.placeholders.get(&(handle, label.to_string())).copied()
    }

    pub fn nav_volume(&self, volume: NavVolumeId) -> Option<(Transform, Vec3)> {
        self.nav_volumes.get(&volume).copied()
    }

    fn bounds_of(&self, actor: &SandboxActor, transform: Transform) -> Option<Aabb> {
        actor
            .footprint
            .map(|half_extents| Aabb::from_half_extents(&transform, half_extents))
    }
}

impl WorldHost for SandboxWorld {
    fn spawn(&mut self, archetype: &str, transform: Transform) -> Result<ActorHandle, SpawnError> {
        if archetype.is_empty() {
            return Err(SpawnError::UnknownArchetype(archetype.to_string()));
        }
        if self.failing_archetypes.contains(archetype) {
            return Err(SpawnError::Rejected {
                archetype: archetype.to_string(),
                reason: "spawn failure injected".to_string(),
            });
        }
        let handle = ActorHandle(self.next_handle);
        self.next_handle += 1;
        self.actors.insert(
            handle,
            SandboxActor {
                archetype: archetype.to_string(),
                transform,
                footprint: self.footprints.get(archetype).copied(),
            },
        );
        self.spawn_log.push((handle, archetype.to_string()));
        Ok(handle)
    }

    fn set_transform(&mut self, handle: ActorHandle, transform: Transform) {
        if let Some(actor) = self.actors.get_mut(&handle) {
            actor.transform = transform;
        }
    }

    fn destroy(&mut self, handle: ActorHandle) {
        *self.destroy_counts.entry(handle).or_insert(0) += 1;
        self.journal.push(SandboxEvent::Destroyed(handle));
        self.actors.remove(&handle);
    }

    fn is_blocked(&self, handle: ActorHandle, transform: Transform) -> bool {
        let Some(candidate) = self
            .actors
            .get(&handle)
            .and_then(|actor| self.bounds_of(actor, transform))
        else {
            return false;
        };
        if self.obstacles.iter().any(|obstacle| obstacle.intersects(&candidate)) {
            return true;
        }
        self.actors
            .iter()
            .filter(|(other, _)| **other != handle)
            .filter_map(|(_, actor)| self.bounds_of(actor, actor.transform))
            .any(|bounds| bounds.intersects(&candidate))
    }

    fn trigger(&mut self, handle: ActorHandle, hook: PopulationHook) {
        self.journal.push(SandboxEvent::Hook(handle, hook));
    }

    fn set_placeholder(&mut self, handle: ActorHandle, point_label: &str, visible: bool) {
        self.placeholders
            .insert((handle, point_label.to_string()), visible);
    }

    fn fit_nav_volume(&mut self, volume: NavVolumeId, transform: Transform, half_extents: Vec3) {
        self.nav_volumes.insert(volume, (transform, half_extents));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_destroy_bookkeeping() {
        let catalog = RoomCatalog::sample();
        let mut world = SandboxWorld::new(&catalog);
        let room = world.spawn("barracks", Transform::identity()).unwrap();
        let portal = world.spawn("portal_stone", Transform::identity()).unwrap();
        assert_ne!(room, portal);
        assert_eq!(world.live_actor_count(), 2);
        assert!(world.actor(room).and_then(|a| a.footprint).is_some());
        assert!(world.actor(portal).and_then(|a| a.footprint).is_none());

        world.trigger(room, PopulationHook::DestroyEnemies);
        world.destroy(room);
        assert_eq!(world.destroy_count(room), 1);
        assert_eq!(world.live_actor_count(), 1);
        assert_eq!(
            world.journal(),
            &[
                SandboxEvent::Hook(room, PopulationHook::DestroyEnemies),
                SandboxEvent::Destroyed(room),
            ]
        );
    }

    #[test]
    fn test_collision_against_rooms_and_obstacles() {
        let catalog = RoomCatalog::sample();
        let mut world = SandboxWorld::new(&catalog);
        let first = world.spawn("barracks", Transform::identity()).unwrap();
        let second = world.spawn("crypt", Transform::at(Vec3::new(5000.0, 0.0, 0.0))).unwrap();

        assert!(!world.is_blocked(second, Transform::at(Vec3::new(2000.0, 0.0, 0.0))));
        assert!(world.is_blocked(second, Transform::at(Vec3::new(1500.0, 0.0, 0.0))));
        // An actor never collides with itself
        assert!(!world.is_blocked(first, Transform::identity()));

        world.add_obstacle(Aabb::new(
            Vec3::new(4000.0, -100.0, -100.0),
            Vec3::new(4200.0, 100.0, 100.0),
        ));
        assert!(world.is_blocked(second, Transform::at(Vec3::new(5000.0, 0.0, 0.0))));
    }

    #[test]
    fn test_injected_spawn_failure() {
        let catalog = RoomCatalog::sample();
        let mut world = SandboxWorld::new(&catalog);
        world.fail_spawns_of("throne");
        assert!(matches!(
            world.spawn("throne", Transform::identity()),
            Err(SpawnError::Rejected { .. })
        ));
        assert!(matches!(
            world.spawn("", Transform::identity()),
            Err(SpawnError::UnknownArchetype(_))
        ));
    }
}
