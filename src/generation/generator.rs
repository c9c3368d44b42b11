//! # Map Generator
//!
//! Drives one run from the start room to the boss room.
//!
//! The main loop walks `0..=linear_room_count`. Index 0 is the start room. Every later
//! index is either a battle room (possibly followed by a puzzle side room) or a safe-room
//! transition, which marks the next placed room for safe-room portal placement. The boss
//! room is appended on the final index.

use super::{pick, MapGenerationParams, NavVolumePool, RoomArchetype, RoomCatalog, SeedSequence};
use crate::events::{EventHub, MapEvent, MapId};
use crate::hud::MinimapSink;
use crate::world::{
    Connection, MapLayout, PopulationHook, Portal, PortalSide, RoomId, RoomKind, RoomRole, Room,
    SafeRoomTransition, Transform, WorldHost,
};
use crate::{config, PortalcrawlError, PortalcrawlResult};
use glam::Vec3;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Receiver;

/// Mutable state scoped to a single run.
#[derive(Debug, Clone)]
pub(crate) struct RunState {
    pub sequence: SeedSequence,
    /// Staging position for portal-connected rooms; only ever advances
    pub portal_cursor: Vec3,
    /// Set for exactly one iteration after a safe-room transition
    pub last_room_is_safe_room: bool,
}

impl RunState {
    pub fn new(seed: u32) -> Self {
        Self {
            sequence: SeedSequence::new(seed),
            portal_cursor: Vec3::ZERO,
            last_room_is_safe_room: false,
        }
    }
}

/// Archetype pools for one run. Unique picks drain these, never the catalog.
#[derive(Debug, Clone)]
struct RunPools {
    start: Vec<RoomArchetype>,
    battle: Vec<RoomArchetype>,
    puzzle: Vec<RoomArchetype>,
    safe: Vec<RoomArchetype>,
}

impl RunPools {
    fn from_catalog(catalog: &RoomCatalog) -> Self {
        Self {
            start: catalog.start_rooms.clone(),
            battle: catalog.battle_rooms.clone(),
            puzzle: catalog.puzzle_rooms.clone(),
            safe: catalog.safe_rooms.clone(),
        }
    }
}

/// Counts describing a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSummary {
    pub map_id: MapId,
    pub seed: u32,
    pub start_rooms: usize,
    pub battle_rooms: usize,
    pub puzzle_rooms: usize,
    pub safe_rooms: usize,
    pub boss_rooms: usize,
    pub safe_room_transitions: usize,
    pub portals: usize,
    pub doors: usize,
    pub doorway_connections: usize,
    pub portal_connections: usize,
    pub collision_fallbacks: usize,
    /// Spawned rooms left without a connection, e.g. when their portal pool is empty.
    pub unplaced_rooms: usize,
    pub draws: u32,
}

/// Room-graph generator bound to a world host and a minimap.
pub struct MapGenerator<W: WorldHost, M: MinimapSink> {
    pub(crate) catalog: RoomCatalog,
    pub(crate) world: W,
    pub(crate) minimap: M,
    pub(crate) nav_pool: NavVolumePool,
    pub(crate) events: EventHub,
    pub(crate) layout: MapLayout,
    pub(crate) map_id: MapId,
    pub(crate) run: RunState,
}

impl<W: WorldHost, M: MinimapSink> MapGenerator<W, M> {
    pub fn new(catalog: RoomCatalog, world: W, minimap: M) -> Self {
        let nav_pool = NavVolumePool::new(catalog.nav_volume_pool_size);
        Self {
            catalog,
            world,
            minimap,
            nav_pool,
            events: EventHub::new(),
            layout: MapLayout::new(),
            map_id: MapId::new(),
            run: RunState::new(0),
        }
    }

    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn minimap(&self) -> &M {
        &self.minimap
    }

    pub fn map_id(&self) -> MapId {
        self.map_id
    }

    pub fn nav_pool(&self) -> &NavVolumePool {
        &self.nav_pool
    }

    /// Entrance of the start room, the run's canonical start connection point.
    pub fn start_connection_point(&self) -> Option<Transform> {
        self.layout.start_connection_point
    }

    /// Registers a listener for generation and teardown notices.
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        self.events.subscribe()
    }

    /// Generates a map from the catalog's own settings and a fresh random seed.
    pub fn start_generation(&mut self) -> PortalcrawlResult<MapSummary> {
        let params = MapGenerationParams::from_catalog(&self.catalog, super::create_seed());
        self.generate_map(&params)
    }

    /// Lays out a complete map.
    ///
    /// An existing map is torn down first. On error the partially generated map stays
    /// registered so that [`MapGenerator::destroy_map`] can still clean it up.
    pub fn generate_map(&mut self, params: &MapGenerationParams) -> PortalcrawlResult<MapSummary> {
        if !self.layout.is_empty() {
            warn!("generating over an existing map {}; destroying it first", self.map_id);
            self.destroy_map();
        }

        self.map_id = MapId::new();
        self.run = RunState::new(params.seed);
        self.nav_pool.reset();

        let mut pools = RunPools::from_catalog(&self.catalog);
        let linear_room_count = params.linear_room_count();
        info!(
            "generating map {} (seed {}, {} battle rooms, {} linear steps)",
            self.map_id, params.seed, params.battle_room_count, linear_room_count
        );

        let mut last_room: Option<RoomId> = None;
        let mut spawned_battle_rooms = 0u32;
        let mut puzzle_spawned_this_cycle = false;

        for index in 0..=linear_room_count {
            if index == 0 {
                last_room = self.start_step(&mut pools)?;
                if linear_room_count == 0 && params.has_boss_room {
                    last_room = self.boss_step(last_room)?.or(last_room);
                }
                continue;
            }

            let enters_safe_branch = params.has_safe_rooms()
                && !self.run.last_room_is_safe_room
                && spawned_battle_rooms != 0
                && spawned_battle_rooms % params.safe_room_frequency == 0;

            if enters_safe_branch {
                self.safe_room_step(&mut pools, params, last_room);
            } else {
                spawned_battle_rooms += 1;
                let battle_room = self.battle_step(&mut pools, params, last_room)?;
                self.run.last_room_is_safe_room = false;
                if let Some(battle_room) = battle_room {
                    last_room = Some(battle_room);
                    if params.has_puzzle_rooms() {
                        if self.layout.battle_rooms.len() % params.puzzle_room_frequency as usize == 0 {
                            puzzle_spawned_this_cycle = false;
                        }
                        let has_puzzle_point = self
                            .layout
                            .room(battle_room)
                            .is_some_and(|room| !room.available_puzzle_points().is_empty());
                        if !puzzle_spawned_this_cycle
                            && has_puzzle_point
                            && self.puzzle_step(&mut pools, params, battle_room)?.is_some()
                        {
                            puzzle_spawned_this_cycle = true;
                        }
                    }
                }
            }

            if params.has_boss_room && index == linear_room_count {
                last_room = self.boss_step(last_room)?.or(last_room);
            }
        }

        if let Some(start) = self.layout.start_room.and_then(|id| self.layout.room(id)) {
            self.world.trigger(start.handle, PopulationHook::FinalizeMinimap);
        }
        self.place_placeholders_on_unused_exits();

        let summary = self.summary(params.seed);
        info!(
            "map {} generated: {} battle, {} puzzle, {} safe transitions, {} boss, {} portals, {} doors",
            summary.map_id,
            summary.battle_rooms,
            summary.puzzle_rooms,
            summary.safe_room_transitions,
            summary.boss_rooms,
            summary.portals,
            summary.doors
        );
        if summary.unplaced_rooms > 0 {
            warn!("map {} has {} unplaced rooms", summary.map_id, summary.unplaced_rooms);
        }
        self.events.publish(MapEvent::GenerationCompleted);
        Ok(summary)
    }

    fn start_step(&mut self, pools: &mut RunPools) -> PortalcrawlResult<Option<RoomId>> {
        let Some(archetype) = pick(&mut self.run.sequence, &mut pools.start, false) else {
            return Err(PortalcrawlError::GenerationFailed(
                "start room pool is empty".to_string(),
            ));
        };
        let Some(room) = self.spawn_room(RoomKind::Start, &archetype) else {
            return Err(PortalcrawlError::GenerationFailed(format!(
                "start room {} could not be spawned",
                archetype.name
            )));
        };
        self.place_room(room, false)?;
        self.trigger(room, PopulationHook::SpawnEntities);
        Ok(Some(room))
    }

    fn battle_step(
        &mut self,
        pools: &mut RunPools,
        params: &MapGenerationParams,
        last_room: Option<RoomId>,
    ) -> PortalcrawlResult<Option<RoomId>> {
        let Some(archetype) = pick(&mut self.run.sequence, &mut pools.battle, params.unique_battle_rooms) else {
            error!("battle room pool exhausted; skipping a battle room");
            return Ok(None);
        };
        let Some(room) = self.spawn_room(RoomKind::Battle, &archetype) else {
            return Ok(None);
        };
        if let Some(last) = last_room {
            self.layout.link_after(last, room);
        }
        self.place_room(room, false)?;
        self.trigger(room, PopulationHook::SpawnEnemies);
        Ok(Some(room))
    }

    fn puzzle_step(
        &mut self,
        pools: &mut RunPools,
        params: &MapGenerationParams,
        owner: RoomId,
    ) -> PortalcrawlResult<Option<RoomId>> {
        let Some(archetype) = pick(&mut self.run.sequence, &mut pools.puzzle, params.unique_puzzle_rooms) else {
            warn!("puzzle room pool exhausted; no side room for this window");
            return Ok(None);
        };
        let Some(room) = self.spawn_room(RoomKind::Puzzle, &archetype) else {
            return Ok(None);
        };
        self.layout.attach_side_room(owner, room);
        self.place_room(room, true)?;
        self.trigger(room, PopulationHook::SpawnEntities);
        Ok(Some(room))
    }

    /// Enters the safe-room branch: spawns a safe room in the staging area and flags the
    /// next placed room as a safe-room transition.
    fn safe_room_step(
        &mut self,
        pools: &mut RunPools,
        params: &MapGenerationParams,
        last_room: Option<RoomId>,
    ) {
        self.run.last_room_is_safe_room = true;
        let Some(after) = last_room else {
            warn!("safe-room transition with no preceding room");
            return;
        };
        let safe_room = self.spawn_safe_room(pools, params);
        debug!("safe-room transition after {:?} into {:?}", after, safe_room);
        self.layout.safe_room_transitions.push(SafeRoomTransition {
            after,
            safe_room,
            followed_by: None,
        });
    }

    fn spawn_safe_room(&mut self, pools: &mut RunPools, params: &MapGenerationParams) -> Option<RoomId> {
        let Some(archetype) = pick(&mut self.run.sequence, &mut pools.safe, params.unique_safe_rooms) else {
            warn!("safe room pool exhausted; transition falls back to an ordinary portal");
            return None;
        };
        let room = self.spawn_room(RoomKind::Safe, &archetype)?;

        self.run.portal_cursor += config::PORTAL_ROOM_OFFSET;
        let transform = Transform::at(self.run.portal_cursor);
        let (handle, entrance) = {
            let record = self.layout.room_mut(room)?;
            record.transform = transform;
            (record.handle, record.entrance_world())
        };
        self.world.set_transform(handle, transform);

        let portal_archetype = match self.pick_portal(super::PortalPool::SafeRoom) {
            Ok(name) => name,
            Err(err) => {
                error!("safe room {} has no portal of its own: {}", archetype.name, err);
                return Some(room);
            }
        };
        let portal_transform = entrance.offset_forward(config::PORTAL_SPAWN_CLEARANCE);
        match self.world.spawn(&portal_archetype, portal_transform) {
            Ok(portal_handle) => {
                let mut portal = Portal::new(portal_archetype, portal_handle, PortalSide::SafeRoom, portal_transform);
                portal.connected_room = Some(room);
                let portal_id = self.layout.insert_portal(portal);
                if let Some(RoomRole::Safe { own_portal, .. }) =
                    self.layout.room_mut(room).map(|record| &mut record.role)
                {
                    *own_portal = Some(portal_id);
                }
            }
            Err(err) => error!("failed to spawn safe room portal: {}", err),
        }
        Some(room)
    }

    fn boss_step(&mut self, last_room: Option<RoomId>) -> PortalcrawlResult<Option<RoomId>> {
        let mut pool = self.catalog.boss_rooms.clone();
        if pool.is_empty() {
            return Err(PortalcrawlError::BossRoomUnavailable { attempts: 0 });
        }

        for attempt in 1..=config::BOSS_SPAWN_ATTEMPTS {
            let Some(archetype) = pick(&mut self.run.sequence, &mut pool, false) else {
                break;
            };
            let Some(room) = self.spawn_room(RoomKind::Boss, &archetype) else {
                warn!("boss room spawn attempt {} failed", attempt);
                continue;
            };
            if let Some(last) = last_room {
                self.layout.link_after(last, room);
            }
            self.place_room(room, false)?;
            self.trigger(room, PopulationHook::SetUpPrepRoom);
            if let Some(RoomRole::Boss { prep_room_ready, .. }) =
                self.layout.room_mut(room).map(|record| &mut record.role)
            {
                *prep_room_ready = true;
            }
            return Ok(Some(room));
        }

        Err(PortalcrawlError::BossRoomUnavailable {
            attempts: config::BOSS_SPAWN_ATTEMPTS,
        })
    }

    /// Spawns a room actor and registers it. Spawn failures are logged and skipped.
    pub(crate) fn spawn_room(&mut self, kind: RoomKind, archetype: &RoomArchetype) -> Option<RoomId> {
        match self.world.spawn(&archetype.name, Transform::identity()) {
            Ok(handle) => {
                debug!("spawned {} room {} as {}", kind, archetype.name, handle);
                Some(self.layout.insert_room(Room::spawned(kind, archetype, handle)))
            }
            Err(err) => {
                error!("failed to spawn {} room {}: {}", kind, archetype.name, err);
                None
            }
        }
    }

    pub(crate) fn trigger(&mut self, room: RoomId, hook: PopulationHook) {
        if let Some(record) = self.layout.room(room) {
            self.world.trigger(record.handle, hook);
        }
    }

    /// Marks every unused battle-room exit as a dead end.
    fn place_placeholders_on_unused_exits(&mut self) {
        for id in self.layout.battle_rooms.clone() {
            let Some(room) = self.layout.rooms.get_mut(id) else {
                continue;
            };
            for point in room.exits.iter_mut().filter(|point| point.is_available()) {
                self.world.set_placeholder(room.handle, &point.label, true);
                point.placeholder_visible = true;
            }
        }
    }

    fn summary(&self, seed: u32) -> MapSummary {
        let connections: Vec<_> = self
            .layout
            .rooms
            .values()
            .filter_map(|room| room.connection.as_ref())
            .collect();
        MapSummary {
            map_id: self.map_id,
            seed,
            start_rooms: usize::from(self.layout.start_room.is_some()),
            battle_rooms: self.layout.battle_rooms.len(),
            puzzle_rooms: self.layout.puzzle_rooms.len(),
            safe_rooms: self.layout.safe_rooms.len(),
            boss_rooms: usize::from(self.layout.boss_room.is_some()),
            safe_room_transitions: self.layout.safe_room_transitions.len(),
            portals: self.layout.portals.len(),
            doors: self.layout.doors.len(),
            doorway_connections: connections
                .iter()
                .filter(|c| matches!(c, Connection::Doorway { .. }))
                .count(),
            portal_connections: connections.iter().filter(|c| c.is_portal()).count(),
            collision_fallbacks: connections
                .iter()
                .filter(|c| {
                    matches!(
                        c,
                        Connection::Portal {
                            collision_fallback: true,
                            ..
                        }
                    )
                })
                .count(),
            unplaced_rooms: self
                .layout
                .rooms
                .values()
                .filter(|room| room.connection.is_none() && room.kind() != RoomKind::Safe)
                .count(),
            draws: self.run.sequence.draws(),
        }
    }
}
