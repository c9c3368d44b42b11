//! # Room Placement
//!
//! Positions a freshly spawned room relative to its predecessor.
//!
//! There are three ways a room gets placed:
//!
//! - **Anchor**: the start room goes to a fixed far-away anchor and publishes its entrance
//!   as the run's start connection point.
//! - **Doorway**: the room is turned and moved so its entrance sits exactly on one of the
//!   predecessor's exits, then checked for collisions. A collision hands the exit back and
//!   re-places the room through a portal instead.
//! - **Portal**: the room is parked in the staging area and joined to the predecessor by a
//!   pair of teleport portals.

use super::{pick, PortalPool};
use crate::hud::{MapPanel, MinimapSink};
use crate::world::{
    shortest_arc_yaw, Connection, Door, PointRole, Portal, PortalId, PortalSide, RoomId,
    RoomKind, RoomRole, Transform, WorldHost,
};
use crate::{config, PortalcrawlError, PortalcrawlResult};
use log::{debug, error, trace};

use super::MapGenerator;

/// Outcome of placing one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Anchored,
    Doorway,
    Portal,
    /// No usable connection point on the predecessor
    NotPlaced,
}

/// Exits facing further back than this against the start direction are avoided.
const BACKTRACK_DOT_LIMIT: f32 = -0.5;

impl<W: WorldHost, M: MinimapSink> MapGenerator<W, M> {
    /// Places `room_id` relative to its `last_room`.
    ///
    /// Rooms without a predecessor are anchored. A pending safe-room transition forces
    /// portal placement regardless of `connect_with_portal`.
    pub(crate) fn place_room(&mut self, room_id: RoomId, connect_with_portal: bool) -> PortalcrawlResult<Placement> {
        let connect_with_portal = connect_with_portal || self.run.last_room_is_safe_room;
        let Some(predecessor) = self.layout.room(room_id).map(|room| room.last_room) else {
            return Ok(Placement::NotPlaced);
        };

        let placement = match predecessor {
            None => return Ok(self.place_at_anchor(room_id)),
            Some(previous) if connect_with_portal => self.place_with_portal(room_id, previous, false)?,
            Some(previous) => self.place_with_doorway(room_id, previous)?,
        };

        match placement {
            Placement::NotPlaced => debug!("room {:?} could not be placed", room_id),
            _ => self.register_placed(room_id),
        }
        Ok(placement)
    }

    fn place_at_anchor(&mut self, room_id: RoomId) -> Placement {
        let transform = Transform::at(config::START_ROOM_ANCHOR);
        let Some(room) = self.layout.rooms.get_mut(room_id) else {
            return Placement::NotPlaced;
        };
        room.transform = transform;
        room.connection = Some(Connection::Anchor);
        self.world.set_transform(room.handle, transform);
        self.layout.start_connection_point = Some(room.entrance_world());

        for panel in [MapPanel::Minimap, MapPanel::InfoMap] {
            self.minimap
                .spawn_room_icon(panel, room_id, &room.minimap_texture, transform.location, transform.yaw);
        }
        debug!("anchored {} at {}", room.archetype, transform.location);
        Placement::Anchored
    }

    /// Aligns the room's entrance onto one of the predecessor's exits.
    fn place_with_doorway(&mut self, room_id: RoomId, previous: RoomId) -> PortalcrawlResult<Placement> {
        let Some(exit_index) = self.take_exit_point(previous, true) else {
            debug!("no free exit on {:?} for a doorway", previous);
            return Ok(Placement::NotPlaced);
        };
        let Some(predecessor) = self.layout.room(previous) else {
            return Ok(Placement::NotPlaced);
        };
        let previous_kind = predecessor.kind();
        let previous_handle = predecessor.handle;
        let exit_label = predecessor.exits[exit_index].label.clone();
        let exit_world = predecessor.exits[exit_index].world(&predecessor.transform);

        let Some(room) = self.layout.rooms.get_mut(room_id) else {
            return Ok(Placement::NotPlaced);
        };
        let yaw_delta = shortest_arc_yaw(exit_world.forward(), room.entrance_world().forward());
        let mut transform = Transform::new(room.transform.location, room.transform.yaw - yaw_delta);
        let entrance_after_turn = room.entrance.world(&transform);
        transform.location += exit_world.location - entrance_after_turn.location;
        room.transform = transform;
        let handle = room.handle;
        self.world.set_transform(handle, transform);

        if self.world.is_blocked(handle, transform) {
            debug!(
                "{} collides at {} off exit {}; connecting through a portal",
                room.archetype, transform.location, exit_label
            );
            if let Some(predecessor) = self.layout.rooms.get_mut(previous) {
                predecessor.release_exit(&exit_label);
            }
            return self.place_with_portal(room_id, previous, true);
        }

        room.entrance.consumed = true;
        let entrance = room.entrance_world();
        if let Some(predecessor) = self.layout.rooms.get_mut(previous) {
            predecessor.exits[exit_index].placeholder_visible = false;
        }
        self.world.set_placeholder(previous_handle, &exit_label, false);
        self.minimap.spawn_portal_icon(
            MapPanel::Minimap,
            previous,
            exit_world.location,
            exit_world.yaw,
        );

        let door_archetype = match previous_kind {
            RoomKind::Start => self.catalog.start_room_passage_way.clone(),
            _ => self.catalog.passage_way.clone(),
        };
        let door = match door_archetype {
            Some(archetype) => match self.world.spawn(&archetype, entrance) {
                Ok(door_handle) => {
                    self.layout.doors.push(Door {
                        archetype,
                        handle: door_handle,
                        transform: entrance,
                        connected_room: previous,
                    });
                    Some(self.layout.doors.len() - 1)
                }
                Err(err) => {
                    error!("failed to spawn doorway: {}", err);
                    None
                }
            },
            None => {
                error!("no passage way archetype configured for a {} predecessor", previous_kind);
                None
            }
        };

        if let Some(room) = self.layout.rooms.get_mut(room_id) {
            room.connection = Some(Connection::Doorway { exit_label, door });
        }
        trace!("doorway placement of {:?} at {}", room_id, transform.location);
        Ok(Placement::Doorway)
    }

    /// Parks the room in the staging area and joins it to the predecessor with portals.
    fn place_with_portal(
        &mut self,
        room_id: RoomId,
        previous: RoomId,
        collision_fallback: bool,
    ) -> PortalcrawlResult<Placement> {
        let safe_transition = self.run.last_room_is_safe_room;
        let Some(room_kind) = self.layout.room(room_id).map(|room| room.kind()) else {
            return Ok(Placement::NotPlaced);
        };
        let Some(previous_kind) = self.layout.room(previous).map(|room| room.kind()) else {
            return Ok(Placement::NotPlaced);
        };

        // Every applicable stage draws; later stages override the archetype.
        let mut chosen = None;
        let mut drawn = None;
        if room_kind == RoomKind::Puzzle {
            chosen = self
                .take_puzzle_point(previous)
                .map(|index| (PointRole::Puzzle, index));
            drawn = Some(self.pick_portal(PortalPool::PuzzleRoom));
        }
        if chosen.is_none() {
            chosen = self
                .take_exit_point(previous, false)
                .map(|index| (PointRole::Exit, index));
            drawn = Some(self.pick_portal(PortalPool::BattleRoom));
        }
        if safe_transition {
            drawn = Some(self.pick_portal(PortalPool::SafeRoom));
        }
        if previous_kind == RoomKind::Start {
            drawn = Some(self.pick_portal(PortalPool::StartRoom));
        }
        let Some((point_role, point_index)) = chosen else {
            debug!("no free connection point on {:?} for a portal", previous);
            return Ok(Placement::NotPlaced);
        };

        let portal_archetype = match drawn {
            Some(Ok(archetype)) => archetype,
            Some(Err(err)) => {
                error!("{}; {:?} stays unplaced", err, room_id);
                self.release_point(previous, point_role, point_index);
                return Ok(Placement::NotPlaced);
            }
            None => {
                self.release_point(previous, point_role, point_index);
                return Ok(Placement::NotPlaced);
            }
        };

        self.run.portal_cursor += config::PORTAL_ROOM_OFFSET;
        let Some(room) = self.layout.rooms.get_mut(room_id) else {
            return Ok(Placement::NotPlaced);
        };
        room.transform = Transform::new(self.run.portal_cursor, room.transform.yaw);
        let room_handle = room.handle;
        let room_transform = room.transform;
        let entrance_label = room.entrance.label.clone();
        room.entrance.consumed = true;
        let entrance_world = room.entrance_world();
        self.world.set_transform(room_handle, room_transform);

        let Some(predecessor) = self.layout.room(previous) else {
            return Ok(Placement::NotPlaced);
        };
        let previous_handle = predecessor.handle;
        let point = match point_role {
            PointRole::Puzzle => match &predecessor.role {
                RoomRole::Battle { puzzle_points } => puzzle_points.get(point_index).cloned(),
                _ => None,
            },
            _ => predecessor.exits.get(point_index).cloned(),
        };
        let Some(point) = point else {
            return Ok(Placement::NotPlaced);
        };
        let point_world = point.world(&predecessor.transform);

        let exit_transform = point_world
            .offset_forward(-config::PORTAL_SPAWN_CLEARANCE)
            .turned(180.0);
        let exit_handle = match self.world.spawn(&portal_archetype, exit_transform) {
            Ok(handle) => handle,
            Err(err) => {
                error!("failed to spawn exit portal {}: {}", portal_archetype, err);
                self.release_point(previous, point_role, point_index);
                return Ok(Placement::NotPlaced);
            }
        };
        let entrance_transform = entrance_world.offset_forward(config::PORTAL_SPAWN_CLEARANCE);
        let entrance_handle = match self.world.spawn(&portal_archetype, entrance_transform) {
            Ok(handle) => handle,
            Err(err) => {
                error!("failed to spawn entrance portal {}: {}", portal_archetype, err);
                self.world.destroy(exit_handle);
                self.release_point(previous, point_role, point_index);
                return Ok(Placement::NotPlaced);
            }
        };

        let mut exit_portal = Portal::new(portal_archetype.clone(), exit_handle, PortalSide::Exit, exit_transform);
        exit_portal.connected_room = Some(previous);
        let mut entrance_portal =
            Portal::new(portal_archetype, entrance_handle, PortalSide::Entrance, entrance_transform);
        entrance_portal.connected_room = Some(room_id);
        let exit_id = self.layout.insert_portal(exit_portal);
        let entrance_id = self.layout.insert_portal(entrance_portal);

        self.minimap.spawn_portal_icon(
            MapPanel::Minimap,
            previous,
            point_world.location,
            exit_transform.yaw,
        );

        let safe_room = if safe_transition {
            self.bind_safe_room(exit_id, entrance_id)
        } else {
            None
        };
        let connection = match safe_room {
            Some(safe_room) => {
                self.world.set_placeholder(previous_handle, &point.label, true);
                self.world.set_placeholder(room_handle, &entrance_label, true);
                self.mark_placeholder(previous, point_role, point_index);
                if let Some(room) = self.layout.rooms.get_mut(room_id) {
                    room.entrance.placeholder_visible = true;
                }
                if let Some(transition) = self.layout.safe_room_transitions.last_mut() {
                    transition.followed_by = Some(room_id);
                }
                Connection::SafeRoomPortal {
                    point_label: point.label.clone(),
                    exit_portal: exit_id,
                    entrance_portal: entrance_id,
                    safe_room,
                }
            }
            None => {
                self.link_portal_pair(exit_id, entrance_id);
                Connection::Portal {
                    point_label: point.label.clone(),
                    exit_portal: exit_id,
                    entrance_portal: entrance_id,
                    collision_fallback,
                }
            }
        };

        if let Some(room) = self.layout.rooms.get_mut(room_id) {
            match &mut room.role {
                RoomRole::Puzzle { entrance_portal } | RoomRole::Boss { entrance_portal, .. } => {
                    *entrance_portal = Some(entrance_id);
                }
                RoomRole::Start | RoomRole::Battle { .. } | RoomRole::Safe { .. } => {}
            }
            room.connection = Some(connection);
        }
        trace!(
            "portal placement of {:?} at {} via {}",
            room_id,
            room_transform.location,
            point.label
        );
        Ok(Placement::Portal)
    }

    /// Mutually targets an exit/entrance pair, then enables both.
    fn link_portal_pair(&mut self, exit_id: PortalId, entrance_id: PortalId) {
        if let Some(exit) = self.layout.portals.get_mut(exit_id) {
            exit.teleport_target = Some(entrance_id);
        }
        if let Some(entrance) = self.layout.portals.get_mut(entrance_id) {
            entrance.teleport_target = Some(exit_id);
        }
        for id in [exit_id, entrance_id] {
            if let Some(portal) = self.layout.portals.get_mut(id) {
                portal.enabled = true;
            }
        }
    }

    /// Sends the exit portal into a random safe room instead of the new room.
    ///
    /// The new room's entrance portal stays disabled and is recorded on the safe room,
    /// whose own portal leads on to it. Returns `None` when there is no safe room to bind.
    fn bind_safe_room(&mut self, exit_id: PortalId, entrance_id: PortalId) -> Option<RoomId> {
        let index = self.run.sequence.index(self.layout.safe_rooms.len());
        let Some(safe_room) = index.and_then(|index| self.layout.safe_rooms.get(index).copied()) else {
            error!("safe-room transition without a safe room; linking the portals directly");
            return None;
        };

        let own_portal = match self.layout.room_mut(safe_room).map(|room| &mut room.role) {
            Some(RoomRole::Safe {
                own_portal,
                connected_portals,
            }) => {
                connected_portals.push(entrance_id);
                *own_portal
            }
            _ => None,
        };

        if let Some(own) = own_portal.and_then(|id| self.layout.portals.get_mut(id)) {
            own.teleport_target = Some(entrance_id);
            own.enabled = true;
        }
        if let Some(entrance) = self.layout.portals.get_mut(entrance_id) {
            entrance.enabled = false;
        }
        if let Some(exit) = self.layout.portals.get_mut(exit_id) {
            exit.bound_safe_room = Some(safe_room);
            exit.teleport_target = own_portal;
            exit.enabled = own_portal.is_some();
        }
        Some(safe_room)
    }

    /// Hands a consumed connection point back after a failed placement.
    fn release_point(&mut self, room_id: RoomId, role: PointRole, index: usize) {
        let Some(room) = self.layout.rooms.get_mut(room_id) else {
            return;
        };
        let point = match role {
            PointRole::Puzzle => room.puzzle_point_mut(index),
            _ => room.exits.get_mut(index),
        };
        if let Some(point) = point {
            point.consumed = false;
        }
    }

    fn mark_placeholder(&mut self, room_id: RoomId, role: PointRole, index: usize) {
        let Some(room) = self.layout.rooms.get_mut(room_id) else {
            return;
        };
        let point = match role {
            PointRole::Puzzle => room.puzzle_point_mut(index),
            PointRole::Exit => room.exits.get_mut(index),
            PointRole::Entrance => Some(&mut room.entrance),
        };
        if let Some(point) = point {
            point.placeholder_visible = true;
        }
    }

    /// Draws and consumes an available exit on `room_id`.
    ///
    /// With `prefer_forward`, exits that point back against the start direction are only
    /// used when nothing else is free.
    pub(crate) fn take_exit_point(&mut self, room_id: RoomId, prefer_forward: bool) -> Option<usize> {
        let room = self.layout.room(room_id)?;
        let available = room.available_exits();
        let candidates = match (prefer_forward, self.layout.start_connection_point) {
            (true, Some(start)) => {
                let start_forward = start.forward();
                let forward: Vec<usize> = available
                    .iter()
                    .copied()
                    .filter(|&index| {
                        room.exits[index].world(&room.transform).forward().dot(start_forward)
                            > BACKTRACK_DOT_LIMIT
                    })
                    .collect();
                if forward.is_empty() {
                    available
                } else {
                    forward
                }
            }
            _ => available,
        };

        let picked = candidates[self.run.sequence.index(candidates.len())?];
        let room = self.layout.room_mut(room_id)?;
        room.exits[picked].consumed = true;
        Some(picked)
    }

    /// Draws and consumes an available puzzle point on `room_id`.
    pub(crate) fn take_puzzle_point(&mut self, room_id: RoomId) -> Option<usize> {
        let available = self.layout.room(room_id)?.available_puzzle_points();
        let picked = available[self.run.sequence.index(available.len())?];
        let point = self.layout.room_mut(room_id)?.puzzle_point_mut(picked)?;
        point.consumed = true;
        Some(picked)
    }

    /// Draws a portal archetype from `pool`. An empty pool is a content error.
    pub(crate) fn pick_portal(&mut self, pool: PortalPool) -> PortalcrawlResult<String> {
        let mut entries = self.catalog.portals(pool);
        pick(&mut self.run.sequence, &mut entries, false)
            .ok_or(PortalcrawlError::MissingPortalArchetype { pool })
    }

    /// Minimap icon and navigation volume for a room that has just been placed.
    fn register_placed(&mut self, room_id: RoomId) {
        let Some(room) = self.layout.rooms.get_mut(room_id) else {
            return;
        };
        self.minimap.spawn_room_icon(
            MapPanel::Minimap,
            room_id,
            &room.minimap_texture,
            room.transform.location,
            room.transform.yaw,
        );

        if !matches!(room.kind(), RoomKind::Battle | RoomKind::Boss) {
            return;
        }
        let Some((transform, half_extents)) = room.nav_box() else {
            return;
        };
        if let Some(volume) = self.nav_pool.claim() {
            self.world.fit_nav_volume(volume, transform, half_extents);
            room.nav_volume = Some(volume);
        }
    }
}
