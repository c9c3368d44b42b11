//! # Map Layout
//!
//! Arena-backed room graph and the per-run registries of generated entities.
//!
//! Rooms and portals live in slot maps and refer to each other by key, so the
//! predecessor/successor chain and side branches never own one another. The registries
//! record spawn order per kind, which is also the order teardown walks them in.

use super::{ActorHandle, ConnectionPoint, NavVolumeId, PointRole, Transform};
use crate::config;
use crate::generation::RoomArchetype;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::fmt;

new_key_type! {
    /// Stable key of a generated room.
    pub struct RoomId;
    /// Stable key of a generated portal.
    pub struct PortalId;
}

/// Closed taxonomy of room kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomKind {
    Start,
    Battle,
    Puzzle,
    Safe,
    Boss,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomKind::Start => "start",
            RoomKind::Battle => "battle",
            RoomKind::Puzzle => "puzzle",
            RoomKind::Safe => "safe",
            RoomKind::Boss => "boss",
        };
        f.write_str(name)
    }
}

/// Kind-specific state carried by a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomRole {
    Start,
    Battle {
        /// Attachment points for puzzle side rooms
        puzzle_points: Vec<ConnectionPoint>,
    },
    Puzzle {
        entrance_portal: Option<PortalId>,
    },
    Safe {
        /// The safe room's own portal, which leads back out to the main path
        own_portal: Option<PortalId>,
        /// Disabled entrance portals of the rooms this safe room leads to
        connected_portals: Vec<PortalId>,
    },
    Boss {
        entrance_portal: Option<PortalId>,
        prep_room_ready: bool,
    },
}

impl RoomRole {
    /// Fresh role for a room of `kind` spawned from `archetype`.
    pub fn for_kind(kind: RoomKind, archetype: &RoomArchetype) -> Self {
        match kind {
            RoomKind::Start => RoomRole::Start,
            RoomKind::Battle => RoomRole::Battle {
                puzzle_points: archetype
                    .puzzle_points
                    .iter()
                    .map(|spec| spec.to_point(PointRole::Puzzle))
                    .collect(),
            },
            RoomKind::Puzzle => RoomRole::Puzzle {
                entrance_portal: None,
            },
            RoomKind::Safe => RoomRole::Safe {
                own_portal: None,
                connected_portals: Vec::new(),
            },
            RoomKind::Boss => RoomRole::Boss {
                entrance_portal: None,
                prep_room_ready: false,
            },
        }
    }

    pub fn kind(&self) -> RoomKind {
        match self {
            RoomRole::Start => RoomKind::Start,
            RoomRole::Battle { .. } => RoomKind::Battle,
            RoomRole::Puzzle { .. } => RoomKind::Puzzle,
            RoomRole::Safe { .. } => RoomKind::Safe,
            RoomRole::Boss { .. } => RoomKind::Boss,
        }
    }
}

/// How a room was attached to its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Connection {
    /// First room of the run, placed at the fixed anchor
    Anchor,
    /// Entrance aligned onto one of the predecessor's exits
    Doorway {
        exit_label: String,
        door: Option<usize>,
    },
    /// Teleport pair between the predecessor and this room
    Portal {
        point_label: String,
        exit_portal: PortalId,
        entrance_portal: PortalId,
        /// Set when a doorway was attempted first and collided
        collision_fallback: bool,
    },
    /// Exit portal leads into a safe room; this room's entrance portal stays disabled
    SafeRoomPortal {
        point_label: String,
        exit_portal: PortalId,
        entrance_portal: PortalId,
        safe_room: RoomId,
    },
}

impl Connection {
    pub fn is_portal(&self) -> bool {
        matches!(
            self,
            Connection::Portal { .. } | Connection::SafeRoomPortal { .. }
        )
    }
}

/// A generated room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub archetype: String,
    pub handle: ActorHandle,
    pub role: RoomRole,
    pub transform: Transform,
    pub half_extents: Vec3,
    pub nav_half_extents: Option<Vec3>,
    pub minimap_texture: String,
    pub entrance: ConnectionPoint,
    pub exits: Vec<ConnectionPoint>,
    pub last_room: Option<RoomId>,
    pub next_room: Option<RoomId>,
    pub side_rooms: Vec<RoomId>,
    pub connection: Option<Connection>,
    pub nav_volume: Option<NavVolumeId>,
}

impl Room {
    /// Builds the record for a freshly spawned actor of `archetype`.
    pub fn spawned(kind: RoomKind, archetype: &RoomArchetype, handle: ActorHandle) -> Self {
        Self {
            archetype: archetype.name.clone(),
            handle,
            role: RoomRole::for_kind(kind, archetype),
            transform: Transform::identity(),
            half_extents: archetype.half_extents,
            nav_half_extents: archetype.nav_half_extents,
            minimap_texture: archetype
                .minimap_texture
                .clone()
                .unwrap_or_else(|| archetype.name.clone()),
            entrance: archetype.entrance.to_point(PointRole::Entrance),
            exits: archetype
                .exits
                .iter()
                .map(|spec| spec.to_point(PointRole::Exit))
                .collect(),
            last_room: None,
            next_room: None,
            side_rooms: Vec::new(),
            connection: None,
            nav_volume: None,
        }
    }

    pub fn kind(&self) -> RoomKind {
        self.role.kind()
    }

    pub fn entrance_world(&self) -> Transform {
        self.entrance.world(&self.transform)
    }

    /// Indices of exits that have not been consumed, in declaration order.
    pub fn available_exits(&self) -> Vec<usize> {
        self.exits
            .iter()
            .enumerate()
            .filter(|(_, point)| point.is_available())
            .map(|(index, _)| index)
            .collect()
    }

    /// Indices of unused puzzle points. Empty for anything but battle rooms.
    pub fn available_puzzle_points(&self) -> Vec<usize> {
        match &self.role {
            RoomRole::Battle { puzzle_points } => puzzle_points
                .iter()
                .enumerate()
                .filter(|(_, point)| point.is_available())
                .map(|(index, _)| index)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn puzzle_point_mut(&mut self, index: usize) -> Option<&mut ConnectionPoint> {
        match &mut self.role {
            RoomRole::Battle { puzzle_points } => puzzle_points.get_mut(index),
            _ => None,
        }
    }

    /// Returns a consumed exit to the available pool.
    pub fn release_exit(&mut self, label: &str) -> bool {
        match self.exits.iter_mut().find(|point| point.label == label) {
            Some(point) if point.consumed => {
                point.consumed = false;
                true
            }
            _ => false,
        }
    }

    pub fn nav_box(&self) -> Option<(Transform, Vec3)> {
        self.nav_half_extents
            .map(|half_extents| (self.transform, half_extents))
    }
}

/// Which end of a teleport a portal is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalSide {
    /// Sits on the predecessor room and leads away from it
    Exit,
    /// Sits on the newly placed room's entrance
    Entrance,
    /// A safe room's own way back out
    SafeRoom,
}

/// A teleport endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub archetype: String,
    pub handle: ActorHandle,
    pub side: PortalSide,
    pub transform: Transform,
    pub connected_room: Option<RoomId>,
    /// Portal whose exit point this one teleports to
    pub teleport_target: Option<PortalId>,
    pub bound_safe_room: Option<RoomId>,
    pub enabled: bool,
}

impl Portal {
    pub fn new(archetype: impl Into<String>, handle: ActorHandle, side: PortalSide, transform: Transform) -> Self {
        Self {
            archetype: archetype.into(),
            handle,
            side,
            transform,
            connected_room: None,
            teleport_target: None,
            bound_safe_room: None,
            enabled: false,
        }
    }

    /// Where travellers arrive when they teleport to this portal.
    pub fn exit_point(&self) -> Transform {
        self.transform.offset_forward(config::PORTAL_SPAWN_CLEARANCE)
    }
}

/// A doorway actor spawned between geometrically aligned rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub archetype: String,
    pub handle: ActorHandle,
    pub transform: Transform,
    pub connected_room: RoomId,
}

/// One pass through the safe-room branch of the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeRoomTransition {
    /// Battle room the transition follows
    pub after: RoomId,
    /// Safe room instance spawned for this transition, if the spawn succeeded
    pub safe_room: Option<RoomId>,
    /// Room placed through the safe-room portal, if any followed
    pub followed_by: Option<RoomId>,
}

/// Registries of everything one generation run created.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MapLayout {
    pub rooms: SlotMap<RoomId, Room>,
    pub portals: SlotMap<PortalId, Portal>,
    pub doors: Vec<Door>,
    pub start_room: Option<RoomId>,
    pub battle_rooms: Vec<RoomId>,
    pub puzzle_rooms: Vec<RoomId>,
    pub safe_rooms: Vec<RoomId>,
    pub boss_room: Option<RoomId>,
    pub portal_order: Vec<PortalId>,
    pub safe_room_transitions: Vec<SafeRoomTransition>,
    pub start_connection_point: Option<Transform>,
}

impl MapLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty() && self.portals.is_empty() && self.doors.is_empty()
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(id)
    }

    pub fn insert_room(&mut self, room: Room) -> RoomId {
        let kind = room.kind();
        let id = self.rooms.insert(room);
        match kind {
            RoomKind::Start => self.start_room = Some(id),
            RoomKind::Battle => self.battle_rooms.push(id),
            RoomKind::Puzzle => self.puzzle_rooms.push(id),
            RoomKind::Safe => self.safe_rooms.push(id),
            RoomKind::Boss => self.boss_room = Some(id),
        }
        id
    }

    pub fn insert_portal(&mut self, portal: Portal) -> PortalId {
        let id = self.portals.insert(portal);
        self.portal_order.push(id);
        id
    }

    /// Appends `room` to the main path after `last`.
    pub fn link_after(&mut self, last: RoomId, room: RoomId) {
        if let Some(previous) = self.rooms.get_mut(last) {
            previous.next_room = Some(room);
        }
        if let Some(next) = self.rooms.get_mut(room) {
            next.last_room = Some(last);
        }
    }

    /// Hangs `room` off `owner` as a side branch.
    pub fn attach_side_room(&mut self, owner: RoomId, room: RoomId) {
        if let Some(parent) = self.rooms.get_mut(owner) {
            parent.side_rooms.push(room);
        }
        if let Some(side) = self.rooms.get_mut(room) {
            side.last_room = Some(owner);
        }
    }

    /// Rooms on the main path, start room first.
    pub fn main_path(&self) -> Vec<RoomId> {
        let mut path = Vec::new();
        let mut cursor = self.start_room;
        while let Some(id) = cursor {
            if path.len() > self.rooms.len() {
                break;
            }
            path.push(id);
            cursor = self.rooms.get(id).and_then(|room| room.next_room);
        }
        path
    }

    /// Kinds along the main path, useful for comparing runs.
    pub fn main_path_kinds(&self) -> Vec<RoomKind> {
        self.main_path()
            .into_iter()
            .filter_map(|id| self.rooms.get(id).map(Room::kind))
            .collect()
    }

    pub fn count_kind(&self, kind: RoomKind) -> usize {
        self.rooms.values().filter(|room| room.kind() == kind).count()
    }

    /// Every live actor handle the layout refers to.
    pub fn actor_handles(&self) -> Vec<ActorHandle> {
        self.rooms
            .values()
            .map(|room| room.handle)
            .chain(self.portals.values().map(|portal| portal.handle))
            .chain(self.doors.iter().map(|door| door.handle))
            .collect()
    }
}
