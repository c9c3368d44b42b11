//! # Minimap Collaborator
//!
//! The generator tells the HUD where rooms and portal/doorway markers are; how the HUD
//! draws them is not its concern.

use crate::world::RoomId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// HUD panels that mirror the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapPanel {
    /// Corner minimap
    Minimap,
    /// Full-screen info map
    InfoMap,
}

pub trait MinimapSink {
    fn spawn_room_icon(&mut self, panel: MapPanel, room: RoomId, texture: &str, location: Vec3, yaw: f32);
    fn spawn_portal_icon(&mut self, panel: MapPanel, room: RoomId, location: Vec3, yaw: f32);
    fn clear_panel(&mut self, panel: MapPanel);
    fn show_hub(&mut self, panel: MapPanel);
}

/// A recorded minimap command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MinimapCommand {
    RoomIcon {
        panel: MapPanel,
        room: RoomId,
        texture: String,
        location: Vec3,
        yaw: f32,
    },
    PortalIcon {
        panel: MapPanel,
        room: RoomId,
        location: Vec3,
        yaw: f32,
    },
    Clear(MapPanel),
    Hub(MapPanel),
}

/// Sink that records every command in order.
#[derive(Debug, Default, Clone)]
pub struct MinimapLog {
    pub commands: Vec<MinimapCommand>,
}

impl MinimapLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room icons currently on `panel`, i.e. those drawn since its last clear.
    pub fn room_icons(&self, panel: MapPanel) -> usize {
        let since_clear = self
            .commands
            .iter()
            .rposition(|command| *command == MinimapCommand::Clear(panel))
            .map_or(0, |index| index + 1);
        self.commands[since_clear..]
            .iter()
            .filter(|command| matches!(command, MinimapCommand::RoomIcon { panel: p, .. } if *p == panel))
            .count()
    }

    pub fn portal_icons(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, MinimapCommand::PortalIcon { .. }))
            .count()
    }
}

impl MinimapSink for MinimapLog {
    fn spawn_room_icon(&mut self, panel: MapPanel, room: RoomId, texture: &str, location: Vec3, yaw: f32) {
        self.commands.push(MinimapCommand::RoomIcon {
            panel,
            room,
            texture: texture.to_string(),
            location,
            yaw,
        });
    }

    fn spawn_portal_icon(&mut self, panel: MapPanel, room: RoomId, location: Vec3, yaw: f32) {
        self.commands.push(MinimapCommand::PortalIcon {
            panel,
            room,
            location,
            yaw,
        });
    }

    fn clear_panel(&mut self, panel: MapPanel) {
        self.commands.push(MinimapCommand::Clear(panel));
    }

    fn show_hub(&mut self, panel: MapPanel) {
        self.commands.push(MinimapCommand::Hub(panel));
    }
}
