//! Map teardown.

use super::MapGenerator;
use crate::events::MapEvent;
use crate::hud::{MapPanel, MinimapSink};
use crate::world::{MapLayout, PopulationHook, RoomRole, WorldHost};
use log::{debug, info};

impl<W: WorldHost, M: MinimapSink> MapGenerator<W, M> {
    /// Destroys every entity of the current map and resets the generator for a new run.
    ///
    /// Listeners get the destroying-map notice while everything is still alive. Each room,
    /// portal, and door is destroyed exactly once, and all registries are empty afterwards.
    pub fn destroy_map(&mut self) {
        self.events.publish(MapEvent::destroying(self.map_id));
        let mut layout = std::mem::take(&mut self.layout);
        debug!(
            "destroying map {}: {} rooms, {} portals, {} doors",
            self.map_id,
            layout.rooms.len(),
            layout.portals.len(),
            layout.doors.len()
        );

        let boss_entrance = layout
            .boss_room
            .and_then(|id| layout.room(id))
            .and_then(|room| match room.role {
                RoomRole::Boss { entrance_portal, .. } => entrance_portal,
                _ => None,
            });

        // Enemies go first on every battle room before any room is destroyed.
        let battle_rooms = std::mem::take(&mut layout.battle_rooms);
        for id in &battle_rooms {
            if let Some(room) = layout.room(*id) {
                self.world.trigger(room.handle, PopulationHook::DestroyEnemies);
            }
        }
        for id in battle_rooms {
            if let Some(room) = layout.rooms.remove(id) {
                self.world.destroy(room.handle);
            }
        }

        for id in std::mem::take(&mut layout.portal_order) {
            if Some(id) == boss_entrance {
                continue;
            }
            if let Some(portal) = layout.portals.remove(id) {
                self.world.destroy(portal.handle);
            }
        }

        for id in std::mem::take(&mut layout.puzzle_rooms)
            .into_iter()
            .chain(std::mem::take(&mut layout.safe_rooms))
        {
            if let Some(room) = layout.rooms.remove(id) {
                self.world.destroy(room.handle);
            }
        }

        for door in layout.doors.drain(..) {
            self.world.destroy(door.handle);
        }

        if let Some(room) = layout.boss_room.take().and_then(|id| layout.rooms.remove(id)) {
            self.world.trigger(room.handle, PopulationHook::DestroyEntities);
            if let Some(portal) = boss_entrance.and_then(|id| layout.portals.remove(id)) {
                self.world.destroy(portal.handle);
            }
            self.world.destroy(room.handle);
        }

        if let Some(room) = layout.start_room.take().and_then(|id| layout.rooms.remove(id)) {
            self.world.destroy(room.handle);
        }

        // Anything left was registered without a kind list, e.g. a portal orphaned by a
        // failed boss spawn.
        for (_, portal) in layout.portals.drain() {
            self.world.destroy(portal.handle);
        }
        for (_, room) in layout.rooms.drain() {
            self.world.destroy(room.handle);
        }

        let panels = [MapPanel::Minimap, MapPanel::InfoMap];
        for panel in panels {
            self.minimap.clear_panel(panel);
        }
        for panel in panels {
            self.minimap.show_hub(panel);
        }
        self.nav_pool.reset();
        self.layout = MapLayout::new();
        info!("map {} destroyed", self.map_id);
    }
}
