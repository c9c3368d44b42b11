//! Integration tests for tearing generated maps down.

use glam::Vec3;
use portalcrawl::{
    ActorHandle, MapGenerationParams, MapGenerator, MapLayout, MapPanel, MinimapCommand,
    MinimapLog, MinimapSink, NavVolumeId, PopulationHook, RoomCatalog, RoomId, RoomRole,
    SandboxEvent, SandboxWorld, SpawnError, Transform, WorldHost,
};
use std::cell::RefCell;
use std::rc::Rc;

fn generated(params: &MapGenerationParams) -> MapGenerator<SandboxWorld, MinimapLog> {
    let catalog = RoomCatalog::sample();
    let world = SandboxWorld::new(&catalog);
    let mut gen = MapGenerator::new(catalog, world, MinimapLog::new());
    gen.generate_map(params).expect("generation failed");
    gen
}

/// The destroy and hook calls `destroy_map` should make for `layout`, in order.
fn expected_teardown(layout: &MapLayout) -> Vec<SandboxEvent> {
    let handle = |id: &RoomId| layout.room(*id).unwrap().handle;
    let boss_entrance = layout
        .boss_room
        .and_then(|id| match &layout.room(id).unwrap().role {
            RoomRole::Boss { entrance_portal, .. } => *entrance_portal,
            _ => None,
        });

    let mut expected: Vec<SandboxEvent> = layout
        .battle_rooms
        .iter()
        .map(|id| SandboxEvent::Hook(handle(id), PopulationHook::DestroyEnemies))
        .collect();
    expected.extend(layout.battle_rooms.iter().map(|id| SandboxEvent::Destroyed(handle(id))));
    expected.extend(
        layout
            .portal_order
            .iter()
            .filter(|id| Some(**id) != boss_entrance)
            .map(|id| SandboxEvent::Destroyed(layout.portal(*id).unwrap().handle)),
    );
    expected.extend(
        layout
            .puzzle_rooms
            .iter()
            .chain(&layout.safe_rooms)
            .map(|id| SandboxEvent::Destroyed(handle(id))),
    );
    expected.extend(layout.doors.iter().map(|door| SandboxEvent::Destroyed(door.handle)));
    if let Some(boss) = &layout.boss_room {
        expected.push(SandboxEvent::Hook(handle(boss), PopulationHook::DestroyEntities));
        if let Some(portal) = boss_entrance {
            expected.push(SandboxEvent::Destroyed(layout.portal(portal).unwrap().handle));
        }
        expected.push(SandboxEvent::Destroyed(handle(boss)));
    }
    expected.extend(layout.start_room.iter().map(|id| SandboxEvent::Destroyed(handle(id))));
    expected
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    World(SandboxEvent),
    Panel(MinimapCommand),
}

type Timeline = Rc<RefCell<Vec<Step>>>;

/// Sandbox that also writes its destroys and hooks to a shared timeline.
struct TimelineWorld {
    inner: SandboxWorld,
    timeline: Timeline,
}

impl WorldHost for TimelineWorld {
    fn spawn(&mut self, archetype: &str, transform: Transform) -> Result<ActorHandle, SpawnError> {
        self.inner.spawn(archetype, transform)
    }

    fn set_transform(&mut self, handle: ActorHandle, transform: Transform) {
        self.inner.set_transform(handle, transform);
    }

    fn destroy(&mut self, handle: ActorHandle) {
        self.inner.destroy(handle);
        self.timeline.borrow_mut().push(Step::World(SandboxEvent::Destroyed(handle)));
    }

    fn is_blocked(&self, handle: ActorHandle, transform: Transform) -> bool {
        self.inner.is_blocked(handle, transform)
    }

    fn trigger(&mut self, handle: ActorHandle, hook: PopulationHook) {
        self.inner.trigger(handle, hook);
        self.timeline.borrow_mut().push(Step::World(SandboxEvent::Hook(handle, hook)));
    }

    fn set_placeholder(&mut self, handle: ActorHandle, point_label: &str, visible: bool) {
        self.inner.set_placeholder(handle, point_label, visible);
    }

    fn fit_nav_volume(&mut self, volume: NavVolumeId, transform: Transform, half_extents: Vec3) {
        self.inner.fit_nav_volume(volume, transform, half_extents);
    }
}

/// Minimap that writes panel resets to the same timeline.
struct TimelineMinimap {
    timeline: Timeline,
}

impl MinimapSink for TimelineMinimap {
    fn spawn_room_icon(&mut self, _: MapPanel, _: RoomId, _: &str, _: Vec3, _: f32) {}

    fn spawn_portal_icon(&mut self, _: MapPanel, _: RoomId, _: Vec3, _: f32) {}

    fn clear_panel(&mut self, panel: MapPanel) {
        self.timeline.borrow_mut().push(Step::Panel(MinimapCommand::Clear(panel)));
    }

    fn show_hub(&mut self, panel: MapPanel) {
        self.timeline.borrow_mut().push(Step::Panel(MinimapCommand::Hub(panel)));
    }
}

#[test]
fn test_teardown_follows_kind_order() {
    let cases = [
        MapGenerationParams::for_testing(3),
        MapGenerationParams::for_testing(41),
        MapGenerationParams::new(1, 1, 0, 15).with_boss_room(true),
        MapGenerationParams::new(4, 0, 2, 12),
    ];
    for params in cases {
        let mut gen = generated(&params);
        let expected = expected_teardown(gen.layout());
        let generation_calls = gen.world().journal().len();

        gen.destroy_map();

        let teardown = &gen.world().journal()[generation_calls..];
        assert_eq!(teardown, expected.as_slice(), "seed {}", params.seed);
    }
}

#[test]
fn test_panels_reset_after_world_teardown() {
    let timeline = Timeline::default();
    let catalog = RoomCatalog::sample();
    let world = TimelineWorld {
        inner: SandboxWorld::new(&catalog),
        timeline: Rc::clone(&timeline),
    };
    let minimap = TimelineMinimap {
        timeline: Rc::clone(&timeline),
    };
    let mut gen = MapGenerator::new(catalog, world, minimap);
    gen.generate_map(&MapGenerationParams::for_testing(8))
        .expect("generation failed");
    let expected = expected_teardown(gen.layout());
    timeline.borrow_mut().clear();

    gen.destroy_map();

    let steps = timeline.borrow();
    let world_steps: Vec<_> = expected.into_iter().map(Step::World).collect();
    assert_eq!(&steps[..world_steps.len()], world_steps.as_slice());
    assert_eq!(
        &steps[world_steps.len()..],
        &[
            Step::Panel(MinimapCommand::Clear(MapPanel::Minimap)),
            Step::Panel(MinimapCommand::Clear(MapPanel::InfoMap)),
            Step::Panel(MinimapCommand::Hub(MapPanel::Minimap)),
            Step::Panel(MinimapCommand::Hub(MapPanel::InfoMap)),
        ]
    );
    assert_eq!(gen.world().inner.live_actor_count(), 0);
}

#[test]
fn test_full_map_teardown_leaves_nothing_behind() {
    for seed in [0, 1, 77, 4096, 9999] {
        let mut gen = generated(&MapGenerationParams::for_testing(seed));
        let handles = gen.layout().actor_handles();

        gen.destroy_map();

        assert_eq!(gen.world().live_actor_count(), 0, "seed {}", seed);
        assert_eq!(
            gen.world().total_destroy_calls() as usize,
            handles.len(),
            "seed {}",
            seed
        );
        assert!(handles.iter().all(|h| gen.world().destroy_count(*h) == 1));
        assert!(gen.layout().is_empty());
        assert!(gen.layout().safe_room_transitions.is_empty());
        assert_eq!(gen.layout().boss_room, None);
    }
}

#[test]
fn test_boss_entrance_portal_destroyed_once() {
    // Safe-room frequency 1 forces the boss through a portal
    let mut gen = generated(&MapGenerationParams::new(1, 1, 0, 15).with_boss_room(true));
    let layout = gen.layout();
    let boss = layout.room(layout.boss_room.unwrap()).unwrap();
    let entrance = match boss.role {
        portalcrawl::RoomRole::Boss {
            entrance_portal: Some(portal),
            ..
        } => layout.portal(portal).unwrap().handle,
        ref other => panic!("boss without an entrance portal: {:?}", other),
    };

    gen.destroy_map();

    assert_eq!(gen.world().destroy_count(entrance), 1);
    assert_eq!(gen.world().live_actor_count(), 0);
}

#[test]
fn test_map_can_be_regenerated_after_teardown() {
    let mut gen = generated(&MapGenerationParams::new(3, 0, 1, 5));
    gen.destroy_map();
    assert_eq!(gen.minimap().room_icons(MapPanel::Minimap), 0);

    let summary = gen
        .generate_map(&MapGenerationParams::new(3, 0, 1, 5))
        .expect("generation failed");
    assert_eq!(summary.battle_rooms, 3);
    assert_eq!(
        gen.world().hook_count(PopulationHook::DestroyEnemies),
        3,
        "only the first map has been torn down"
    );
    assert!(gen.minimap().room_icons(MapPanel::Minimap) > 0);
}
