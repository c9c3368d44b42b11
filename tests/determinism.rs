//! Property tests over seeds and run parameters.

use portalcrawl::{
    Connection, MapGenerationParams, MapGenerator, MapSummary, MinimapLog, RoomCatalog, RoomKind,
    SandboxWorld, Transform,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn run(params: &MapGenerationParams) -> (MapGenerator<SandboxWorld, MinimapLog>, MapSummary) {
    let catalog = RoomCatalog::sample();
    let world = SandboxWorld::new(&catalog);
    let mut gen = MapGenerator::new(catalog, world, MinimapLog::new());
    let summary = gen.generate_map(params).expect("generation failed");
    (gen, summary)
}

/// Archetype and transform of every room, in spawn order.
fn fingerprint(gen: &MapGenerator<SandboxWorld, MinimapLog>) -> Vec<(String, Transform)> {
    gen.layout()
        .rooms
        .values()
        .map(|room| (room.archetype.clone(), room.transform))
        .collect()
}

fn params_strategy() -> impl Strategy<Value = MapGenerationParams> {
    (
        0u32..=10000,
        0u32..8,
        0u32..4,
        0u32..4,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(seed, battle, safe, puzzle, boss, unique)| {
            let mut params = MapGenerationParams::new(battle, safe, puzzle, seed).with_boss_room(boss);
            params.unique_battle_rooms = unique;
            params.unique_puzzle_rooms = unique;
            params
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn same_seed_same_map(params in params_strategy()) {
        let (first, first_summary) = run(&params);
        let (second, second_summary) = run(&params);
        prop_assert_eq!(first_summary.draws, second_summary.draws);
        prop_assert_eq!(first_summary.portals, second_summary.portals);
        prop_assert_eq!(first_summary.doorway_connections, second_summary.doorway_connections);

        prop_assert_eq!(fingerprint(&first), fingerprint(&second));
        prop_assert_eq!(
            first.layout().main_path_kinds(),
            second.layout().main_path_kinds()
        );
    }

    #[test]
    fn room_counts_follow_params(params in params_strategy()) {
        let (gen, _) = run(&params);
        let layout = gen.layout();

        let expected_battles = if params.unique_battle_rooms {
            params.battle_room_count.min(5)
        } else {
            params.battle_room_count
        };
        prop_assert_eq!(layout.battle_rooms.len() as u32, expected_battles);
        prop_assert_eq!(
            layout.safe_room_transitions.len() as u32,
            params.expected_safe_transitions()
        );
        prop_assert_eq!(layout.boss_room.is_some(), params.has_boss_room);
        prop_assert_eq!(layout.count_kind(RoomKind::Start), 1);
        if !params.has_puzzle_rooms() {
            prop_assert!(layout.puzzle_rooms.is_empty());
        }
    }

    #[test]
    fn graph_links_are_consistent(params in params_strategy()) {
        let (gen, _) = run(&params);
        let layout = gen.layout();

        for (id, room) in &layout.rooms {
            if let Some(next) = room.next_room {
                prop_assert_eq!(layout.room(next).unwrap().last_room, Some(id));
            }
            for side in &room.side_rooms {
                prop_assert_eq!(layout.room(*side).unwrap().kind(), RoomKind::Puzzle);
                prop_assert_eq!(layout.room(*side).unwrap().last_room, Some(id));
            }
        }
        let path = layout.main_path();
        let unique: HashSet<_> = path.iter().collect();
        prop_assert_eq!(unique.len(), path.len());
    }

    #[test]
    fn enabled_portals_point_at_their_partner(params in params_strategy()) {
        let (gen, _) = run(&params);
        let layout = gen.layout();

        for room in layout.rooms.values() {
            if let Some(Connection::Portal { exit_portal, entrance_portal, .. }) = &room.connection {
                let exit = layout.portal(*exit_portal).unwrap();
                let entrance = layout.portal(*entrance_portal).unwrap();
                prop_assert_eq!(exit.teleport_target, Some(*entrance_portal));
                prop_assert_eq!(entrance.teleport_target, Some(*exit_portal));
            }
        }
        for portal in layout.portals.values().filter(|portal| portal.enabled) {
            prop_assert!(portal.teleport_target.is_some());
        }
    }

    #[test]
    fn unique_battle_rooms_are_distinct(seed in 0u32..=10000, battle in 1u32..=5) {
        let mut params = MapGenerationParams::new(battle, 0, 0, seed);
        params.unique_battle_rooms = true;
        let (gen, _) = run(&params);

        let names: HashSet<_> = gen
            .layout()
            .battle_rooms
            .iter()
            .map(|id| gen.layout().room(*id).unwrap().archetype.clone())
            .collect();
        prop_assert_eq!(names.len() as u32, battle);
    }
}
