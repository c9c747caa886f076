//! Integration tests for room graph, room content and spatial generation.

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use warren::{
    generate_dungeon_graph, GenerationConfig, Generator, Position, ReachabilityValidator, Room,
    RoomContentGenerator, RoomGraphGenerator, RoomType, SpatialConfig, SpatialRoomGenerator,
    TileType, WarrenResult,
};

fn config_with_rooms(seed: u64, total_rooms: usize) -> GenerationConfig {
    GenerationConfig {
        total_rooms,
        ..GenerationConfig::new(seed)
    }
}

/// Nine rooms at stage 1: typed ends, connected, symmetric.
#[test]
fn test_nine_room_stage_one_graph() -> WarrenResult<()> {
    let config = config_with_rooms(2024, 9);
    let graph = generate_dungeon_graph(&config, 1)?;

    assert_eq!(graph.len(), 9);
    assert_eq!(graph.room(0).map(|room| room.room_type), Some(RoomType::Empty));
    assert_eq!(graph.room(8).map(|room| room.room_type), Some(RoomType::Exit));
    assert_eq!(graph.start_room_id, 0);
    assert!(graph.is_connected());
    assert!(graph.is_symmetric());

    for room in graph.rooms.values() {
        for other in &room.connections {
            assert!(graph.room(*other).unwrap().is_connected_to(room.id));
        }
    }
    Ok(())
}

#[test]
fn test_later_stages_add_more_loops() {
    let early: usize = (0..40)
        .map(|seed| generate_dungeon_graph(&config_with_rooms(seed, 12), 1).unwrap().edge_count())
        .sum();
    let late: usize = (0..40)
        .map(|seed| generate_dungeon_graph(&config_with_rooms(seed, 12), 7).unwrap().edge_count())
        .sum();
    assert!(late > early, "late stages should be denser ({} vs {})", late, early);
}

#[test]
fn test_single_connection_room_has_two_distinct_doors() {
    let generator = RoomContentGenerator::new();
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut room = Room::new(3, RoomType::Tactical);
        room.add_connection(2);
        generator.generate(&mut room, 1, &mut rng);

        let grid = room.grid.as_ref().unwrap();
        assert_eq!(grid.count(TileType::Entrance), 1);
        assert_eq!(grid.count(TileType::Exit), 1);
        assert_ne!(grid.find_tile(TileType::Entrance), grid.find_tile(TileType::Exit));
    }
}

#[test]
fn test_content_generation_is_idempotent() {
    let generator = RoomContentGenerator::new();
    let mut rng = StdRng::seed_from_u64(8);
    let mut room = Room::new(1, RoomType::Hunt);
    room.add_connection(0);
    room.add_connection(2);

    generator.generate(&mut room, 4, &mut rng);
    let first = room.grid.clone();
    generator.generate(&mut room, 4, &mut rng);
    assert_eq!(room.grid, first);
}

#[test]
fn test_generator_rejects_single_room() {
    let config = config_with_rooms(1, 1);
    let mut rng = StdRng::seed_from_u64(1);
    assert!(RoomGraphGenerator::for_stage(1).generate(&config, &mut rng).is_err());
    assert!(RoomGraphGenerator::for_stage(1)
        .generate_room_graph(1, &config, &mut rng)
        .is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_graphs_are_connected_and_symmetric(seed in any::<u64>(), rooms in 2_usize..24, stage in 0_u32..10) {
        let config = config_with_rooms(seed, rooms);
        let mut rng = StdRng::seed_from_u64(seed);
        let generated = RoomGraphGenerator::for_stage(stage).generate_room_graph(rooms, &config, &mut rng);
        let graph = warren::DungeonGraph::from_rooms(generated).unwrap();

        prop_assert_eq!(graph.len(), rooms);
        prop_assert!(graph.is_connected(), "seed={seed}, rooms={rooms}, stage={stage} disconnected");
        prop_assert!(graph.is_symmetric(), "seed={seed}, rooms={rooms}, stage={stage} asymmetric");
    }

    #[test]
    fn generated_rooms_keep_doors_reachable(seed in any::<u64>(), stage in 0_u32..10, connections in 1_u32..4) {
        let generator = RoomContentGenerator::new();
        let validator = ReachabilityValidator::new();
        let mut rng = StdRng::seed_from_u64(seed);

        for room_type in [RoomType::Empty, RoomType::Tactical, RoomType::Hunt, RoomType::Puzzle, RoomType::KeyEvent, RoomType::Exit] {
            let mut room = Room::new(10, room_type);
            for other in 0..connections {
                room.add_connection(other);
            }
            generator.generate(&mut room, stage, &mut rng);

            let grid = room.grid.as_ref().unwrap();
            let entrance = grid.find_tile(TileType::Entrance).unwrap();
            let exit = grid.find_tile(TileType::Exit).unwrap();
            prop_assert!(
                validator.is_path_available(grid, entrance, exit),
                "{room_type:?} at stage {stage} has unreachable doors"
            );
        }
    }

    #[test]
    fn spatial_doors_match_neighbors(seed in any::<u64>(), target in 1_usize..30) {
        let generator = SpatialRoomGenerator::new(SpatialConfig {
            target_rooms: target,
            ..SpatialConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(seed);
        let dungeon = generator.generate_from(Position::origin(), &mut rng);

        prop_assert_eq!(dungeon.len(), target);
        prop_assert!(dungeon.is_connected());
        for room in &dungeon.rooms {
            prop_assert_eq!(room.doors, dungeon.occupied_directions(room.id));
        }
    }
}
