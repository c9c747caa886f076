//! # Room Topology Session
//!
//! Walks a generated dungeon graph one room at a time. The service owns the graph, a cache
//! of visited rooms and the event sink; it is the only code that moves the current-room
//! pointer, and it only ever moves it along an existing edge.

use crate::generation::utils::{create_rng, derive_seed};
use crate::{
    find_spawn_position, DungeonGraph, EventSink, GenerationConfig, Generator, GridFrame,
    Position, Room, RoomContentGenerator, RoomEvent, RoomGraphGenerator, RoomGrid, TileType,
    WarrenError, WarrenResult,
};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;

/// Session layer over a room graph.
///
/// # Examples
///
/// ```
/// use warren::{GenerationConfig, RoomEvent, RoomTopologyService};
///
/// let mut service = RoomTopologyService::new(GenerationConfig::for_testing(5), Vec::new());
/// service.initialize_dungeon(1).unwrap();
///
/// let start = service.current_room().unwrap().id;
/// assert!(matches!(service.sink()[0], RoomEvent::Transition { from: None, .. }));
///
/// let next = service.current_room().unwrap().connections[0];
/// assert!(service.try_enter_room(next));
/// assert_ne!(service.current_room().unwrap().id, start);
/// ```
#[derive(Debug)]
pub struct RoomTopologyService<S: EventSink> {
    config: GenerationConfig,
    rng: StdRng,
    content: RoomContentGenerator,
    graph: Option<DungeonGraph>,
    room_cache: HashMap<u32, Room>,
    stage: u32,
    sink: S,
    frame: GridFrame,
}

impl<S: EventSink> RoomTopologyService<S> {
    /// Creates an uninitialized service publishing into `sink`.
    pub fn new(config: GenerationConfig, sink: S) -> Self {
        let rng = create_rng(&config);
        let content = RoomContentGenerator::from_config(&config);
        Self {
            config,
            rng,
            content,
            graph: None,
            room_cache: HashMap::new(),
            stage: 0,
            sink,
            frame: GridFrame::unit(),
        }
    }

    /// Sets the frame used to convert spawn cells into continuous coordinates.
    pub fn with_frame(mut self, frame: GridFrame) -> Self {
        self.frame = frame;
        self
    }

    /// Generates a dungeon for `stage` and activates its start room.
    ///
    /// Any previous dungeon and its room cache are discarded.
    pub fn initialize_dungeon(&mut self, stage: u32) -> WarrenResult<()> {
        if let Err(err) = self.config.validate() {
            log::error!("Dungeon initialization failed: {}", err);
            return Err(err);
        }

        self.rng = StdRng::seed_from_u64(derive_seed(self.config.seed, stage as u64));
        self.room_cache.clear();
        self.graph = None;
        self.stage = stage;

        let generator = RoomGraphGenerator::for_stage(stage);
        let mut graph = match generator.generate(&self.config, &mut self.rng) {
            Ok(graph) => graph,
            Err(err) => {
                log::error!("Dungeon initialization failed: {}", err);
                return Err(err);
            }
        };

        let start_id = graph.start_room_id;
        let mut start = graph
            .room(start_id)
            .cloned()
            .ok_or_else(|| WarrenError::InvalidState(format!("Start room {} missing", start_id)))?;
        self.content.generate(&mut start, stage, &mut self.rng);
        graph.replace_room(start.clone());
        graph.current_room_id = start_id;
        self.room_cache.insert(start_id, start.clone());
        self.graph = Some(graph);

        log::info!(
            "Initialized stage {} dungeon with {} rooms",
            stage,
            self.config.total_rooms
        );

        self.sink.publish(RoomEvent::Transition {
            from: None,
            to: start_id,
            was_completed: false,
        });
        self.publish_activation(&start, TileType::Entrance);
        Ok(())
    }

    /// Moves to a connected room. Returns `false`, changing nothing, when the service is
    /// not initialized or `target_id` is not connected to the current room.
    pub fn try_enter_room(&mut self, target_id: u32) -> bool {
        let Some(graph) = self.graph.as_mut() else {
            log::warn!("try_enter_room({}) called before initialize_dungeon", target_id);
            return false;
        };

        let current_id = graph.current_room_id;
        let Some(current) = graph.room(current_id).cloned() else {
            log::warn!("Current room {} is missing from the graph", current_id);
            return false;
        };
        if !current.is_connected_to(target_id) || graph.room(target_id).is_none() {
            log::debug!("Rejected move from room {} to unconnected room {}", current_id, target_id);
            return false;
        }

        let was_completed = current.is_completed;
        self.room_cache.insert(current_id, current);

        let target = match self.room_cache.get(&target_id) {
            Some(cached) => cached.clone(),
            None => {
                let mut room = match graph.room(target_id).cloned() {
                    Some(room) => room,
                    None => return false,
                };
                self.content.generate(&mut room, self.stage, &mut self.rng);
                self.room_cache.insert(target_id, room.clone());
                room
            }
        };
        graph.replace_room(target.clone());
        graph.current_room_id = target_id;

        log::info!("Entered room {} from room {}", target_id, current_id);

        self.sink.publish(RoomEvent::Transition {
            from: Some(current_id),
            to: target_id,
            was_completed,
        });
        let arrival = if target_id > current_id {
            TileType::Entrance
        } else {
            TileType::Exit
        };
        self.publish_activation(&target, arrival);
        true
    }

    /// Marks the current room completed. Returns `true` only the first time.
    pub fn complete_current_room(&mut self) -> bool {
        let Some(graph) = self.graph.as_mut() else {
            log::warn!("complete_current_room called before initialize_dungeon");
            return false;
        };
        let Some(room) = graph.current_room().cloned() else {
            return false;
        };
        if room.is_completed {
            return false;
        }

        let room_id = room.id;
        let completed = room.with_completed();
        graph.replace_room(completed.clone());
        self.room_cache.insert(room_id, completed);

        log::info!("Completed room {}", room_id);
        self.sink.publish(RoomEvent::Completed { room_id });
        true
    }

    /// Neighbor a door tile of the current room leads to.
    ///
    /// The Exit leads to the lowest connected id above the current one and the Entrance to
    /// the highest connected id below it; either falls back to the first connection.
    pub fn room_behind_door(&self, kind: TileType) -> Option<u32> {
        let room = self.current_room()?;
        let id = room.id;
        let preferred = match kind {
            TileType::Exit => room.connections.iter().copied().filter(|&c| c > id).min(),
            TileType::Entrance => room.connections.iter().copied().filter(|&c| c < id).max(),
            _ => return None,
        };
        preferred.or_else(|| room.connections.first().copied())
    }

    /// Enters the room behind a door of the current room.
    pub fn try_traverse_door(&mut self, kind: TileType) -> bool {
        match self.room_behind_door(kind) {
            Some(target) => self.try_enter_room(target),
            None => false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.graph.as_ref().and_then(|graph| graph.current_room())
    }

    /// Cached state of a visited room.
    pub fn cached_room(&self, id: u32) -> Option<&Room> {
        self.room_cache.get(&id)
    }

    pub fn graph(&self) -> Option<&DungeonGraph> {
        self.graph.as_ref()
    }

    /// Difficulty stage of the current dungeon.
    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn publish_activation(&mut self, room: &Room, arrival: TileType) {
        let grid = room.grid.clone().unwrap_or_else(RoomGrid::room);
        let preferred = grid
            .find_tile(arrival)
            .map(|door| door + inward_step(&grid, door))
            .unwrap_or_else(|| grid.center());
        let grid_position = find_spawn_position(&grid, preferred);

        self.sink.publish(RoomEvent::Activated {
            room_id: room.id,
            spawn_position: self.frame.cell_center(grid_position),
            grid_position,
            grid,
        });
    }
}

/// Unit step from a border cell towards the interior.
fn inward_step(grid: &RoomGrid, cell: Position) -> Position {
    if cell.y == 0 {
        Position::new(0, 1)
    } else if cell.y == grid.height() - 1 {
        Position::new(0, -1)
    } else if cell.x == 0 {
        Position::new(1, 0)
    } else if cell.x == grid.width() - 1 {
        Position::new(-1, 0)
    } else {
        Position::origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridLookup;

    fn service() -> RoomTopologyService<Vec<RoomEvent>> {
        let mut service = RoomTopologyService::new(GenerationConfig::for_testing(11), Vec::new());
        service.initialize_dungeon(1).unwrap();
        service
    }

    #[test]
    fn test_uninitialized_service_rejects_everything() {
        let mut service = RoomTopologyService::new(GenerationConfig::default(), Vec::new());
        assert!(!service.is_initialized());
        assert!(!service.try_enter_room(1));
        assert!(!service.complete_current_room());
        assert!(service.current_room().is_none());
        assert!(service.sink().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_generation() {
        let config = GenerationConfig {
            early_stage_max: 6,
            late_stage_min: 6,
            ..GenerationConfig::for_testing(2)
        };
        let mut service = RoomTopologyService::new(config, Vec::new());

        assert!(matches!(
            service.initialize_dungeon(1),
            Err(WarrenError::InvalidState(_))
        ));
        assert!(!service.is_initialized());
        assert!(service.graph().is_none());
        assert!(service.sink().is_empty());
    }

    #[test]
    fn test_initialize_generates_start_room() {
        let service = service();
        let start = service.current_room().unwrap();
        assert_eq!(start.id, 0);
        assert!(start.is_generated);
        assert!(start.grid.is_some());
        assert_eq!(service.stage(), 1);

        let events = service.sink();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            RoomEvent::Transition {
                from: None,
                to: 0,
                was_completed: false
            }
        );
        assert!(matches!(events[1], RoomEvent::Activated { room_id: 0, .. }));
    }

    #[test]
    fn test_activation_spawns_on_floor() {
        let service = service();
        match &service.sink()[1] {
            RoomEvent::Activated {
                grid,
                grid_position,
                spawn_position,
                ..
            } => {
                assert!(grid.has_tile(*grid_position, TileType::Floor));
                assert_eq!(
                    *spawn_position,
                    GridFrame::unit().cell_center(*grid_position)
                );
            }
            other => panic!("expected activation, got {:?}", other),
        }
    }

    #[test]
    fn test_enter_and_return_uses_cache() {
        let mut service = service();
        let next = service.current_room().unwrap().connections[0];
        assert!(service.try_enter_room(next));
        let grid = service.current_room().unwrap().grid.clone();
        assert!(service.complete_current_room());

        assert!(service.try_enter_room(0));
        assert!(service.try_enter_room(next));
        let room = service.current_room().unwrap();
        assert!(room.is_completed);
        assert_eq!(room.grid, grid);
    }

    #[test]
    fn test_transition_reports_previous_completion() {
        let mut service = service();
        service.complete_current_room();
        let next = service.current_room().unwrap().connections[0];
        service.sink_mut().clear();

        assert!(service.try_enter_room(next));
        assert_eq!(
            service.sink()[0],
            RoomEvent::Transition {
                from: Some(0),
                to: next,
                was_completed: true
            }
        );
    }

    #[test]
    fn test_completion_is_idempotent() {
        let mut service = service();
        service.sink_mut().clear();
        assert!(service.complete_current_room());
        assert!(!service.complete_current_room());
        assert_eq!(service.sink().as_slice(), &[RoomEvent::Completed { room_id: 0 }]);
        assert!(service.cached_room(0).unwrap().is_completed);
        assert!(service.graph().unwrap().room(0).unwrap().is_completed);
    }

    #[test]
    fn test_exit_door_leads_forward() {
        let mut service = service();
        assert_eq!(service.room_behind_door(TileType::Exit), Some(1));
        assert!(service.try_traverse_door(TileType::Exit));
        assert_eq!(service.current_room().unwrap().id, 1);
        assert_eq!(service.room_behind_door(TileType::Entrance), Some(0));
        assert_eq!(service.room_behind_door(TileType::Floor), None);
    }

    #[test]
    fn test_same_seed_same_dungeon() {
        let a = service();
        let b = service();
        assert_eq!(a.graph(), b.graph());
    }

    #[test]
    fn test_inward_step() {
        let grid = RoomGrid::room();
        assert_eq!(inward_step(&grid, Position::new(5, 0)), Position::new(0, 1));
        assert_eq!(inward_step(&grid, Position::new(5, 10)), Position::new(0, -1));
        assert_eq!(inward_step(&grid, Position::new(0, 4)), Position::new(1, 0));
        assert_eq!(inward_step(&grid, Position::new(10, 4)), Position::new(-1, 0));
    }
}
