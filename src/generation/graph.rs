//! # Room Graph Generation
//!
//! Builds the abstract dungeon graph: a main path from the start room to the exit room,
//! stage-dependent loop edges, and a repair pass that guarantees every room is reachable.
//!
//! The resulting graph is independent of any spatial embedding; room contents are
//! generated later, on first entry.

use super::utils;
use crate::{GenerationConfig, Generator, Room, RoomType, WarrenError, WarrenResult};
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// A generated dungeon: rooms keyed by id, plus the start and current room pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonGraph {
    /// All rooms, indexed by id
    pub rooms: BTreeMap<u32, Room>,
    /// Room the player starts in
    pub start_room_id: u32,
    /// Room the player is currently in
    pub current_room_id: u32,
}

impl DungeonGraph {
    /// Wraps generated rooms in a graph starting at the lowest id.
    pub fn from_rooms(rooms: Vec<Room>) -> WarrenResult<Self> {
        let rooms: BTreeMap<u32, Room> = rooms.into_iter().map(|room| (room.id, room)).collect();
        let start_room_id = *rooms.keys().next().ok_or_else(|| {
            WarrenError::GenerationFailed("Dungeon graph has no rooms".to_string())
        })?;

        Ok(Self {
            rooms,
            start_room_id,
            current_room_id: start_room_id,
        })
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: u32) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.room(self.current_room_id)
    }

    /// Replaces the slot holding `room.id`. Returns the previous value, if any.
    pub fn replace_room(&mut self, room: Room) -> Option<Room> {
        self.rooms.insert(room.id, room)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        let endpoints: usize = self.rooms.values().map(|room| room.connections.len()).sum();
        endpoints / 2
    }

    /// Whether every room can be reached from the start room.
    pub fn is_connected(&self) -> bool {
        if self.rooms.is_empty() {
            return false;
        }

        let reached = ::pathfinding::prelude::bfs_reach(self.start_room_id, |id| {
            self.rooms
                .get(id)
                .map(|room| room.connections.clone())
                .unwrap_or_default()
        })
        .filter(|id| self.rooms.contains_key(id))
        .count();

        reached == self.rooms.len()
    }

    /// Whether every edge appears in both endpoint rooms.
    pub fn is_symmetric(&self) -> bool {
        self.rooms.values().all(|room| {
            room.connections.iter().all(|other| {
                self.rooms
                    .get(other)
                    .map(|neighbor| neighbor.is_connected_to(room.id))
                    .unwrap_or(false)
            })
        })
    }
}

/// Generator for connected room graphs.
///
/// # Examples
///
/// ```
/// use warren::{GenerationConfig, RoomGraphGenerator, RoomType};
/// use warren::generation::utils::create_rng;
///
/// let config = GenerationConfig::new(7);
/// let generator = RoomGraphGenerator::for_stage(1);
/// let mut rng = create_rng(&config);
///
/// let rooms = generator.generate_room_graph(9, &config, &mut rng);
/// assert_eq!(rooms.len(), 9);
/// assert_eq!(rooms[0].room_type, RoomType::Empty);
/// assert_eq!(rooms[8].room_type, RoomType::Exit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomGraphGenerator {
    /// Difficulty stage used to weight room types and loop density
    pub stage: u32,
}

impl RoomGraphGenerator {
    pub fn for_stage(stage: u32) -> Self {
        Self { stage }
    }

    /// Generates `total_rooms` rooms with finalized, symmetric connections.
    ///
    /// Fewer than two rooms is a precondition violation: it is logged and an empty list
    /// is returned.
    pub fn generate_room_graph(
        &self,
        total_rooms: usize,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Vec<Room> {
        if total_rooms < 2 {
            log::error!(
                "Cannot generate a room graph with {} rooms (need at least 2)",
                total_rooms
            );
            return Vec::new();
        }

        let mut rooms: Vec<Room> = (0..total_rooms as u32)
            .map(|id| Room::new(id, self.determine_room_type(id, total_rooms, config, rng)))
            .collect();

        // Main path: 0 - 1 - ... - n-1
        for id in 0..(total_rooms as u32 - 1) {
            connect(&mut rooms, id, id + 1);
        }

        self.add_extra_edges(&mut rooms, config, rng);

        let bridges = repair_connectivity(&mut rooms);
        if bridges > 0 {
            log::debug!("Bridged {} disconnected components", bridges);
        }

        let mirrored = enforce_symmetry(&mut rooms);
        if mirrored > 0 {
            log::debug!("Mirrored {} one-way connections", mirrored);
        }

        for room in rooms.iter_mut() {
            room.finalize_connections();
        }

        rooms
    }

    /// Start room is Empty, last room is Exit, the rest are drawn from the stage's weights.
    fn determine_room_type(
        &self,
        room_id: u32,
        total_rooms: usize,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> RoomType {
        if room_id == 0 {
            return RoomType::Empty;
        }
        if room_id as usize == total_rooms - 1 {
            return RoomType::Exit;
        }

        let roll = rng.gen::<f64>();
        config.profile(self.stage).room_type_weights.pick(roll)
    }

    /// Adds loop edges between rooms that are not neighbors on the main path.
    fn add_extra_edges(&self, rooms: &mut [Room], config: &GenerationConfig, rng: &mut StdRng) {
        let profile = config.profile(self.stage);
        let extra = rng.gen_range(profile.min_extra_edges..=profile.max_extra_edges);

        for _ in 0..extra {
            let candidates = extra_edge_candidates(rooms);
            if candidates.is_empty() {
                break;
            }
            let (a, b) = candidates[rng.gen_range(0..candidates.len())];
            connect(rooms, a, b);
            log::debug!("Added extra edge {} <-> {}", a, b);
        }
    }
}

impl Default for RoomGraphGenerator {
    fn default() -> Self {
        Self::for_stage(1)
    }
}

impl Generator<DungeonGraph> for RoomGraphGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<DungeonGraph> {
        let rooms = self.generate_room_graph(config.total_rooms, config, rng);
        if rooms.is_empty() {
            return Err(WarrenError::GenerationFailed(format!(
                "Room graph needs at least 2 rooms, got {}",
                config.total_rooms
            )));
        }

        let graph = DungeonGraph::from_rooms(rooms)?;
        self.validate(&graph, config)?;
        Ok(graph)
    }

    fn validate(&self, graph: &DungeonGraph, _config: &GenerationConfig) -> WarrenResult<()> {
        if !graph.is_connected() {
            return Err(WarrenError::GenerationFailed(
                "Room graph is not connected".to_string(),
            ));
        }
        if !graph.is_symmetric() {
            return Err(WarrenError::GenerationFailed(
                "Room graph has one-way connections".to_string(),
            ));
        }
        let start_type = graph.room(graph.start_room_id).map(|room| room.room_type);
        if start_type != Some(RoomType::Empty) {
            return Err(WarrenError::GenerationFailed(format!(
                "Start room has type {:?}, expected Empty",
                start_type
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "RoomGraphGenerator"
    }
}

/// Adds an undirected edge between two rooms of the arena.
fn connect(rooms: &mut [Room], a: u32, b: u32) {
    if a == b || a as usize >= rooms.len() || b as usize >= rooms.len() {
        return;
    }
    rooms[a as usize].add_connection(b);
    rooms[b as usize].add_connection(a);
}

/// All unconnected pairs `(i, j)` with `j - i > 1`, in ascending order.
fn extra_edge_candidates(rooms: &[Room]) -> Vec<(u32, u32)> {
    let count = rooms.len() as u32;
    let mut candidates = Vec::new();
    for a in 0..count {
        for b in (a + 2)..count {
            if !rooms[a as usize].is_connected_to(b) {
                candidates.push((a, b));
            }
        }
    }
    candidates
}

/// Connected components of the arena, the component of room 0 first.
///
/// Edges are followed in either direction, so one-way connections still join rooms.
pub fn connected_components(rooms: &[Room]) -> Vec<Vec<u32>> {
    let count = rooms.len();
    let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); count];
    for room in rooms {
        for &other in &room.connections {
            if (other as usize) < count && (room.id as usize) < count {
                adjacency[room.id as usize].push(other);
                adjacency[other as usize].push(room.id);
            }
        }
    }

    let mut visited = vec![false; count];
    let mut components = Vec::new();

    for start in 0..count {
        if visited[start] {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start as u32);

        while let Some(id) = queue.pop_front() {
            component.push(id);
            for &next in &adjacency[id as usize] {
                if !visited[next as usize] {
                    visited[next as usize] = true;
                    queue.push_back(next);
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}

/// Bridges every component to the one before it until the arena is connected.
///
/// Returns the number of bridge edges added.
pub fn repair_connectivity(rooms: &mut [Room]) -> usize {
    let mut bridges = 0;

    loop {
        let components = connected_components(rooms);
        if components.len() <= 1 {
            return bridges;
        }

        for pair in components.windows(2) {
            let (previous, next) = (pair[0][0], pair[1][0]);
            connect(rooms, previous, next);
            log::debug!("Bridging room {} to room {}", next, previous);
            bridges += 1;
        }
    }
}

/// Mirrors every one-way connection. Returns how many were mirrored.
pub fn enforce_symmetry(rooms: &mut [Room]) -> usize {
    let count = rooms.len();
    let mut missing = Vec::new();
    for room in rooms.iter() {
        for &other in &room.connections {
            if (other as usize) < count && !rooms[other as usize].is_connected_to(room.id) {
                missing.push((other, room.id));
            }
        }
    }

    for &(owner, target) in &missing {
        rooms[owner as usize].add_connection(target);
    }
    missing.len()
}

/// Convenience wrapper: generates a validated graph from a config seed.
pub fn generate_dungeon_graph(config: &GenerationConfig, stage: u32) -> WarrenResult<DungeonGraph> {
    let mut rng = utils::create_rng(config);
    RoomGraphGenerator::for_stage(stage).generate(config, &mut rng)
}
