//! # Spatial Room Generation
//!
//! Grows a dungeon outward from a start room on a cardinal grid. Each expansion step
//! attaches one or two rooms to the room at the top of a frontier stack, opening doors
//! between parent and child; a final pass makes every room's doors match the rooms that
//! were actually placed next to it.
//!
//! Rooms live in an arena indexed by id. The visit order and the direction-keyed
//! adjacency are separate indices over that arena, so no room is owned twice.

use crate::config::MAX_SPATIAL_NEIGHBORS;
use crate::{
    Direction, GenerationConfig, Generator, GridFrame, Position, WarrenError, WarrenResult,
    WorldPoint,
};
use bitflags::bitflags;
use rand::{rngs::StdRng, seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

bitflags! {
    /// Set of open doors on a room's sides.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DoorDirections: u8 {
        const NORTH = 0b0001;
        const EAST = 0b0010;
        const SOUTH = 0b0100;
        const WEST = 0b1000;
    }
}

impl DoorDirections {
    /// The flag for a single side.
    pub fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::North => DoorDirections::NORTH,
            Direction::East => DoorDirections::EAST,
            Direction::South => DoorDirections::SOUTH,
            Direction::West => DoorDirections::WEST,
        }
    }

    /// The open sides, clockwise from North.
    pub fn directions(self) -> Vec<Direction> {
        Direction::all()
            .into_iter()
            .filter(|direction| self.contains(DoorDirections::from_direction(*direction)))
            .collect()
    }
}

/// Role of a room in the spatial layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpatialRoomKind {
    Start,
    Normal,
    Boss,
    Treasure,
    Special,
}

/// Settings for spatial generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Number of rooms to place, start room included
    pub target_rooms: usize,
    /// Footprint of a room in tiles; neighbors sit exactly this far apart
    pub room_size: i32,
    /// Chance that a freely typed room is a boss room
    pub boss_chance: f64,
    /// Chance that a freely typed room is a treasure room
    pub treasure_chance: f64,
    /// Chance that a freely typed room is a special room
    pub special_chance: f64,
}

impl SpatialConfig {
    /// Checks sizes and probabilities.
    pub fn validate(&self) -> WarrenResult<()> {
        if self.room_size <= 0 {
            return Err(WarrenError::InvalidState(format!(
                "room_size must be positive, got {}",
                self.room_size
            )));
        }
        let chances = [self.boss_chance, self.treasure_chance, self.special_chance];
        if chances.iter().any(|chance| !(0.0..=1.0).contains(chance)) {
            return Err(WarrenError::InvalidState(
                "room kind chances must lie in [0, 1]".to_string(),
            ));
        }
        if chances.iter().sum::<f64>() > 1.0 {
            return Err(WarrenError::InvalidState(
                "room kind chances must not sum above 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            target_rooms: 12,
            room_size: crate::config::ROOM_GRID_SIZE,
            boss_chance: 0.05,
            treasure_chance: 0.10,
            special_chance: 0.10,
        }
    }
}

/// Description of a room about to be placed, handed to the room factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomBlueprint {
    pub id: usize,
    pub kind: SpatialRoomKind,
    /// Tile position of the room's corner
    pub position: Position,
    /// Side facing the parent room, if any
    pub entrance: Option<Direction>,
    pub parent: Option<usize>,
}

/// A room placed on the spatial grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedRoom {
    pub id: usize,
    pub kind: SpatialRoomKind,
    /// Tile position of the room's corner
    pub position: Position,
    /// Sides with an open door
    pub doors: DoorDirections,
    /// Room this one was grown from
    pub parent: Option<usize>,
}

impl PlacedRoom {
    /// Default factory output: a room with only its entrance door open.
    pub fn from_blueprint(blueprint: &RoomBlueprint) -> Self {
        Self {
            id: blueprint.id,
            kind: blueprint.kind,
            position: blueprint.position,
            doors: blueprint
                .entrance
                .map(DoorDirections::from_direction)
                .unwrap_or_default(),
            parent: blueprint.parent,
        }
    }
}

/// Adjacency entry for one room of the arena.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomNode {
    pub room_id: usize,
    /// Neighboring room ids keyed by the side they are on
    pub neighbors: BTreeMap<Direction, usize>,
}

impl RoomNode {
    pub fn new(room_id: usize) -> Self {
        Self {
            room_id,
            neighbors: BTreeMap::new(),
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Option<usize> {
        self.neighbors.get(&direction).copied()
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Whether expansion may still attach rooms here.
    pub fn can_expand(&self) -> bool {
        self.neighbors.len() < MAX_SPATIAL_NEIGHBORS
    }
}

/// A spatially embedded dungeon.
#[derive(Debug, Clone, Serialize)]
pub struct SpatialDungeon {
    /// Grid position of the start room
    pub origin: Position,
    pub room_size: i32,
    /// Room arena, indexed by id
    pub rooms: Vec<PlacedRoom>,
    /// Adjacency index, parallel to `rooms`
    pub nodes: Vec<RoomNode>,
    /// Ids in the order rooms were placed
    pub visit_order: Vec<usize>,
    #[serde(skip)]
    occupied: HashMap<Position, usize>,
}

impl SpatialDungeon {
    fn new(origin: Position, room_size: i32) -> Self {
        Self {
            origin,
            room_size,
            rooms: Vec::new(),
            nodes: Vec::new(),
            visit_order: Vec::new(),
            occupied: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn room(&self, id: usize) -> Option<&PlacedRoom> {
        self.rooms.get(id)
    }

    pub fn node(&self, id: usize) -> Option<&RoomNode> {
        self.nodes.get(id)
    }

    /// Room whose corner sits at the given tile position.
    pub fn room_at(&self, position: Position) -> Option<&PlacedRoom> {
        self.occupied.get(&position).and_then(|id| self.rooms.get(*id))
    }

    /// Tile position one room-step away in a direction.
    pub fn offset(&self, position: Position, direction: Direction) -> Position {
        position + direction.to_delta().scaled(self.room_size)
    }

    /// Room placed right after `id`, in visit order.
    pub fn next_in_order(&self, id: usize) -> Option<usize> {
        let index = self.visit_order.iter().position(|&other| other == id)?;
        self.visit_order.get(index + 1).copied()
    }

    /// Room placed right before `id`, in visit order.
    pub fn previous_in_order(&self, id: usize) -> Option<usize> {
        let index = self.visit_order.iter().position(|&other| other == id)?;
        index.checked_sub(1).and_then(|prev| self.visit_order.get(prev)).copied()
    }

    fn insert(&mut self, room: PlacedRoom) {
        self.occupied.insert(room.position, room.id);
        self.nodes.push(RoomNode::new(room.id));
        self.visit_order.push(room.id);
        self.rooms.push(room);
    }

    /// Links `a` to `b` on side `direction`, and `b` back to `a` on the opposite side.
    pub fn link(&mut self, a: usize, direction: Direction, b: usize) {
        if a == b || a >= self.nodes.len() || b >= self.nodes.len() {
            return;
        }
        self.nodes[a].neighbors.insert(direction, b);
        self.nodes[b].neighbors.insert(direction.opposite(), a);
    }

    /// Sides of a room that have a placed room next to them.
    pub fn occupied_directions(&self, id: usize) -> DoorDirections {
        let Some(room) = self.rooms.get(id) else {
            return DoorDirections::empty();
        };
        Direction::all()
            .into_iter()
            .filter(|direction| {
                self.occupied
                    .contains_key(&self.offset(room.position, *direction))
            })
            .fold(DoorDirections::empty(), |doors, direction| {
                doors | DoorDirections::from_direction(direction)
            })
    }

    /// Makes each room's doors exactly match its placed neighbors.
    ///
    /// Doors without a neighbor are revoked and physically adjacent rooms get linked.
    /// Returns the number of stray doors revoked.
    pub fn reconcile_doors(&mut self) -> usize {
        let mut revoked = 0;

        for id in 0..self.rooms.len() {
            let actual = self.occupied_directions(id);
            let stray = self.rooms[id].doors.difference(actual);
            if !stray.is_empty() {
                log::debug!("Revoking stray doors {:?} on room {}", stray, id);
                revoked += stray.directions().len();
            }
            self.rooms[id].doors = actual;

            let position = self.rooms[id].position;
            for direction in actual.directions() {
                if let Some(&neighbor) = self.occupied.get(&self.offset(position, direction)) {
                    self.link(id, direction, neighbor);
                }
            }
        }

        revoked
    }

    /// Whether every room is reachable from the start room through neighbor links.
    pub fn is_connected(&self) -> bool {
        if self.rooms.is_empty() {
            return false;
        }
        let reached = ::pathfinding::prelude::bfs_reach(0usize, |id| {
            self.nodes
                .get(*id)
                .map(|node| node.neighbors.values().copied().collect::<Vec<_>>())
                .unwrap_or_default()
        })
        .count();
        reached == self.rooms.len()
    }

    /// Room-level occupancy grid covering the bounding box of all rooms.
    pub fn occupancy_grid(&self) -> RoomOccupancyGrid {
        let room_size = self.room_size.max(1);
        let units: Vec<Position> = self
            .rooms
            .iter()
            .map(|room| self.unit_of(room.position, room_size))
            .collect();

        let min_x = units.iter().map(|unit| unit.x).min().unwrap_or(0);
        let min_y = units.iter().map(|unit| unit.y).min().unwrap_or(0);
        let max_x = units.iter().map(|unit| unit.x).max().unwrap_or(0);
        let max_y = units.iter().map(|unit| unit.y).max().unwrap_or(0);
        let min_unit = Position::new(min_x, min_y);
        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;

        let mut cells = vec![false; (width * height) as usize];
        for unit in &units {
            let cell = *unit - min_unit;
            cells[(cell.y * width + cell.x) as usize] = true;
        }

        let corner = self.origin + min_unit.scaled(room_size);
        RoomOccupancyGrid {
            frame: GridFrame::new(
                WorldPoint::new(corner.x as f32, corner.y as f32),
                room_size as f32,
            ),
            min_unit,
            width,
            height,
            cells,
        }
    }

    /// Room-step coordinates of a tile position relative to the origin.
    fn unit_of(&self, position: Position, room_size: i32) -> Position {
        let delta = position - self.origin;
        Position::new(delta.x.div_euclid(room_size), delta.y.div_euclid(room_size))
    }
}

/// Grid of room slots; a cell is passable when a room occupies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomOccupancyGrid {
    /// Maps cells to world coordinates
    pub frame: GridFrame,
    /// Room-step coordinates of cell (0, 0)
    pub min_unit: Position,
    pub width: i32,
    pub height: i32,
    cells: Vec<bool>,
}

impl RoomOccupancyGrid {
    pub fn is_valid_position(&self, cell: Position) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Whether a room occupies the cell. Out-of-bounds cells are impassable.
    pub fn is_passable(&self, cell: Position) -> bool {
        self.is_valid_position(cell) && self.cells[(cell.y * self.width + cell.x) as usize]
    }

    pub fn cell_center(&self, cell: Position) -> WorldPoint {
        self.frame.cell_center(cell)
    }

    pub fn cell_at(&self, point: WorldPoint) -> Position {
        self.frame.cell_at(point)
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }
}

/// Generator that grows rooms outward from a start room.
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use warren::{Position, SpatialConfig, SpatialRoomGenerator};
///
/// let generator = SpatialRoomGenerator::new(SpatialConfig::default());
/// let mut rng = StdRng::seed_from_u64(3);
/// let dungeon = generator.generate_from(Position::origin(), &mut rng);
/// assert_eq!(dungeon.len(), 12);
/// assert!(dungeon.is_connected());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpatialRoomGenerator {
    pub config: SpatialConfig,
}

impl SpatialRoomGenerator {
    pub fn new(config: SpatialConfig) -> Self {
        Self { config }
    }

    /// Generates a layout with the default room factory.
    pub fn generate_from(&self, origin: Position, rng: &mut StdRng) -> SpatialDungeon {
        self.generate_from_with(origin, rng, |blueprint| {
            Some(PlacedRoom::from_blueprint(blueprint))
        })
    }

    /// Generates a layout, instantiating rooms through `factory`.
    ///
    /// A factory returning `None` rejects that placement; the door already promised on
    /// the parent is revoked by the final door pass. An invalid config is logged and
    /// yields an empty dungeon.
    pub fn generate_from_with<F>(&self, origin: Position, rng: &mut StdRng, mut factory: F) -> SpatialDungeon
    where
        F: FnMut(&RoomBlueprint) -> Option<PlacedRoom>,
    {
        if let Err(err) = self.config.validate() {
            log::error!("Spatial generation skipped: {}", err);
            return SpatialDungeon::new(origin, self.config.room_size.max(1));
        }

        let target = self.config.target_rooms;
        let mut dungeon = SpatialDungeon::new(origin, self.config.room_size);
        if target == 0 {
            return dungeon;
        }

        let start = RoomBlueprint {
            id: 0,
            kind: SpatialRoomKind::Start,
            position: origin,
            entrance: None,
            parent: None,
        };
        match factory(&start) {
            Some(room) => dungeon.insert(PlacedRoom {
                id: 0,
                position: origin,
                doors: DoorDirections::empty(),
                ..room
            }),
            None => {
                log::error!("Room factory rejected the start room, nothing generated");
                return dungeon;
            }
        }

        let mut frontier = vec![0usize];

        while dungeon.len() < target {
            let Some(&parent) = frontier.last() else {
                break;
            };

            match self.expand(&mut dungeon, parent, rng, &mut factory) {
                Some(mut spawned) if !spawned.is_empty() => {
                    let chosen = spawned.remove(rng.gen_range(0..spawned.len()));
                    frontier.extend(spawned);
                    frontier.push(chosen);
                }
                _ => {
                    frontier.pop();
                }
            }
        }

        let revoked = dungeon.reconcile_doors();
        if revoked > 0 {
            log::debug!("Door pass revoked {} stray doors", revoked);
        }
        if dungeon.len() < target {
            log::warn!(
                "Spatial generation placed {} of {} rooms",
                dungeon.len(),
                target
            );
        }

        dungeon
    }

    /// One expansion step: opens one or two doors on free sides of `parent` and places a
    /// room behind each.
    ///
    /// Returns `None` when `parent` is at the neighbor cap or boxed in, otherwise the ids
    /// placed (empty if the factory rejected them all).
    fn expand<F>(
        &self,
        dungeon: &mut SpatialDungeon,
        parent: usize,
        rng: &mut StdRng,
        factory: &mut F,
    ) -> Option<Vec<usize>>
    where
        F: FnMut(&RoomBlueprint) -> Option<PlacedRoom>,
    {
        let target = self.config.target_rooms;
        if !dungeon.nodes.get(parent)?.can_expand() {
            return None;
        }

        let parent_position = dungeon.rooms[parent].position;
        let mut free: Vec<Direction> = Direction::all()
            .into_iter()
            .filter(|direction| {
                !dungeon
                    .occupied
                    .contains_key(&dungeon.offset(parent_position, *direction))
            })
            .collect();
        if free.is_empty() {
            return None;
        }

        let capacity = MAX_SPATIAL_NEIGHBORS - dungeon.nodes[parent].neighbor_count();
        let spawn_count = rng
            .gen_range(1..=2)
            .min(free.len())
            .min(target.saturating_sub(dungeon.len()))
            .min(capacity);
        free.shuffle(rng);

        let mut new_doors = DoorDirections::empty();
        let mut spawned = Vec::new();

        for direction in free.into_iter().take(spawn_count) {
            new_doors |= DoorDirections::from_direction(direction);

            let position = dungeon.offset(parent_position, direction);
            let id = dungeon.len();
            let blueprint = RoomBlueprint {
                id,
                kind: self.determine_kind(id, target, rng),
                position,
                entrance: Some(direction.opposite()),
                parent: Some(parent),
            };

            match factory(&blueprint) {
                Some(room) => {
                    dungeon.insert(PlacedRoom {
                        id,
                        position,
                        parent: Some(parent),
                        ..room
                    });
                    dungeon.link(parent, direction, id);
                    spawned.push(id);
                }
                None => {
                    log::debug!("Room factory rejected room {} at {:?}", id, position);
                }
            }
        }

        dungeon.rooms[parent].doors |= new_doors;
        Some(spawned)
    }

    /// Forced kinds for the start and the last budget slots, weighted draw otherwise.
    fn determine_kind(&self, index: usize, target: usize, rng: &mut StdRng) -> SpatialRoomKind {
        if index == 0 {
            return SpatialRoomKind::Start;
        }
        if target >= 2 && index == target - 2 {
            return SpatialRoomKind::Boss;
        }
        if target >= 3 && index == target - 3 {
            return SpatialRoomKind::Treasure;
        }

        let roll = rng.gen::<f64>();
        let boss = self.config.boss_chance;
        let treasure = boss + self.config.treasure_chance;
        let special = treasure + self.config.special_chance;
        if roll < boss {
            SpatialRoomKind::Boss
        } else if roll < treasure {
            SpatialRoomKind::Treasure
        } else if roll < special {
            SpatialRoomKind::Special
        } else {
            SpatialRoomKind::Normal
        }
    }
}

impl Generator<SpatialDungeon> for SpatialRoomGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<SpatialDungeon> {
        self.config.validate()?;
        let dungeon = self.generate_from(Position::origin(), rng);
        self.validate(&dungeon, config)?;
        Ok(dungeon)
    }

    fn validate(&self, dungeon: &SpatialDungeon, _config: &GenerationConfig) -> WarrenResult<()> {
        if dungeon.is_empty() {
            return Err(WarrenError::GenerationFailed(
                "Spatial dungeon has no rooms".to_string(),
            ));
        }
        if !dungeon.is_connected() {
            return Err(WarrenError::GenerationFailed(
                "Spatial dungeon is not connected".to_string(),
            ));
        }
        for room in &dungeon.rooms {
            if room.doors != dungeon.occupied_directions(room.id) {
                return Err(WarrenError::GenerationFailed(format!(
                    "Room {} doors do not match its neighbors",
                    room.id
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "SpatialRoomGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::cell::Cell;

    fn generator(target_rooms: usize) -> SpatialRoomGenerator {
        SpatialRoomGenerator::new(SpatialConfig {
            target_rooms,
            ..SpatialConfig::default()
        })
    }

    #[test]
    fn test_door_flags() {
        let doors = DoorDirections::NORTH | DoorDirections::WEST;
        assert_eq!(doors.directions(), vec![Direction::North, Direction::West]);
        assert_eq!(
            DoorDirections::from_direction(Direction::South),
            DoorDirections::SOUTH
        );
    }

    #[test]
    fn test_start_room_at_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        let origin = Position::new(5, -3);
        let dungeon = generator(6).generate_from(origin, &mut rng);
        let start = dungeon.room(0).unwrap();
        assert_eq!(start.kind, SpatialRoomKind::Start);
        assert_eq!(start.position, origin);
        assert_eq!(start.parent, None);
    }

    #[test]
    fn test_reaches_target_and_stays_on_lattice() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dungeon = generator(15).generate_from(Position::origin(), &mut rng);
            assert_eq!(dungeon.len(), 15);
            assert_eq!(dungeon.visit_order.len(), 15);
            for room in &dungeon.rooms {
                assert_eq!(room.position.x % 11, 0);
                assert_eq!(room.position.y % 11, 0);
                assert_eq!(dungeon.room_at(room.position).map(|r| r.id), Some(room.id));
            }
        }
    }

    #[test]
    fn test_forced_kinds() {
        let mut rng = StdRng::seed_from_u64(4);
        let dungeon = generator(10).generate_from(Position::origin(), &mut rng);
        assert_eq!(dungeon.room(8).unwrap().kind, SpatialRoomKind::Boss);
        assert_eq!(dungeon.room(7).unwrap().kind, SpatialRoomKind::Treasure);
    }

    #[test]
    fn test_doors_match_neighbors() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dungeon = generator(20).generate_from(Position::origin(), &mut rng);
            for room in &dungeon.rooms {
                assert_eq!(room.doors, dungeon.occupied_directions(room.id));
                let node = dungeon.node(room.id).unwrap();
                for direction in room.doors.directions() {
                    let neighbor = node.neighbor(direction).unwrap();
                    let back = dungeon.node(neighbor).unwrap().neighbor(direction.opposite());
                    assert_eq!(back, Some(room.id));
                }
            }
        }
    }

    #[test]
    fn test_rejected_rooms_leave_no_stray_doors() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut calls = 0;
        let dungeon = generator(12).generate_from_with(Position::origin(), &mut rng, |blueprint| {
            calls += 1;
            // Reject every third placement after the start room.
            if blueprint.id > 0 && calls % 3 == 0 {
                None
            } else {
                Some(PlacedRoom::from_blueprint(blueprint))
            }
        });

        assert!(dungeon.is_connected());
        for room in &dungeon.rooms {
            assert_eq!(room.doors, dungeon.occupied_directions(room.id));
        }
    }

    #[test]
    fn test_rejected_start_room_yields_empty_dungeon() {
        let mut rng = StdRng::seed_from_u64(9);
        let dungeon = generator(5).generate_from_with(Position::origin(), &mut rng, |_| None);
        assert!(dungeon.is_empty());
    }

    #[test]
    fn test_visit_order_navigation() {
        let mut rng = StdRng::seed_from_u64(2);
        let dungeon = generator(4).generate_from(Position::origin(), &mut rng);
        assert_eq!(dungeon.previous_in_order(0), None);
        assert_eq!(dungeon.next_in_order(0), Some(dungeon.visit_order[1]));
        assert_eq!(dungeon.next_in_order(dungeon.visit_order[3]), None);
    }

    #[test]
    fn test_occupancy_grid_marks_rooms() {
        let mut rng = StdRng::seed_from_u64(6);
        let dungeon = generator(8).generate_from(Position::new(22, 11), &mut rng);
        let grid = dungeon.occupancy_grid();
        assert_eq!(grid.occupied_count(), 8);
        for room in &dungeon.rooms {
            let center = WorldPoint::new(
                room.position.x as f32 + 5.5,
                room.position.y as f32 + 5.5,
            );
            let cell = grid.cell_at(center);
            assert!(grid.is_passable(cell));
            assert_eq!(grid.cell_center(cell), center);
        }
        assert!(!grid.is_passable(Position::new(-1, 0)));
    }

    #[test]
    fn test_spatial_config_validation() {
        assert!(SpatialConfig::default().validate().is_ok());
        let bad = SpatialConfig {
            boss_chance: 0.6,
            treasure_chance: 0.6,
            ..SpatialConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = SpatialConfig {
            room_size: 0,
            ..SpatialConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_generator_trait_validates() {
        let mut rng = StdRng::seed_from_u64(12);
        let config = GenerationConfig::default();
        let dungeon = generator(10).generate(&config, &mut rng).unwrap();
        assert_eq!(dungeon.len(), 10);
        assert_eq!(generator(10).generator_type(), "SpatialRoomGenerator");
    }

    #[test]
    fn test_zero_room_size_yields_empty_dungeon() {
        let generator = SpatialRoomGenerator::new(SpatialConfig {
            room_size: 0,
            ..SpatialConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(5);
        let dungeon = generator.generate_from(Position::origin(), &mut rng);
        assert!(dungeon.is_empty());
        assert_eq!(dungeon.occupancy_grid().occupied_count(), 0);
    }

    #[test]
    fn test_occupancy_grid_tolerates_degenerate_room_size() {
        let mut dungeon = SpatialDungeon::new(Position::origin(), 0);
        dungeon.insert(PlacedRoom::from_blueprint(&RoomBlueprint {
            id: 0,
            kind: SpatialRoomKind::Start,
            position: Position::origin(),
            entrance: None,
            parent: None,
        }));
        let grid = dungeon.occupancy_grid();
        assert_eq!(grid.occupied_count(), 1);
        assert!(grid.is_passable(Position::origin()));
    }

    #[test]
    fn test_expansion_steps_place_one_or_two_rooms_under_the_cap() {
        let generator = generator(40);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut dungeon = SpatialDungeon::new(Position::origin(), 11);
            dungeon.insert(PlacedRoom::from_blueprint(&RoomBlueprint {
                id: 0,
                kind: SpatialRoomKind::Start,
                position: Position::origin(),
                entrance: None,
                parent: None,
            }));

            let placed_this_step = Cell::new(0);
            let mut factory = |blueprint: &RoomBlueprint| {
                placed_this_step.set(placed_this_step.get() + 1);
                Some(PlacedRoom::from_blueprint(blueprint))
            };

            for _ in 0..60 {
                let parent = rng.gen_range(0..dungeon.len());
                let before = dungeon.len();
                let outcome = generator.expand(&mut dungeon, parent, &mut rng, &mut factory);
                let calls = placed_this_step.replace(0);

                match outcome {
                    Some(spawned) => {
                        assert!(
                            (1..=2).contains(&spawned.len()),
                            "seed {} spawned {}",
                            seed,
                            spawned.len()
                        );
                        assert_eq!(calls, spawned.len());
                        assert_eq!(dungeon.len(), before + spawned.len());
                    }
                    None => assert_eq!(calls, 0),
                }
                for node in &dungeon.nodes {
                    assert!(node.neighbor_count() <= MAX_SPATIAL_NEIGHBORS);
                }
                if dungeon.len() >= 40 {
                    break;
                }
            }
        }
    }
}
