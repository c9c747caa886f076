//! # Room Content Generation
//!
//! Fills a room's 11x11 grid: border walls, type-specific obstacles, doors, and a
//! reachability check between the doors with a clearing fallback.
//!
//! Obstacle layouts are plain functions selected by [`RoomType`], which keeps every
//! strategy testable on its own grid.

use crate::config::{DEFAULT_PLACEMENT_ATTEMPTS, EARLY_STAGE};
use crate::{
    GenerationConfig, Position, ReachabilityValidator, Room, RoomGrid, RoomType, Tile, TileType,
};
use rand::{rngs::StdRng, Rng};

/// Inputs every content strategy receives besides the grid and the RNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyContext {
    /// Difficulty stage the room is generated for
    pub stage: u32,
    /// Whether walls placed at this stage are breakable
    pub walls_destructible: bool,
    /// Tries per obstacle before it is skipped
    pub max_attempts: u32,
}

/// A per-room-type obstacle layout. Strategies only ever touch interior cells.
pub type ContentStrategy = fn(RoomGrid, &StrategyContext, &mut StdRng) -> RoomGrid;

/// What [`RoomContentGenerator::generate`] did to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOutcome {
    /// The room already had contents; nothing changed
    AlreadyGenerated,
    /// Contents were generated and the doors were reachable
    Generated,
    /// Contents were generated but the interior had to be cleared to connect the doors
    Repaired,
}

/// Generates room contents on first entry.
#[derive(Debug, Clone)]
pub struct RoomContentGenerator {
    validator: ReachabilityValidator,
    /// Tries per obstacle before it is skipped
    pub max_placement_attempts: u32,
    /// Highest stage whose walls are breakable
    pub early_stage_max: u32,
}

impl RoomContentGenerator {
    /// Creates a content generator with default limits.
    pub fn new() -> Self {
        Self {
            validator: ReachabilityValidator::new(),
            max_placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            early_stage_max: EARLY_STAGE,
        }
    }

    /// Creates a content generator using the limits from a generation config.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            validator: ReachabilityValidator::new(),
            max_placement_attempts: config.max_placement_attempts,
            early_stage_max: config.early_stage_max,
        }
    }

    /// Generates the room's grid unless it already has one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use warren::{ContentOutcome, Room, RoomContentGenerator, RoomType};
    ///
    /// let generator = RoomContentGenerator::new();
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let mut room = Room::new(0, RoomType::Empty);
    /// room.add_connection(1);
    ///
    /// assert_ne!(generator.generate(&mut room, 1, &mut rng), ContentOutcome::AlreadyGenerated);
    /// assert_eq!(generator.generate(&mut room, 1, &mut rng), ContentOutcome::AlreadyGenerated);
    /// ```
    pub fn generate(&self, room: &mut Room, stage: u32, rng: &mut StdRng) -> ContentOutcome {
        if room.is_generated {
            log::debug!("Room {} already generated, keeping its contents", room.id);
            return ContentOutcome::AlreadyGenerated;
        }

        let (grid, repaired) = self.build_grid(room, stage, rng);
        room.grid = Some(grid);
        room.is_generated = true;

        if repaired {
            ContentOutcome::Repaired
        } else {
            ContentOutcome::Generated
        }
    }

    /// Builds a grid for the room. The flag reports whether the fallback clearing ran.
    pub fn build_grid(&self, room: &Room, stage: u32, rng: &mut StdRng) -> (RoomGrid, bool) {
        let context = StrategyContext {
            stage,
            walls_destructible: stage <= self.early_stage_max,
            max_attempts: self.max_placement_attempts,
        };

        let mut grid = RoomGrid::room();
        grid.fill_border(Tile::wall(context.walls_destructible));

        let strategy = strategy_for(room.room_type);
        let mut grid = strategy(grid, &context, rng);

        place_doors(&mut grid, room.connections.len(), context.walls_destructible, rng);

        if self.doors_reachable(&grid) {
            return (grid, false);
        }

        log::debug!(
            "Room {} ({:?}) failed door reachability, clearing interior",
            room.id,
            room.room_type
        );
        clear_interior(&mut grid);
        (grid, true)
    }

    /// True when the Entrance and Exit are connected, or when the room lacks one of them.
    pub fn doors_reachable(&self, grid: &RoomGrid) -> bool {
        match (grid.find_tile(TileType::Entrance), grid.find_tile(TileType::Exit)) {
            (Some(entrance), Some(exit)) => self.validator.is_path_available(grid, entrance, exit),
            _ => true,
        }
    }
}

impl Default for RoomContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Selects the obstacle layout for a room type.
pub fn strategy_for(room_type: RoomType) -> ContentStrategy {
    match room_type {
        RoomType::Empty => empty_layout,
        RoomType::Tactical => tactical_layout,
        RoomType::Hunt => hunt_layout,
        RoomType::Puzzle => puzzle_layout,
        RoomType::KeyEvent => key_event_layout,
        RoomType::Exit => exit_layout,
    }
}

/// Sparse pillars on the even lattice, each candidate with a 10% chance.
pub fn empty_layout(mut grid: RoomGrid, _context: &StrategyContext, rng: &mut StdRng) -> RoomGrid {
    for pos in grid.interior_positions() {
        if pos.x % 2 == 0 && pos.y % 2 == 0 && rng.gen_bool(0.10) {
            let _ = grid.set_tile(pos, Tile::pillar());
        }
    }
    grid
}

/// Three or four cover walls plus one or two traps.
pub fn tactical_layout(mut grid: RoomGrid, context: &StrategyContext, rng: &mut StdRng) -> RoomGrid {
    let walls = rng.gen_range(3..=4);
    for _ in 0..walls {
        place_randomly(&mut grid, Tile::wall(context.walls_destructible), context, rng);
    }
    let traps = rng.gen_range(1..=2);
    for _ in 0..traps {
        place_randomly(&mut grid, Tile::trap(), context, rng);
    }
    grid
}

/// Two to four pillars, each with an enemy marker on a free side.
pub fn hunt_layout(mut grid: RoomGrid, context: &StrategyContext, rng: &mut StdRng) -> RoomGrid {
    let pillars = rng.gen_range(2..=4);
    for _ in 0..pillars {
        let Some(pillar) = place_randomly(&mut grid, Tile::pillar(), context, rng) else {
            continue;
        };
        let cover = pillar.cardinal_adjacent_positions().into_iter().find(|pos| {
            !grid.is_border(*pos)
                && grid.get_tile(*pos).map(Tile::is_plain_floor).unwrap_or(false)
                && !grid.enemy_spawns.contains(pos)
        });
        if let Some(cover) = cover {
            grid.enemy_spawns.push(cover);
        }
    }
    grid
}

/// Two to four interactive objects and a 30% chance of one guarding enemy.
pub fn puzzle_layout(mut grid: RoomGrid, context: &StrategyContext, rng: &mut StdRng) -> RoomGrid {
    let objects = rng.gen_range(2..=4);
    for _ in 0..objects {
        place_randomly(&mut grid, Tile::interactive(), context, rng);
    }
    if rng.gen_bool(0.30) {
        if let Some(pos) = pick_free_cell(&grid, context, rng) {
            grid.enemy_spawns.push(pos);
        }
    }
    grid
}

/// At most one decorative object, at the center.
pub fn key_event_layout(mut grid: RoomGrid, _context: &StrategyContext, rng: &mut StdRng) -> RoomGrid {
    let center = grid.center();
    let center_free = grid.get_tile(center).map(Tile::is_plain_floor).unwrap_or(false);
    if center_free && rng.gen_bool(0.5) {
        let _ = grid.set_tile(center, Tile::interactive());
    }
    grid
}

/// Decorative pillars and objects scattered over 15% of the interior.
pub fn exit_layout(mut grid: RoomGrid, _context: &StrategyContext, rng: &mut StdRng) -> RoomGrid {
    for pos in grid.interior_positions() {
        if rng.gen_bool(0.15) {
            let tile = if rng.gen_bool(0.5) {
                Tile::pillar()
            } else {
                Tile::interactive()
            };
            let _ = grid.set_tile(pos, tile);
        }
    }
    grid
}

/// Picks a random interior cell that is plain floor and not already marked.
///
/// Gives up after `context.max_attempts` tries.
fn pick_free_cell(grid: &RoomGrid, context: &StrategyContext, rng: &mut StdRng) -> Option<Position> {
    if grid.width() < 3 || grid.height() < 3 {
        return None;
    }

    for _ in 0..context.max_attempts {
        let pos = Position::new(
            rng.gen_range(1..grid.width() - 1),
            rng.gen_range(1..grid.height() - 1),
        );
        let free = grid.get_tile(pos).map(Tile::is_plain_floor).unwrap_or(false);
        if free && !grid.enemy_spawns.contains(&pos) {
            return Some(pos);
        }
    }

    log::warn!(
        "No free interior cell after {} attempts, skipping placement",
        context.max_attempts
    );
    None
}

/// Places a tile on a random free interior cell.
fn place_randomly(
    grid: &mut RoomGrid,
    tile: Tile,
    context: &StrategyContext,
    rng: &mut StdRng,
) -> Option<Position> {
    let pos = pick_free_cell(grid, context, rng)?;
    grid.set_tile(pos, tile).ok()?;
    Some(pos)
}

/// Clears old doors and places new ones based on the connection count.
///
/// One or more connections put the Entrance at the top center. Two or more put the Exit
/// at the bottom center; a single connection puts it on a random non-corner border cell.
pub fn place_doors(
    grid: &mut RoomGrid,
    connection_count: usize,
    walls_destructible: bool,
    rng: &mut StdRng,
) {
    let old_doors: Vec<Position> = grid
        .positions_of(TileType::Entrance)
        .into_iter()
        .chain(grid.positions_of(TileType::Exit))
        .collect();
    for pos in old_doors {
        let _ = grid.set_tile(pos, Tile::wall(walls_destructible));
    }

    if connection_count == 0 {
        return;
    }

    let entrance = grid.top_center();
    let _ = grid.set_tile(entrance, Tile::entrance());

    let exit = if connection_count >= 2 {
        grid.bottom_center()
    } else {
        let candidates: Vec<Position> = grid
            .border_positions()
            .into_iter()
            .filter(|pos| *pos != entrance && !grid.is_corner(*pos))
            .collect();
        if candidates.is_empty() {
            return;
        }
        candidates[rng.gen_range(0..candidates.len())]
    };
    let _ = grid.set_tile(exit, Tile::exit());
}

/// Resets every interior cell to floor; doors on the border are untouched.
fn clear_interior(grid: &mut RoomGrid) {
    for pos in grid.interior_positions() {
        let _ = grid.set_tile(pos, Tile::floor());
    }
    grid.enemy_spawns.clear();
}
