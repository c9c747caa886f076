//! # Tiles and Room Grids
//!
//! The cell types a room is built from and the fixed-size grid that holds them.

use crate::config::{ROOM_GRID_SIZE, SPAWN_SEARCH_RADIUS};
use crate::{Position, WarrenError, WarrenResult};
use serde::{Deserialize, Serialize};

/// The kind of content occupying a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Floor,
    Wall,
    Pillar,
    Trap,
    Interactive,
    Entrance,
    Exit,
}

impl TileType {
    /// Whether this is one of the two door kinds.
    pub fn is_door(self) -> bool {
        matches!(self, TileType::Entrance | TileType::Exit)
    }
}

/// A single grid cell.
///
/// Tiles are immutable values: changing a cell means replacing its tile through
/// [`RoomGrid::set_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    tile_type: TileType,
    is_passable: bool,
    is_interactive: bool,
    is_destructible: bool,
}

impl Tile {
    /// Creates a tile with the default flags for its type.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Tile, TileType};
    ///
    /// let tile = Tile::new(TileType::Trap);
    /// assert!(tile.is_passable());
    /// assert!(!Tile::new(TileType::Pillar).is_passable());
    /// ```
    pub fn new(tile_type: TileType) -> Self {
        let is_passable = matches!(
            tile_type,
            TileType::Floor | TileType::Trap | TileType::Entrance | TileType::Exit
        );
        Self {
            tile_type,
            is_passable,
            is_interactive: tile_type == TileType::Interactive,
            is_destructible: false,
        }
    }

    /// Plain walkable floor.
    pub fn floor() -> Self {
        Self::new(TileType::Floor)
    }

    /// A wall, breakable when `destructible` is set.
    pub fn wall(destructible: bool) -> Self {
        Self {
            is_destructible: destructible,
            ..Self::new(TileType::Wall)
        }
    }

    pub fn pillar() -> Self {
        Self::new(TileType::Pillar)
    }

    pub fn trap() -> Self {
        Self::new(TileType::Trap)
    }

    pub fn interactive() -> Self {
        Self::new(TileType::Interactive)
    }

    pub fn entrance() -> Self {
        Self::new(TileType::Entrance)
    }

    pub fn exit() -> Self {
        Self::new(TileType::Exit)
    }

    pub fn tile_type(&self) -> TileType {
        self.tile_type
    }

    pub fn is_passable(&self) -> bool {
        self.is_passable
    }

    pub fn is_interactive(&self) -> bool {
        self.is_interactive
    }

    pub fn is_destructible(&self) -> bool {
        self.is_destructible
    }

    /// Floor with no obstacle on it.
    pub fn is_plain_floor(&self) -> bool {
        self.tile_type == TileType::Floor
    }

    /// ASCII glyph used by the dump tool.
    pub fn symbol(&self) -> char {
        match self.tile_type {
            TileType::Floor => '.',
            TileType::Wall if self.is_destructible => '%',
            TileType::Wall => '#',
            TileType::Pillar => 'O',
            TileType::Trap => '^',
            TileType::Interactive => '?',
            TileType::Entrance => 'E',
            TileType::Exit => 'X',
        }
    }
}

/// Read-only grid queries used for door, floor and spawn checks.
pub trait GridLookup {
    /// Whether the cell holds a tile of the given kind. Out-of-bounds cells hold nothing.
    fn has_tile(&self, pos: Position, kind: TileType) -> bool;

    /// Grid width and height in cells.
    fn bounds(&self) -> (i32, i32);
}

/// A rectangular grid of tiles, row-major (`tiles[y][x]`) with (0, 0) at the top-left.
///
/// Rooms use an 11x11 grid: a one-tile border ring around a 9x9 interior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGrid {
    width: i32,
    height: i32,
    tiles: Vec<Vec<Tile>>,
    /// Cells marked for enemy placement by the content strategies
    pub enemy_spawns: Vec<Position>,
}

impl RoomGrid {
    /// Creates a grid of the given size filled with floor.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![vec![Tile::floor(); width as usize]; height as usize],
            enemy_spawns: Vec::new(),
        }
    }

    /// Creates a standard 11x11 room grid filled with floor.
    pub fn room() -> Self {
        Self::new(ROOM_GRID_SIZE, ROOM_GRID_SIZE)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Checks whether a position lies inside the grid.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Gets the tile at a position.
    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.tiles
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
    }

    /// Replaces the tile at a position.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> WarrenResult<()> {
        if !self.is_valid_position(pos) {
            return Err(WarrenError::OutOfBounds { x: pos.x, y: pos.y });
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Sets every cell of the outer ring to `tile`.
    pub fn fill_border(&mut self, tile: Tile) {
        let (width, height) = (self.width as usize, self.height as usize);
        for (y, row) in self.tiles.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    *cell = tile;
                }
            }
        }
    }

    /// Whether the cell exists and can be walked on.
    pub fn is_passable(&self, pos: Position) -> bool {
        self.get_tile(pos).map(Tile::is_passable).unwrap_or(false)
    }

    /// Checks if a position is on the outer ring.
    pub fn is_border(&self, pos: Position) -> bool {
        self.is_valid_position(pos)
            && (pos.x == 0 || pos.y == 0 || pos.x == self.width - 1 || pos.y == self.height - 1)
    }

    /// Checks if a position is one of the four corners.
    pub fn is_corner(&self, pos: Position) -> bool {
        (pos.x == 0 || pos.x == self.width - 1) && (pos.y == 0 || pos.y == self.height - 1)
    }

    /// Center cell of the grid.
    pub fn center(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    /// Top-center border cell.
    pub fn top_center(&self) -> Position {
        Position::new(self.width / 2, 0)
    }

    /// Bottom-center border cell.
    pub fn bottom_center(&self) -> Position {
        Position::new(self.width / 2, self.height - 1)
    }

    /// All positions inside the border ring, row-major.
    pub fn interior_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in 1..(self.height - 1) {
            for x in 1..(self.width - 1) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// All positions on the border ring, row-major.
    pub fn border_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if self.is_border(pos) {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    /// First cell (row-major) holding the given tile type.
    pub fn find_tile(&self, kind: TileType) -> Option<Position> {
        self.positions_of(kind).into_iter().next()
    }

    /// Every cell holding the given tile type, row-major.
    pub fn positions_of(&self, kind: TileType) -> Vec<Position> {
        let mut positions = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if tile.tile_type() == kind {
                    positions.push(Position::new(x as i32, y as i32));
                }
            }
        }
        positions
    }

    /// Number of cells holding the given tile type.
    pub fn count(&self, kind: TileType) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|tile| tile.tile_type() == kind)
            .count()
    }

    /// Renders the grid as one text line per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for row in &self.tiles {
            out.extend(row.iter().map(Tile::symbol));
            out.push('\n');
        }
        out
    }
}

impl GridLookup for RoomGrid {
    fn has_tile(&self, pos: Position, kind: TileType) -> bool {
        self.get_tile(pos)
            .map(|tile| tile.tile_type() == kind)
            .unwrap_or(false)
    }

    fn bounds(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

/// Finds a floor cell to spawn on, searching rings of growing radius around `preferred`.
///
/// The search stops at [`SPAWN_SEARCH_RADIUS`]; if no floor cell turns up the grid
/// center is returned.
///
/// # Examples
///
/// ```
/// use warren::{find_spawn_position, Position, RoomGrid};
///
/// let grid = RoomGrid::room();
/// assert_eq!(find_spawn_position(&grid, Position::new(3, 3)), Position::new(3, 3));
/// ```
pub fn find_spawn_position<L: GridLookup + ?Sized>(lookup: &L, preferred: Position) -> Position {
    let (width, height) = lookup.bounds();

    for radius in 0..=SPAWN_SEARCH_RADIUS {
        for y in (preferred.y - radius)..=(preferred.y + radius) {
            for x in (preferred.x - radius)..=(preferred.x + radius) {
                let pos = Position::new(x, y);
                if pos.chebyshev_distance(preferred) != radius as u32 {
                    continue;
                }
                if x < 0 || y < 0 || x >= width || y >= height {
                    continue;
                }
                if lookup.has_tile(pos, TileType::Floor) {
                    return pos;
                }
            }
        }
    }

    Position::new(width / 2, height / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_flags() {
        assert!(Tile::floor().is_passable());
        assert!(Tile::entrance().is_passable());
        assert!(Tile::exit().is_passable());
        assert!(!Tile::wall(false).is_passable());
        assert!(Tile::wall(true).is_destructible());
        assert!(!Tile::wall(false).is_destructible());
        assert!(Tile::interactive().is_interactive());
        assert!(!Tile::interactive().is_passable());
        assert!(Tile::floor().is_plain_floor());
        assert!(!Tile::trap().is_plain_floor());
    }

    #[test]
    fn test_room_grid_geometry() {
        let grid = RoomGrid::room();
        assert_eq!(grid.bounds(), (11, 11));
        assert_eq!(grid.interior_positions().len(), 81);
        assert_eq!(grid.border_positions().len(), 40);
        assert_eq!(grid.top_center(), Position::new(5, 0));
        assert_eq!(grid.bottom_center(), Position::new(5, 10));
        assert!(grid.is_corner(Position::new(10, 0)));
        assert!(!grid.is_corner(Position::new(5, 0)));
        assert!(grid.is_border(Position::new(0, 4)));
        assert!(!grid.is_border(Position::new(1, 4)));
    }

    #[test]
    fn test_fill_border_walls_the_ring_only() {
        let mut grid = RoomGrid::room();
        grid.fill_border(Tile::wall(true));

        for pos in grid.border_positions() {
            assert_eq!(grid.get_tile(pos), Some(&Tile::wall(true)));
        }
        for pos in grid.interior_positions() {
            assert_eq!(grid.get_tile(pos), Some(&Tile::floor()));
        }
        assert_eq!(grid.count(TileType::Wall), 40);

        let mut strip = RoomGrid::new(3, 1);
        strip.fill_border(Tile::pillar());
        assert_eq!(strip.count(TileType::Pillar), 3);
        RoomGrid::new(0, 0).fill_border(Tile::pillar());
    }

    #[test]
    fn test_set_tile_out_of_bounds() {
        let mut grid = RoomGrid::room();
        assert!(grid.set_tile(Position::new(11, 0), Tile::pillar()).is_err());
        assert!(grid.set_tile(Position::new(-1, 3), Tile::pillar()).is_err());
        assert!(grid.set_tile(Position::new(3, 3), Tile::pillar()).is_ok());
        assert_eq!(grid.find_tile(TileType::Pillar), Some(Position::new(3, 3)));
        assert_eq!(grid.count(TileType::Pillar), 1);
        assert!(!grid.is_passable(Position::new(3, 3)));
        assert!(!grid.is_passable(Position::new(30, 3)));
    }

    #[test]
    fn test_spawn_search_expands_rings() {
        let mut grid = RoomGrid::new(5, 5);
        for pos in grid.interior_positions() {
            grid.set_tile(pos, Tile::pillar()).unwrap();
        }
        grid.set_tile(Position::new(3, 3), Tile::floor()).unwrap();
        grid.set_tile(Position::new(2, 2), Tile::pillar()).unwrap();

        // (3, 3) sits on the first ring, so the floor border on the second ring is never reached.
        let spawn = find_spawn_position(&grid, Position::new(2, 2));
        assert_eq!(spawn, Position::new(3, 3));
    }

    #[test]
    fn test_spawn_search_falls_back_to_center() {
        let mut grid = RoomGrid::new(7, 7);
        for y in 0..7 {
            for x in 0..7 {
                grid.set_tile(Position::new(x, y), Tile::wall(false)).unwrap();
            }
        }
        assert_eq!(find_spawn_position(&grid, Position::new(0, 0)), Position::new(3, 3));
    }

    #[test]
    fn test_ascii_dump() {
        let mut grid = RoomGrid::new(3, 2);
        grid.set_tile(Position::new(0, 0), Tile::wall(true)).unwrap();
        grid.set_tile(Position::new(1, 0), Tile::entrance()).unwrap();
        assert_eq!(grid.to_ascii(), "%E.\n...\n");
    }
}
