//! # Warren
//!
//! Dungeon traversal layer for a tile-based roguelike: room graphs, room contents and
//! single-step grid movement.
//!
//! ## Architecture Overview
//!
//! The crate is organised around the path a player takes through a dungeon:
//!
//! - **Generation**: a room graph (or a spatially embedded room tree) is generated from a
//!   seed and a difficulty stage, and each room's 11x11 tile grid is filled on first entry
//! - **Session**: the topology service walks the graph, caches visited rooms and publishes
//!   transition, completion and activation events
//! - **Movement**: player intents become command objects executed through an invoker with
//!   LIFO undo, interpolated over several ticks, and redirected to room transitions when a
//!   step lands on a door tile
//! - **Utilities**: A* reachability checks, interpolation and direction quantization
//!
//! Everything is single-threaded and deterministic for a given seed.

pub mod game;
pub mod generation;
pub mod input;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use utils::*;

/// Core error type for the Warren crate.
#[derive(thiserror::Error, Debug)]
pub enum WarrenError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Service or structure is not in a usable state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A grid coordinate outside the grid was addressed
    #[error("Position ({x}, {y}) is out of bounds")]
    OutOfBounds { x: i32, y: i32 },
}

/// Result type used throughout the Warren codebase.
pub type WarrenResult<T> = Result<T, WarrenError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Layout and traversal constants.
pub mod config {
    /// Width and height of every room grid, border included
    pub const ROOM_GRID_SIZE: i32 = 11;

    /// Last stage whose border walls are breakable
    pub const EARLY_STAGE: u32 = 2;

    /// Largest ring radius searched when looking for a spawn cell
    pub const SPAWN_SEARCH_RADIUS: i32 = 10;

    /// Neighbor cap for rooms in the spatial generator
    pub const MAX_SPATIAL_NEIGHBORS: usize = 3;

    /// Default duration of one interpolated step, in seconds
    pub const DEFAULT_MOVE_DURATION: f32 = 0.15;

    /// Default number of tries when placing a single obstacle
    pub const DEFAULT_PLACEMENT_ATTEMPTS: u32 = 64;
}
