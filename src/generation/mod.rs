//! # Generation Module
//!
//! Procedural generation of dungeon topology and room contents.
//!
//! Two layout generators live here: [`RoomGraphGenerator`] builds an abstract, connected
//! room graph, and [`SpatialRoomGenerator`] grows rooms outward on a cardinal grid. Room
//! interiors are filled by [`RoomContentGenerator`] the first time a room is entered.
//! Every generator is driven by a seeded [`StdRng`], so a seed reproduces a dungeon.

pub mod content;
pub mod graph;
pub mod spatial;

pub use content::*;
pub use graph::*;
pub use spatial::*;

use crate::config::{DEFAULT_MOVE_DURATION, DEFAULT_PLACEMENT_ATTEMPTS, EARLY_STAGE};
use crate::{RoomGrid, WarrenError, WarrenResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for procedural generation.
///
/// Controls room count, how the difficulty stage reweights room types and loop density,
/// and the limits of obstacle placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of rooms in the dungeon graph
    pub total_rooms: usize,
    /// Highest stage treated as early game
    pub early_stage_max: u32,
    /// Lowest stage treated as late game
    pub late_stage_min: u32,
    /// Room type weights and loop density for early stages
    pub early_profile: StageProfile,
    /// Room type weights and loop density for middle stages
    pub mid_profile: StageProfile,
    /// Room type weights and loop density for late stages
    pub late_profile: StageProfile,
    /// Attempts allowed when placing a single obstacle before it is skipped
    pub max_placement_attempts: u32,
    /// Seconds an interpolated step takes
    pub move_duration: f32,
}

impl GenerationConfig {
    /// Creates a new generation configuration with default values.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.total_rooms >= 2);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            total_rooms: 9,
            early_stage_max: EARLY_STAGE,
            late_stage_min: 5,
            early_profile: StageProfile {
                room_type_weights: RoomTypeWeights {
                    empty: 0.40,
                    tactical: 0.20,
                    hunt: 0.15,
                    puzzle: 0.15,
                    key_event: 0.10,
                },
                min_extra_edges: 0,
                max_extra_edges: 1,
            },
            mid_profile: StageProfile {
                room_type_weights: RoomTypeWeights {
                    empty: 0.25,
                    tactical: 0.25,
                    hunt: 0.20,
                    puzzle: 0.15,
                    key_event: 0.15,
                },
                min_extra_edges: 1,
                max_extra_edges: 3,
            },
            late_profile: StageProfile {
                room_type_weights: RoomTypeWeights {
                    empty: 0.15,
                    tactical: 0.20,
                    hunt: 0.30,
                    puzzle: 0.10,
                    key_event: 0.25,
                },
                min_extra_edges: 2,
                max_extra_edges: 5,
            },
            max_placement_attempts: DEFAULT_PLACEMENT_ATTEMPTS,
            move_duration: DEFAULT_MOVE_DURATION,
        }
    }

    /// Creates a configuration for testing with a small dungeon and instant moves.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            total_rooms: 5,
            move_duration: 0.0,
            ..Self::new(seed)
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> WarrenResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> WarrenResult<String> {
        serde_json::to_string_pretty(self).map_err(WarrenError::from)
    }

    /// Loads a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> WarrenResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks that the configuration can drive a generator.
    pub fn validate(&self) -> WarrenResult<()> {
        if self.late_stage_min <= self.early_stage_max {
            return Err(WarrenError::InvalidState(format!(
                "late_stage_min ({}) must be above early_stage_max ({})",
                self.late_stage_min, self.early_stage_max
            )));
        }
        for profile in [&self.early_profile, &self.mid_profile, &self.late_profile] {
            profile.validate()?;
        }
        if self.move_duration < 0.0 || !self.move_duration.is_finite() {
            return Err(WarrenError::InvalidState(
                "move_duration must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Which difficulty tier a stage belongs to.
    pub fn tier(&self, stage: u32) -> StageTier {
        if stage <= self.early_stage_max {
            StageTier::Early
        } else if stage >= self.late_stage_min {
            StageTier::Late
        } else {
            StageTier::Mid
        }
    }

    /// The generation profile used for a stage.
    pub fn profile(&self, stage: u32) -> &StageProfile {
        match self.tier(stage) {
            StageTier::Early => &self.early_profile,
            StageTier::Mid => &self.mid_profile,
            StageTier::Late => &self.late_profile,
        }
    }

    /// Whether border walls are breakable at this stage.
    pub fn walls_destructible(&self, stage: u32) -> bool {
        stage <= self.early_stage_max
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Coarse difficulty band a stage falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageTier {
    Early,
    Mid,
    Late,
}

/// Stage-dependent generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    /// Weights for rooms that are neither the start nor the exit
    pub room_type_weights: RoomTypeWeights,
    /// Fewest loop edges added on top of the main path
    pub min_extra_edges: u32,
    /// Most loop edges added on top of the main path
    pub max_extra_edges: u32,
}

impl StageProfile {
    fn validate(&self) -> WarrenResult<()> {
        if self.min_extra_edges > self.max_extra_edges {
            return Err(WarrenError::InvalidState(format!(
                "extra edge range {}..={} is empty",
                self.min_extra_edges, self.max_extra_edges
            )));
        }
        self.room_type_weights.validate()
    }
}

/// Relative weights of the randomly assigned room types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTypeWeights {
    pub empty: f64,
    pub tactical: f64,
    pub hunt: f64,
    pub puzzle: f64,
    pub key_event: f64,
}

impl RoomTypeWeights {
    fn entries(&self) -> [(RoomType, f64); 5] {
        [
            (RoomType::Empty, self.empty),
            (RoomType::Tactical, self.tactical),
            (RoomType::Hunt, self.hunt),
            (RoomType::Puzzle, self.puzzle),
            (RoomType::KeyEvent, self.key_event),
        ]
    }

    fn total(&self) -> f64 {
        self.entries().iter().map(|(_, weight)| weight).sum()
    }

    fn validate(&self) -> WarrenResult<()> {
        let entries = self.entries();
        if entries.iter().any(|(_, weight)| *weight < 0.0 || !weight.is_finite()) {
            return Err(WarrenError::InvalidState(
                "room type weights must be finite and non-negative".to_string(),
            ));
        }
        if self.total() <= 0.0 {
            return Err(WarrenError::InvalidState(
                "room type weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Maps a roll in [0, 1) onto the cumulative weight table.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{GenerationConfig, RoomType};
    ///
    /// let weights = &GenerationConfig::default().early_profile.room_type_weights;
    /// assert_eq!(weights.pick(0.0), RoomType::Empty);
    /// assert_eq!(weights.pick(0.999), RoomType::KeyEvent);
    /// ```
    pub fn pick(&self, roll: f64) -> RoomType {
        let total = self.total();
        let mut cumulative = 0.0;
        for (room_type, weight) in self.entries() {
            cumulative += weight / total;
            if roll < cumulative {
                return room_type;
            }
        }
        RoomType::Empty
    }
}

/// The gameplay purpose of a room, which selects its content strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    /// Quiet room; the start room is always empty
    Empty,
    /// Cover walls and traps for fights
    Tactical,
    /// Pillars that enemies use as cover
    Hunt,
    /// Interactive objects to solve
    Puzzle,
    /// Story or key-item room with minimal furnishing
    KeyEvent,
    /// The dungeon's last room
    Exit,
}

/// A node of the dungeon graph.
///
/// Rooms are created with no connections, wired up by the graph generator, and get their
/// tile grid on first entry. Updates produce new values that replace the room's slot in
/// its owning table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique, stable identifier (also the room's index in the graph)
    pub id: u32,
    /// Type/purpose of this room
    pub room_type: RoomType,
    /// Ids of connected rooms, sorted and without duplicates once generation finishes
    pub connections: Vec<u32>,
    /// Whether the tile grid has been generated
    pub is_generated: bool,
    /// Whether the room's objective has been satisfied
    pub is_completed: bool,
    /// Tile contents, present once generated
    pub grid: Option<RoomGrid>,
}

impl Room {
    /// Creates a new room with no connections and no contents.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Room, RoomType};
    ///
    /// let room = Room::new(3, RoomType::Hunt);
    /// assert_eq!(room.id, 3);
    /// assert!(room.connections.is_empty());
    /// assert!(!room.is_generated);
    /// ```
    pub fn new(id: u32, room_type: RoomType) -> Self {
        Self {
            id,
            room_type,
            connections: Vec::new(),
            is_generated: false,
            is_completed: false,
            grid: None,
        }
    }

    /// Adds a connection to another room.
    pub fn add_connection(&mut self, room_id: u32) {
        if room_id != self.id && !self.connections.contains(&room_id) {
            self.connections.push(room_id);
        }
    }

    /// Removes a connection to another room.
    pub fn remove_connection(&mut self, room_id: u32) {
        self.connections.retain(|&id| id != room_id);
    }

    pub fn is_connected_to(&self, room_id: u32) -> bool {
        self.connections.contains(&room_id)
    }

    /// Sorts and deduplicates the connection list.
    pub fn finalize_connections(&mut self) {
        self.connections.sort_unstable();
        self.connections.dedup();
    }

    /// Returns a completed copy of this room.
    pub fn with_completed(self) -> Self {
        Self {
            is_completed: true,
            ..self
        }
    }

    /// Returns a copy of this room holding the given grid.
    pub fn with_grid(self, grid: RoomGrid) -> Self {
        Self {
            grid: Some(grid),
            is_generated: true,
            ..self
        }
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> WarrenResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Derives a seed for a sub-generator so that streams stay independent.
    pub fn derive_seed(seed: u64, salt: u64) -> u64 {
        seed.wrapping_mul(6364136223846793005).wrapping_add(salt)
    }
}
