//! # Utilities Module
//!
//! Utility functions for movement mathematics and grid pathfinding.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use pathfinding::*;
