//! # Movement Mathematics
//!
//! Continuous coordinates, interpolation and input quantization.

use crate::Position;
use serde::{Deserialize, Serialize};

/// A point in continuous (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

impl WorldPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between `self` and `target`, with `t` clamped to [0, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::WorldPoint;
    ///
    /// let a = WorldPoint::new(0.0, 0.0);
    /// let b = WorldPoint::new(2.0, 4.0);
    /// assert_eq!(a.lerp(b, 0.5), WorldPoint::new(1.0, 2.0));
    /// ```
    pub fn lerp(self, target: WorldPoint, t: f32) -> WorldPoint {
        let t = t.clamp(0.0, 1.0);
        WorldPoint::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }

    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Maps integer grid cells onto continuous coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    /// World position of the corner of cell (0, 0)
    pub origin: WorldPoint,
    /// Side length of one cell
    pub cell_size: f32,
}

impl GridFrame {
    pub fn new(origin: WorldPoint, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    /// Unit cells with cell (0, 0) at the origin.
    pub fn unit() -> Self {
        Self::new(WorldPoint::default(), 1.0)
    }

    /// Center of a cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{GridFrame, Position, WorldPoint};
    ///
    /// let frame = GridFrame::unit();
    /// assert_eq!(frame.cell_center(Position::new(2, 3)), WorldPoint::new(2.5, 3.5));
    /// ```
    pub fn cell_center(&self, cell: Position) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (cell.x as f32 + 0.5) * self.cell_size,
            self.origin.y + (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    /// Cell containing a point.
    pub fn cell_at(&self, point: WorldPoint) -> Position {
        Position::new(
            ((point.x - self.origin.x) / self.cell_size).floor() as i32,
            ((point.y - self.origin.y) / self.cell_size).floor() as i32,
        )
    }
}

impl Default for GridFrame {
    fn default() -> Self {
        Self::unit()
    }
}

/// Snaps an analog input vector to a single cardinal grid step.
///
/// The larger-magnitude component wins; exact ties resolve to the horizontal axis.
/// A zero (or non-finite) vector yields `None`.
///
/// # Examples
///
/// ```
/// use warren::{quantize_direction, Position};
///
/// assert_eq!(quantize_direction(0.9, 0.2), Some(Position::new(1, 0)));
/// assert_eq!(quantize_direction(0.2, 0.9), Some(Position::new(0, 1)));
/// assert_eq!(quantize_direction(0.5, 0.5), Some(Position::new(1, 0)));
/// ```
pub fn quantize_direction(x: f32, y: f32) -> Option<Position> {
    if !x.is_finite() || !y.is_finite() || (x == 0.0 && y == 0.0) {
        return None;
    }

    if x.abs() >= y.abs() {
        Some(Position::new(x.signum() as i32, 0))
    } else {
        Some(Position::new(0, y.signum() as i32))
    }
}
