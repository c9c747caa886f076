//! # Reachability
//!
//! A* search answering whether one grid cell can be reached from another.

use crate::{Position, RoomGrid};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Yes/no path oracle over a room grid.
///
/// Movement is 4-connected with unit step cost and a Manhattan heuristic. Only the
/// answer is returned; callers never need the path itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachabilityValidator;

impl ReachabilityValidator {
    pub fn new() -> Self {
        Self
    }

    /// Returns true when `end` can be reached from `start` through passable cells.
    ///
    /// Either endpoint being out of bounds or impassable makes the answer false.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{Position, ReachabilityValidator, RoomGrid};
    ///
    /// let grid = RoomGrid::room();
    /// let validator = ReachabilityValidator::new();
    /// assert!(validator.is_path_available(&grid, Position::new(1, 1), Position::new(9, 9)));
    /// ```
    pub fn is_path_available(&self, grid: &RoomGrid, start: Position, end: Position) -> bool {
        if !grid.is_passable(start) || !grid.is_passable(end) {
            return false;
        }
        if start == end {
            return true;
        }

        let mut open_set = BinaryHeap::new();
        let mut closed = HashSet::new();
        let mut g_score: HashMap<Position, u32> = HashMap::new();

        g_score.insert(start, 0);
        open_set.push(AStarNode {
            position: start,
            f_score: start.manhattan_distance(end),
        });

        while let Some(current_node) = open_set.pop() {
            let current = current_node.position;

            if current == end {
                return true;
            }
            if !closed.insert(current) {
                continue;
            }

            let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);

            for neighbor in current.cardinal_adjacent_positions() {
                if closed.contains(&neighbor) || !grid.is_passable(neighbor) {
                    continue;
                }

                let tentative_g_score = current_g + 1;
                if tentative_g_score < g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                    g_score.insert(neighbor, tentative_g_score);
                    open_set.push(AStarNode {
                        position: neighbor,
                        f_score: tentative_g_score + neighbor.manhattan_distance(end),
                    });
                }
            }
        }

        false
    }
}

/// Open-set entry for the A* search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AStarNode {
    position: Position,
    f_score: u32,
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior; ties break on the lowest (x, y).
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.position.x.cmp(&self.position.x))
            .then_with(|| other.position.y.cmp(&self.position.y))
    }
}
