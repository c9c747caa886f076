//! # Movement Receiver
//!
//! Holds the moving entity's position and advances interpolated steps tick by tick.
//!
//! A step is an explicit state machine: `Idle` or `Moving`. Each tick advances the elapsed
//! time and interpolates; when the elapsed time reaches the duration the position snaps to
//! the target and the step's completion callback runs. Cancelling restores the last stable
//! position.

use crate::{GridFrame, Position, RoomGrid, RoomOccupancyGrid, WorldPoint};
use std::fmt;

/// Callback run once when a step finishes.
pub type CompletionCallback = Box<dyn FnOnce()>;

/// Interpolation state of the receiver.
#[derive(Default)]
pub enum MotionState {
    #[default]
    Idle,
    Moving {
        start: WorldPoint,
        target: WorldPoint,
        elapsed: f32,
        duration: f32,
        on_complete: Option<CompletionCallback>,
    },
}

impl MotionState {
    pub fn is_moving(&self) -> bool {
        matches!(self, MotionState::Moving { .. })
    }
}

impl fmt::Debug for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionState::Idle => write!(f, "Idle"),
            MotionState::Moving {
                start,
                target,
                elapsed,
                duration,
                on_complete,
            } => f
                .debug_struct("Moving")
                .field("start", start)
                .field("target", target)
                .field("elapsed", elapsed)
                .field("duration", duration)
                .field("has_callback", &on_complete.is_some())
                .finish(),
        }
    }
}

/// The entity commands act on.
#[derive(Debug)]
pub struct MovementReceiver {
    position: WorldPoint,
    stable_position: WorldPoint,
    frame: GridFrame,
    local_grid: Option<RoomGrid>,
    room_grid: Option<RoomOccupancyGrid>,
    motion: MotionState,
    move_duration: f32,
}

impl MovementReceiver {
    /// Creates a receiver resting at the center of cell (0, 0).
    pub fn new(frame: GridFrame, move_duration: f32) -> Self {
        let start = frame.cell_center(Position::origin());
        Self {
            position: start,
            stable_position: start,
            frame,
            local_grid: None,
            room_grid: None,
            motion: MotionState::Idle,
            move_duration: move_duration.max(0.0),
        }
    }

    /// Current, possibly interpolated, position.
    pub fn position(&self) -> WorldPoint {
        self.position
    }

    /// Last position the entity rested at.
    pub fn stable_position(&self) -> WorldPoint {
        self.stable_position
    }

    /// Local grid cell of the stable position.
    pub fn cell(&self) -> Position {
        self.frame.cell_at(self.stable_position)
    }

    pub fn frame(&self) -> GridFrame {
        self.frame
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_moving()
    }

    pub fn move_duration(&self) -> f32 {
        self.move_duration
    }

    pub fn local_grid(&self) -> Option<&RoomGrid> {
        self.local_grid.as_ref()
    }

    /// Replaces the grid in-room moves are checked against.
    pub fn set_local_grid(&mut self, grid: RoomGrid) {
        self.local_grid = Some(grid);
    }

    pub fn room_grid(&self) -> Option<&RoomOccupancyGrid> {
        self.room_grid.as_ref()
    }

    /// Replaces the occupancy grid cross-room moves are checked against.
    pub fn set_room_grid(&mut self, grid: RoomOccupancyGrid) {
        self.room_grid = Some(grid);
    }

    /// Puts the entity at an exact point, dropping any step in flight.
    pub fn place(&mut self, point: WorldPoint) {
        self.motion = MotionState::Idle;
        self.position = point;
        self.stable_position = point;
    }

    /// Steps by `delta` cells inside the current room.
    ///
    /// With a local grid loaded, targets outside it or on impassable tiles are rejected.
    /// Without one every cell is open.
    pub fn move_in_grid(&mut self, delta: Position, on_complete: Option<CompletionCallback>) -> bool {
        self.cancel_motion();

        let target = self.frame.cell_at(self.stable_position) + delta;
        if let Some(grid) = &self.local_grid {
            if !grid.is_passable(target) {
                return false;
            }
        }

        let point = self.frame.cell_center(target);
        self.begin_motion(point, on_complete);
        true
    }

    /// Steps by `delta` room cells on the occupancy grid.
    ///
    /// The step is applied to a snapshot first; an out-of-bounds or empty target rolls the
    /// position back to the snapshot.
    pub fn move_across_rooms(&mut self, delta: Position, on_complete: Option<CompletionCallback>) -> bool {
        self.cancel_motion();

        let Some(grid) = &self.room_grid else {
            log::warn!("Cross-room move requested without an occupancy grid");
            return false;
        };

        let snapshot = self.stable_position;
        let target = grid.cell_at(snapshot) + delta;
        let point = grid.cell_center(target);
        self.position = point;

        if !grid.is_passable(target) {
            self.position = snapshot;
            return false;
        }

        self.position = snapshot;
        self.begin_motion(point, on_complete);
        true
    }

    /// Advances a step in flight by `dt` seconds. Returns `true` on the tick it completes.
    pub fn tick(&mut self, dt: f32) -> bool {
        let finished = match &mut self.motion {
            MotionState::Idle => return false,
            MotionState::Moving {
                start,
                target,
                elapsed,
                duration,
                ..
            } => {
                *elapsed += dt.max(0.0);
                if *elapsed >= *duration {
                    true
                } else {
                    self.position = start.lerp(*target, *elapsed / *duration);
                    false
                }
            }
        };

        if finished {
            self.finish_motion();
        }
        finished
    }

    /// Stops a step in flight and restores the last stable position.
    ///
    /// The cancelled step's completion callback never runs.
    pub fn cancel_motion(&mut self) -> bool {
        if !self.motion.is_moving() {
            return false;
        }
        self.motion = MotionState::Idle;
        self.position = self.stable_position;
        true
    }

    fn begin_motion(&mut self, target: WorldPoint, on_complete: Option<CompletionCallback>) {
        self.motion = MotionState::Moving {
            start: self.position,
            target,
            elapsed: 0.0,
            duration: self.move_duration,
            on_complete,
        };
        if self.move_duration <= 0.0 {
            self.finish_motion();
        }
    }

    fn finish_motion(&mut self) {
        if let MotionState::Moving {
            target, on_complete, ..
        } = std::mem::take(&mut self.motion)
        {
            self.position = target;
            self.stable_position = target;
            if let Some(callback) = on_complete {
                callback();
            }
        }
    }
}

impl Default for MovementReceiver {
    fn default() -> Self {
        Self::new(GridFrame::unit(), crate::config::DEFAULT_MOVE_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tile, TileType};
    use std::cell::Cell;
    use std::rc::Rc;

    fn walled_grid() -> RoomGrid {
        let mut grid = RoomGrid::room();
        for pos in grid.border_positions() {
            grid.set_tile(pos, Tile::wall(false)).unwrap();
        }
        grid
    }

    #[test]
    fn test_instant_move_snaps_to_cell_center() {
        let mut receiver = MovementReceiver::new(GridFrame::unit(), 0.0);
        receiver.place(WorldPoint::new(3.2, 3.9));
        assert!(receiver.move_in_grid(Position::new(1, 0), None));
        assert_eq!(receiver.position(), WorldPoint::new(4.5, 3.5));
        assert!(!receiver.is_moving());
    }

    #[test]
    fn test_interpolation_over_ticks() {
        let mut receiver = MovementReceiver::new(GridFrame::unit(), 1.0);
        receiver.place(WorldPoint::new(2.5, 2.5));
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();

        assert!(receiver.move_in_grid(Position::new(0, 1), Some(Box::new(move || flag.set(true)))));
        assert!(!receiver.tick(0.5));
        assert_eq!(receiver.position(), WorldPoint::new(2.5, 3.0));
        assert_eq!(receiver.stable_position(), WorldPoint::new(2.5, 2.5));
        assert!(!done.get());

        assert!(receiver.tick(0.75));
        assert_eq!(receiver.position(), WorldPoint::new(2.5, 3.5));
        assert_eq!(receiver.stable_position(), WorldPoint::new(2.5, 3.5));
        assert!(done.get());
        assert!(!receiver.tick(0.1));
    }

    #[test]
    fn test_cancel_restores_stable_position() {
        let mut receiver = MovementReceiver::new(GridFrame::unit(), 1.0);
        receiver.place(WorldPoint::new(2.5, 2.5));
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        receiver.move_in_grid(Position::new(1, 0), Some(Box::new(move || flag.set(true))));
        receiver.tick(0.3);

        assert!(receiver.cancel_motion());
        assert_eq!(receiver.position(), WorldPoint::new(2.5, 2.5));
        assert!(!fired.get());
        assert!(!receiver.cancel_motion());
    }

    #[test]
    fn test_new_move_cancels_previous() {
        let mut receiver = MovementReceiver::new(GridFrame::unit(), 1.0);
        receiver.place(WorldPoint::new(2.5, 2.5));
        receiver.move_in_grid(Position::new(1, 0), None);
        receiver.tick(0.5);
        receiver.move_in_grid(Position::new(0, 1), None);
        receiver.tick(1.0);
        assert_eq!(receiver.position(), WorldPoint::new(2.5, 3.5));
    }

    #[test]
    fn test_local_grid_blocks_walls() {
        let mut receiver = MovementReceiver::new(GridFrame::unit(), 0.0);
        receiver.set_local_grid(walled_grid());
        receiver.place(WorldPoint::new(1.5, 1.5));
        assert!(!receiver.move_in_grid(Position::new(-1, 0), None));
        assert_eq!(receiver.cell(), Position::new(1, 1));
        assert!(receiver.move_in_grid(Position::new(1, 0), None));
        assert_eq!(receiver.cell(), Position::new(2, 1));
        assert_eq!(
            receiver.local_grid().unwrap().get_tile(Position::new(0, 1)).unwrap().tile_type(),
            TileType::Wall
        );
    }

    #[test]
    fn test_cross_room_move_without_grid_is_rejected() {
        let mut receiver = MovementReceiver::new(GridFrame::unit(), 0.0);
        let before = receiver.position();
        assert!(!receiver.move_across_rooms(Position::new(1, 0), None));
        assert_eq!(receiver.position(), before);
    }
}
