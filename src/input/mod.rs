//! # Input Module
//!
//! Turns directional intents into movement commands.
//!
//! The controller owns the command invoker and the receiver. It quantizes analog input to a
//! single cardinal step, redirects steps onto door tiles to room transitions, and keeps an
//! input lock that the step's completion callback releases.

pub mod commands;
pub mod motion;

pub use commands::*;
pub use motion::*;

use crate::{
    quantize_direction, GenerationConfig, GridFrame, Position, RoomEvent, RoomOccupancyGrid,
    TileType, WorldPoint,
};
use std::cell::Cell;
use std::rc::Rc;

/// Result of a movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// No usable direction in the input
    Ignored,
    /// A step started
    Moved,
    /// The step was rejected and the entity did not move
    Blocked,
    /// The step targets a door; the caller should request a room transition instead
    DoorReached { door: Position, kind: TileType },
}

/// Movement front end for one entity.
///
/// # Examples
///
/// ```
/// use warren::{MoveOutcome, MovementController, Position, WorldPoint};
///
/// let mut controller = MovementController::new(0.0);
/// controller.place(WorldPoint::new(2.5, 2.5));
///
/// assert_eq!(controller.request_move(0.9, 0.2), MoveOutcome::Moved);
/// assert_eq!(controller.cell(), Position::new(3, 2));
///
/// assert!(controller.undo());
/// assert_eq!(controller.cell(), Position::new(2, 2));
/// ```
#[derive(Debug)]
pub struct MovementController {
    invoker: CommandInvoker,
    receiver: MovementReceiver,
    input_locked: Rc<Cell<bool>>,
    active_room: Option<u32>,
}

impl MovementController {
    pub fn new(move_duration: f32) -> Self {
        Self::with_frame(GridFrame::unit(), move_duration)
    }

    /// Controller whose room cells map to world space through `frame`.
    pub fn with_frame(frame: GridFrame, move_duration: f32) -> Self {
        Self {
            invoker: CommandInvoker::new(),
            receiver: MovementReceiver::new(frame, move_duration),
            input_locked: Rc::new(Cell::new(false)),
            active_room: None,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.move_duration)
    }

    /// Reacts to room activation: loads the room's grid and puts the entity on its spawn.
    ///
    /// The spawn cell is placed through this controller's own frame, so the entity lands on
    /// `grid_position` whatever frame produced the event's world position.
    pub fn handle_event(&mut self, event: &RoomEvent) {
        if let RoomEvent::Activated {
            room_id,
            grid_position,
            grid,
            ..
        } = event
        {
            self.receiver.set_local_grid(grid.clone());
            self.receiver
                .place(self.receiver.frame().cell_center(*grid_position));
            self.invoker.clear_history();
            self.input_locked.set(false);
            self.active_room = Some(*room_id);
            log::debug!("Movement now in room {} at {:?}", room_id, grid_position);
        }
    }

    /// Requests a one-cell step inside the active room from an analog input vector.
    pub fn request_move(&mut self, x: f32, y: f32) -> MoveOutcome {
        let Some(delta) = quantize_direction(x, y) else {
            return MoveOutcome::Ignored;
        };
        self.supersede();

        let target = self.receiver.cell() + delta;
        if let Some(tile) = self
            .receiver
            .local_grid()
            .and_then(|grid| grid.get_tile(target))
        {
            if tile.tile_type().is_door() {
                return MoveOutcome::DoorReached {
                    door: target,
                    kind: tile.tile_type(),
                };
            }
        }

        let command = MoveInGridCommand::new(delta).on_complete(self.unlock_callback());
        self.run(Box::new(command))
    }

    /// Requests a one-room step on the room occupancy grid.
    pub fn request_room_move(&mut self, x: f32, y: f32) -> MoveOutcome {
        let Some(delta) = quantize_direction(x, y) else {
            return MoveOutcome::Ignored;
        };
        self.supersede();

        let command = MoveAcrossRoomsCommand::new(delta).on_complete(self.unlock_callback());
        self.run(Box::new(command))
    }

    /// Undoes the last successful step, cancelling any step in flight first.
    pub fn undo(&mut self) -> bool {
        self.interrupt();
        self.invoker.undo_last_command(&mut self.receiver)
    }

    /// Advances the step in flight.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.receiver.tick(dt)
    }

    pub fn set_room_grid(&mut self, grid: RoomOccupancyGrid) {
        self.receiver.set_room_grid(grid);
    }

    pub fn place(&mut self, point: WorldPoint) {
        self.receiver.place(point);
    }

    pub fn position(&self) -> WorldPoint {
        self.receiver.position()
    }

    pub fn cell(&self) -> Position {
        self.receiver.cell()
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked.get()
    }

    pub fn is_moving(&self) -> bool {
        self.receiver.is_moving()
    }

    pub fn active_room(&self) -> Option<u32> {
        self.active_room
    }

    pub fn history_len(&self) -> usize {
        self.invoker.history_len()
    }

    pub fn receiver(&self) -> &MovementReceiver {
        &self.receiver
    }

    fn run(&mut self, command: Box<dyn MoveCommand>) -> MoveOutcome {
        self.input_locked.set(true);
        self.invoker.set_command(command);
        if self.invoker.execute_command(&mut self.receiver) {
            MoveOutcome::Moved
        } else {
            self.input_locked.set(false);
            MoveOutcome::Blocked
        }
    }

    /// Cancels a step in flight; its callback will never run, so the lock is released here.
    fn interrupt(&mut self) -> bool {
        let cancelled = self.receiver.cancel_motion();
        if cancelled {
            self.input_locked.set(false);
        }
        cancelled
    }

    /// Cancels a step in flight ahead of a new request. The cancelled step never landed, so
    /// it leaves the undo history too.
    fn supersede(&mut self) {
        if self.interrupt() {
            self.invoker.discard_last();
        }
    }

    fn unlock_callback(&self) -> CompletionCallback {
        let lock = Rc::clone(&self.input_locked);
        Box::new(move || lock.set(false))
    }
}

impl Default for MovementController {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MOVE_DURATION)
    }
}
