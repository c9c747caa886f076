//! # Movement Commands
//!
//! Moves are command objects run through an invoker. The invoker keeps one pending command
//! and a LIFO history of commands that executed successfully; undo pops the history. There
//! is no redo.

use super::motion::{CompletionCallback, MovementReceiver};
use crate::{Position, WorldPoint};
use std::fmt;

/// A reversible movement command.
pub trait MoveCommand: fmt::Debug {
    /// Applies the command. Returns `false` when the move was rejected.
    fn execute(&mut self, receiver: &mut MovementReceiver) -> bool;

    /// Returns the receiver to exactly where it rested before `execute`.
    fn undo(&mut self, receiver: &mut MovementReceiver);
}

/// One-cell step inside the current room.
pub struct MoveInGridCommand {
    delta: Position,
    previous: Option<WorldPoint>,
    on_complete: Option<CompletionCallback>,
}

impl MoveInGridCommand {
    pub fn new(delta: Position) -> Self {
        Self {
            delta,
            previous: None,
            on_complete: None,
        }
    }

    /// Runs `callback` when the step finishes.
    pub fn on_complete(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    pub fn delta(&self) -> Position {
        self.delta
    }
}

impl fmt::Debug for MoveInGridCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveInGridCommand")
            .field("delta", &self.delta)
            .field("previous", &self.previous)
            .finish()
    }
}

impl MoveCommand for MoveInGridCommand {
    fn execute(&mut self, receiver: &mut MovementReceiver) -> bool {
        receiver.cancel_motion();
        let previous = receiver.stable_position();
        if receiver.move_in_grid(self.delta, self.on_complete.take()) {
            self.previous = Some(previous);
            true
        } else {
            false
        }
    }

    fn undo(&mut self, receiver: &mut MovementReceiver) {
        if let Some(previous) = self.previous.take() {
            receiver.place(previous);
        }
    }
}

/// One-room step on the room occupancy grid.
pub struct MoveAcrossRoomsCommand {
    delta: Position,
    previous: Option<WorldPoint>,
    on_complete: Option<CompletionCallback>,
}

impl MoveAcrossRoomsCommand {
    pub fn new(delta: Position) -> Self {
        Self {
            delta,
            previous: None,
            on_complete: None,
        }
    }

    pub fn on_complete(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }
}

impl fmt::Debug for MoveAcrossRoomsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveAcrossRoomsCommand")
            .field("delta", &self.delta)
            .field("previous", &self.previous)
            .finish()
    }
}

impl MoveCommand for MoveAcrossRoomsCommand {
    fn execute(&mut self, receiver: &mut MovementReceiver) -> bool {
        receiver.cancel_motion();
        let previous = receiver.stable_position();
        if receiver.move_across_rooms(self.delta, self.on_complete.take()) {
            self.previous = Some(previous);
            true
        } else {
            false
        }
    }

    fn undo(&mut self, receiver: &mut MovementReceiver) {
        if let Some(previous) = self.previous.take() {
            receiver.place(previous);
        }
    }
}

/// Runs commands and keeps the undo history.
#[derive(Debug, Default)]
pub struct CommandInvoker {
    pending: Option<Box<dyn MoveCommand>>,
    history: Vec<Box<dyn MoveCommand>>,
}

impl CommandInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the next command, replacing any pending one.
    pub fn set_command(&mut self, command: Box<dyn MoveCommand>) {
        self.pending = Some(command);
    }

    /// Executes the pending command. Only successful commands enter the history.
    pub fn execute_command(&mut self, receiver: &mut MovementReceiver) -> bool {
        let Some(mut command) = self.pending.take() else {
            return false;
        };

        if command.execute(receiver) {
            self.history.push(command);
            true
        } else {
            log::trace!("Command rejected: {:?}", command);
            false
        }
    }

    /// Undoes the most recent successful command.
    pub fn undo_last_command(&mut self, receiver: &mut MovementReceiver) -> bool {
        match self.history.pop() {
            Some(mut command) => {
                command.undo(receiver);
                true
            }
            None => false,
        }
    }

    /// Drops the most recent command from the history without undoing it.
    pub fn discard_last(&mut self) -> bool {
        self.history.pop().is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
