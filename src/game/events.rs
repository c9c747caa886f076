//! # Room Events
//!
//! Notices published by the session layer when the player changes, clears or activates a room.

use crate::{Position, RoomGrid, WorldPoint};
use serde::{Deserialize, Serialize};

/// Events published on room transitions, completion and activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomEvent {
    /// The current room changed. `from` is `None` for the first room of a dungeon.
    Transition {
        from: Option<u32>,
        to: u32,
        /// Whether the room being left had been completed
        was_completed: bool,
    },
    /// The current room's objective was satisfied.
    Completed { room_id: u32 },
    /// A room became the active room and the player should appear in it.
    Activated {
        room_id: u32,
        /// Spawn point in continuous coordinates (cell centers)
        spawn_position: WorldPoint,
        /// Spawn cell in grid coordinates
        grid_position: Position,
        /// Snapshot of the room's tiles, used to refresh local movement checks
        grid: RoomGrid,
    },
}

impl RoomEvent {
    /// Room the event is about (the destination for transitions).
    pub fn room_id(&self) -> u32 {
        match self {
            RoomEvent::Transition { to, .. } => *to,
            RoomEvent::Completed { room_id } => *room_id,
            RoomEvent::Activated { room_id, .. } => *room_id,
        }
    }
}

/// Publish-only destination for room events.
pub trait EventSink {
    fn publish(&mut self, event: RoomEvent);
}

/// Collects events in order; handy for callers that poll instead of reacting.
impl EventSink for Vec<RoomEvent> {
    fn publish(&mut self, event: RoomEvent) {
        self.push(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: RoomEvent) {}
}
