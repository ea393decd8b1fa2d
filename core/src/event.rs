//! Lifecycle notifications emitted by the reconciler.
//!
//! RULE: The view layer learns about entities ONLY through these events.
//! It never holds or mutates EntityState.

use crate::types::{AgentKind, EntityId, Heading, Position};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityEvent {
    Created {
        id:       EntityId,
        kind:     AgentKind,
        position: Position,
        color:    Option<String>,
    },
    Updated {
        id:       EntityId,
        position: Position,
        /// Current facing; None until the entity has moved at least once.
        heading:  Option<Heading>,
    },
    Removed {
        id:     EntityId,
        reason: RemovalReason,
    },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The id was missing from the latest snapshot.
    Absent,
    /// A vehicle left the boundary square.
    OutOfBounds,
    /// The snapshot reports a different kind; a Created with the new kind follows.
    KindChanged,
}

impl EntityEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::Created { id, .. } | Self::Updated { id, .. } | Self::Removed { id, .. } => id,
        }
    }
}
