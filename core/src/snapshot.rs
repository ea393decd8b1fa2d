//! Wire-level snapshot types.
//!
//! A snapshot is one complete description of the simulation at one step.
//! Field names are wire-stable; the simulation side is not under our control.

use crate::types::{AgentKind, EntityId, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub id:       EntityId,
    #[serde(rename = "type")]
    pub kind:     AgentKind,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color:    Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLightState {
    HorizontalGreen,
    VerticalGreen,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSnapshot {
    pub agents:              Vec<AgentSnapshot>,
    /// Simulation tick. Monotonic on the sender side; not enforced here.
    pub step:                i64,
    pub traffic_light_state: TrafficLightState,
    pub obstacles_removed:   i64,
}

impl SimulationSnapshot {
    pub fn meta(&self) -> SnapshotMeta {
        SnapshotMeta {
            step:                self.step,
            traffic_light_state: self.traffic_light_state,
            obstacles_removed:   self.obstacles_removed,
            agent_count:         self.agents.len(),
        }
    }
}

/// Display metadata of the most recently applied snapshot.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub step:                i64,
    pub traffic_light_state: TrafficLightState,
    pub obstacles_removed:   i64,
    pub agent_count:         usize,
}
