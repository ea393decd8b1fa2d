//! Shared primitive types used across the whole bridge.

use serde::{Deserialize, Serialize};

/// One tick-driver cycle.
pub type Cycle = u64;

/// A stable, unique identifier for any tracked agent.
pub type EntityId = String;

/// A 2D ground-plane coordinate as sent by the simulation.
///
/// The view layer maps `y` onto its scene depth axis with a fixed height
/// offset; the core never deals in 3D.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `to`.
    pub fn displacement_to(&self, to: &Position) -> (f64, f64) {
        (to.x - self.x, to.y - self.y)
    }

    /// True when either axis lies strictly beyond `half_extent`.
    pub fn outside_square(&self, half_extent: f64) -> bool {
        self.x.abs() > half_extent || self.y.abs() > half_extent
    }
}

/// Ground-plane facing direction, always unit length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Heading {
    pub x: f64,
    pub y: f64,
}

impl Heading {
    /// Normalize a displacement. Returns None for a zero (or non-finite) vector.
    pub fn from_displacement(dx: f64, dy: f64) -> Option<Self> {
        let len = dx.hypot(dy);
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Self { x: dx / len, y: dy / len })
    }

    /// Yaw in radians around the vertical axis, measured from +y toward +x.
    pub fn yaw(&self) -> f64 {
        self.x.atan2(self.y)
    }
}

/// Closed set of agent kinds. `Unknown` is the explicit fallback for any
/// `type` string the simulation sends that the bridge does not recognize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Pedestrian,
    Vehicle,
    Authority,
    Obstacle,
    #[serde(other)]
    Unknown,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pedestrian => "pedestrian",
            Self::Vehicle    => "vehicle",
            Self::Authority  => "authority",
            Self::Obstacle   => "obstacle",
            Self::Unknown    => "unknown",
        }
    }

    /// Only vehicles are subject to the boundary sweep.
    pub fn is_boundary_evicted(&self) -> bool {
        matches!(self, Self::Vehicle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_is_unit_length() {
        let h = Heading::from_displacement(3.0, 4.0).unwrap();
        assert!((h.x - 0.6).abs() < 1e-12);
        assert!((h.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_displacement_has_no_heading() {
        assert!(Heading::from_displacement(0.0, 0.0).is_none());
    }

    #[test]
    fn boundary_is_strict() {
        assert!(!Position::new(25.0, -25.0).outside_square(25.0));
        assert!(Position::new(25.01, 0.0).outside_square(25.0));
        assert!(Position::new(0.0, -30.0).outside_square(25.0));
    }
}
