//! The collaborator seam toward whatever renders entities.
//!
//! Instantiation is dispatched on the closed `AgentKind` enum: one spawn
//! method per kind, each defaulting to `spawn_fallback`. `Unknown` always
//! goes to the fallback.

use crate::{
    config::KindHint,
    event::{EntityEvent, RemovalReason},
    snapshot::SnapshotMeta,
    types::{AgentKind, Heading, Position},
};
use std::collections::HashMap;

pub trait EntityView {
    /// Generic instantiation used for `Unknown` and for any kind the view
    /// does not specialize.
    fn spawn_fallback(&mut self, id: &str, kind: AgentKind, at: Position, color: Option<&str>);

    fn spawn_pedestrian(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn_fallback(id, AgentKind::Pedestrian, at, color);
    }

    fn spawn_vehicle(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn_fallback(id, AgentKind::Vehicle, at, color);
    }

    fn spawn_authority(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn_fallback(id, AgentKind::Authority, at, color);
    }

    fn spawn_obstacle(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn_fallback(id, AgentKind::Obstacle, at, color);
    }

    fn update(&mut self, id: &str, at: Position, heading: Option<Heading>);

    /// Release whatever the view holds for `id`.
    fn remove(&mut self, id: &str, reason: RemovalReason);

    fn metadata(&mut self, _meta: &SnapshotMeta) {}
}

/// Route one event to the matching view call.
pub fn dispatch<V: EntityView + ?Sized>(view: &mut V, event: &EntityEvent) {
    match event {
        EntityEvent::Created { id, kind, position, color } => {
            let color = color.as_deref();
            match kind {
                AgentKind::Pedestrian => view.spawn_pedestrian(id, *position, color),
                AgentKind::Vehicle    => view.spawn_vehicle(id, *position, color),
                AgentKind::Authority  => view.spawn_authority(id, *position, color),
                AgentKind::Obstacle   => view.spawn_obstacle(id, *position, color),
                AgentKind::Unknown    => view.spawn_fallback(id, *kind, *position, color),
            }
        }
        EntityEvent::Updated { id, position, heading } => view.update(id, *position, *heading),
        EntityEvent::Removed { id, reason } => view.remove(id, *reason),
    }
}

/// Headless view: writes every call to the log. Per-kind hints fill in
/// color and scale when the snapshot leaves them out.
#[derive(Debug, Default)]
pub struct LoggingView {
    hints: HashMap<AgentKind, KindHint>,
}

impl LoggingView {
    pub fn with_hints(hints: HashMap<AgentKind, KindHint>) -> Self {
        Self { hints }
    }
}

impl EntityView for LoggingView {
    fn spawn_fallback(&mut self, id: &str, kind: AgentKind, at: Position, color: Option<&str>) {
        let hint = self.hints.get(&kind);
        let color = color.or_else(|| hint.and_then(|h| h.color.as_deref()));
        log::info!(
            "spawn {id} kind={} at ({:.2}, {:.2}) color={} scale={}",
            kind.as_str(),
            at.x,
            at.y,
            color.unwrap_or("-"),
            hint.map_or(1.0, |h| h.scale)
        );
    }

    fn update(&mut self, id: &str, at: Position, heading: Option<Heading>) {
        match heading {
            Some(h) => log::trace!("move {id} to ({:.2}, {:.2}) yaw={:.3}", at.x, at.y, h.yaw()),
            None    => log::trace!("move {id} to ({:.2}, {:.2})", at.x, at.y),
        }
    }

    fn remove(&mut self, id: &str, reason: RemovalReason) {
        log::info!("remove {id} ({reason:?})");
    }

    fn metadata(&mut self, meta: &SnapshotMeta) {
        log::debug!(
            "step={} lights={:?} obstacles_removed={} agents={}",
            meta.step,
            meta.traffic_light_state,
            meta.obstacles_removed,
            meta.agent_count
        );
    }
}

/// One recorded view call.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    /// `factory` names the spawn method that ran.
    Spawn { id: String, factory: &'static str, at: Position, color: Option<String> },
    Update { id: String, at: Position, heading: Option<Heading> },
    Remove { id: String, reason: RemovalReason },
    Metadata(SnapshotMeta),
}

/// View that records every call. Specializes each kind so tests can see
/// which factory handled a spawn.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub calls: Vec<ViewCall>,
}

impl RecordingView {
    fn spawn(&mut self, id: &str, factory: &'static str, at: Position, color: Option<&str>) {
        self.calls.push(ViewCall::Spawn {
            id: id.to_string(),
            factory,
            at,
            color: color.map(str::to_string),
        });
    }

    pub fn removals_of(&self, id: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ViewCall::Remove { id: r, .. } if r == id))
            .count()
    }

    pub fn spawns_of(&self, id: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ViewCall::Spawn { id: s, .. } if s == id))
            .count()
    }
}

impl EntityView for RecordingView {
    fn spawn_fallback(&mut self, id: &str, _kind: AgentKind, at: Position, color: Option<&str>) {
        self.spawn(id, "fallback", at, color);
    }

    fn spawn_pedestrian(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn(id, "pedestrian", at, color);
    }

    fn spawn_vehicle(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn(id, "vehicle", at, color);
    }

    fn spawn_authority(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn(id, "authority", at, color);
    }

    fn spawn_obstacle(&mut self, id: &str, at: Position, color: Option<&str>) {
        self.spawn(id, "obstacle", at, color);
    }

    fn update(&mut self, id: &str, at: Position, heading: Option<Heading>) {
        self.calls.push(ViewCall::Update { id: id.to_string(), at, heading });
    }

    fn remove(&mut self, id: &str, reason: RemovalReason) {
        self.calls.push(ViewCall::Remove { id: id.to_string(), reason });
    }

    fn metadata(&mut self, meta: &SnapshotMeta) {
        self.calls.push(ViewCall::Metadata(*meta));
    }
}
