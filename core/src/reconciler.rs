//! Reconciler: the authoritative entity set.
//!
//! Per snapshot:
//!   1. Collect the ids present in the snapshot.
//!   2. Remove every tracked entity whose id is absent.
//!   3. Walk agents in order: update tracked ones, create the rest.
//!      A later duplicate id overwrites the earlier one. A tracked id whose
//!      kind changed is removed and created again with the new kind.
//!
//! Separately, `sweep_boundary` evicts vehicles outside the boundary square
//! whether or not the latest snapshot still lists them. A vehicle that is
//! still listed comes back on the next `apply` and is evicted again.
//!
//! RULE: The reconciler is the only writer of entity state, and only the
//! tick context holds one. It needs no internal locking.

use crate::{
    event::{EntityEvent, RemovalReason},
    snapshot::{AgentSnapshot, SimulationSnapshot},
    types::{AgentKind, EntityId, Heading, Position},
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub id:            EntityId,
    pub kind:          AgentKind,
    pub position:      Position,
    /// Position before the most recent move.
    pub last_position: Position,
    pub heading:       Option<Heading>,
    pub color:         Option<String>,
    pub created_at:    DateTime<Utc>,
}

impl EntityState {
    fn spawn(agent: &AgentSnapshot) -> Self {
        Self {
            id:            agent.id.clone(),
            kind:          agent.kind,
            position:      agent.position,
            last_position: agent.position,
            heading:       None,
            color:         agent.color.clone(),
            created_at:    Utc::now(),
        }
    }

    /// Move to `to`. Heading only changes when the displacement has a
    /// finite, non-zero length.
    fn move_to(&mut self, to: Position) {
        if to == self.position {
            return;
        }
        let (dx, dy) = self.position.displacement_to(&to);
        if let Some(heading) = Heading::from_displacement(dx, dy) {
            self.heading = Some(heading);
        }
        self.last_position = self.position;
        self.position = to;
    }
}

#[derive(Debug)]
pub struct Reconciler {
    entities:             HashMap<EntityId, EntityState>,
    boundary_half_extent: f64,
}

impl Reconciler {
    pub fn new(boundary_half_extent: f64) -> Self {
        Self {
            entities: HashMap::new(),
            boundary_half_extent,
        }
    }

    pub fn apply(&mut self, snapshot: &SimulationSnapshot) -> Vec<EntityEvent> {
        let mut events = Vec::new();

        let present: HashSet<&str> = snapshot.agents.iter().map(|a| a.id.as_str()).collect();

        let mut absent: Vec<EntityId> = self
            .entities
            .keys()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        absent.sort();
        for id in absent {
            self.entities.remove(&id);
            log::debug!("entity {id} absent from step {}: removed", snapshot.step);
            events.push(EntityEvent::Removed { id, reason: RemovalReason::Absent });
        }

        for agent in &snapshot.agents {
            if let Some(entity) = self.entities.get_mut(&agent.id) {
                if entity.kind == agent.kind {
                    entity.move_to(agent.position);
                    if agent.color.is_some() {
                        entity.color = agent.color.clone();
                    }
                    events.push(EntityEvent::Updated {
                        id:       entity.id.clone(),
                        position: entity.position,
                        heading:  entity.heading,
                    });
                    continue;
                }
            }

            if let Some(stale) = self.entities.remove(&agent.id) {
                log::debug!(
                    "entity {} changed kind {} -> {}: respawning",
                    stale.id,
                    stale.kind.as_str(),
                    agent.kind.as_str()
                );
                events.push(EntityEvent::Removed { id: stale.id, reason: RemovalReason::KindChanged });
            }

            let entity = EntityState::spawn(agent);
            log::debug!("entity {} created as {}", entity.id, entity.kind.as_str());
            events.push(EntityEvent::Created {
                id:       entity.id.clone(),
                kind:     entity.kind,
                position: entity.position,
                color:    entity.color.clone(),
            });
            self.entities.insert(entity.id.clone(), entity);
        }

        events
    }

    /// Evict every boundary-subject entity outside the square.
    pub fn sweep_boundary(&mut self) -> Vec<EntityEvent> {
        let mut out: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| self.is_out_of_bounds(e.kind, &e.position))
            .map(|e| e.id.clone())
            .collect();
        out.sort();

        out.into_iter()
            .map(|id| {
                self.entities.remove(&id);
                log::debug!("entity {id} left the boundary: evicted");
                EntityEvent::Removed { id, reason: RemovalReason::OutOfBounds }
            })
            .collect()
    }

    fn is_out_of_bounds(&self, kind: AgentKind, position: &Position) -> bool {
        kind.is_boundary_evicted() && position.outside_square(self.boundary_half_extent)
    }

    // ── Read-only projections ──────────────────────────────

    pub fn get(&self, id: &str) -> Option<&EntityState> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Tracked ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
