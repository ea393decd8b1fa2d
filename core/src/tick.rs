//! The tick driver: the single context that mutates entity state.
//!
//! EXECUTION ORDER per cycle (fixed):
//!   1. Drain the handoff queue.
//!   2. Apply each drained snapshot to the reconciler, oldest first.
//!   3. Run the boundary sweep over the full entity set.
//!   4. Forward every resulting event to the view.
//!
//! RULES:
//!   - The driver owns the reconciler and the queue's receiving half.
//!   - Nothing else can reach either, so no entity lock exists.

use crate::{
    acceptor::ShutdownSignal,
    clock::TickClock,
    event::{EntityEvent, RemovalReason},
    queue::SnapshotReceiver,
    reconciler::Reconciler,
    snapshot::SnapshotMeta,
    types::Cycle,
    view::{self, EntityView},
};

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub cycle:     Cycle,
    pub snapshots: usize,
    pub created:   usize,
    pub updated:   usize,
    pub removed:   usize,
    pub evicted:   usize,
}

impl TickReport {
    fn count(&mut self, event: &EntityEvent) {
        match event {
            EntityEvent::Created { .. } => self.created += 1,
            EntityEvent::Updated { .. } => self.updated += 1,
            EntityEvent::Removed { reason: RemovalReason::OutOfBounds, .. } => self.evicted += 1,
            EntityEvent::Removed { .. } => self.removed += 1,
        }
    }
}

pub struct TickDriver<V: EntityView> {
    receiver:    SnapshotReceiver,
    reconciler:  Reconciler,
    view:        V,
    latest_meta: Option<SnapshotMeta>,
    cycle:       Cycle,
}

impl<V: EntityView> TickDriver<V> {
    pub fn new(receiver: SnapshotReceiver, reconciler: Reconciler, view: V) -> Self {
        Self {
            receiver,
            reconciler,
            view,
            latest_meta: None,
            cycle: 0,
        }
    }

    /// Run one cycle.
    pub fn tick(&mut self) -> TickReport {
        self.cycle += 1;
        let mut report = TickReport { cycle: self.cycle, ..TickReport::default() };

        let snapshots = self.receiver.drain_all();
        report.snapshots = snapshots.len();

        for snapshot in &snapshots {
            let events = self.reconciler.apply(snapshot);
            self.forward(&events, &mut report);

            let meta = snapshot.meta();
            self.view.metadata(&meta);
            self.latest_meta = Some(meta);
        }

        let evicted = self.reconciler.sweep_boundary();
        self.forward(&evicted, &mut report);

        if report.snapshots > 0 {
            log::debug!(
                "cycle={} snapshots={} created={} removed={} evicted={} live={}",
                report.cycle,
                report.snapshots,
                report.created,
                report.removed,
                report.evicted,
                self.reconciler.len()
            );
        }

        report
    }

    /// Tick on `clock` until `signal` fires or `max_cycles` have run
    /// (0 = no cap). Returns the number of cycles executed.
    pub fn run(&mut self, clock: &mut TickClock, signal: &ShutdownSignal, max_cycles: u64) -> u64 {
        let mut ran = 0;
        while !signal.is_requested() && (max_cycles == 0 || ran < max_cycles) {
            clock.advance();
            self.tick();
            ran += 1;
            clock.sleep_until_next();
        }
        ran
    }

    fn forward(&mut self, events: &[EntityEvent], report: &mut TickReport) {
        for event in events {
            report.count(event);
            view::dispatch(&mut self.view, event);
        }
    }

    pub fn latest_meta(&self) -> Option<&SnapshotMeta> {
        self.latest_meta.as_ref()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn receiver(&self) -> &SnapshotReceiver {
        &self.receiver
    }

    /// Tear down, handing back the view. Closes the queue.
    pub fn into_view(self) -> V {
        self.receiver.close();
        self.view
    }
}
