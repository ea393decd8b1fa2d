//! Tick driver tests.
//!
//! Covers: drain-and-apply per cycle, ordering of queued snapshots,
//! boundary sweep after apply, per-kind factory dispatch, metadata.

use simbridge_core::{
    acceptor::ShutdownSignal,
    clock::TickClock,
    config::BridgeConfig,
    event::RemovalReason,
    queue::{handoff_queue, OverflowPolicy, SnapshotSender},
    reconciler::Reconciler,
    snapshot::{AgentSnapshot, SimulationSnapshot, TrafficLightState},
    tick::TickDriver,
    types::{AgentKind, Position},
    view::{RecordingView, ViewCall},
};
use std::time::Duration;

fn build() -> (SnapshotSender, TickDriver<RecordingView>) {
    let config = BridgeConfig::default_test();
    let (tx, rx) = handoff_queue(config.queue_capacity, OverflowPolicy::DropOldest);
    let driver = TickDriver::new(
        rx,
        Reconciler::new(config.boundary_half_extent),
        RecordingView::default(),
    );
    (tx, driver)
}

fn agent(id: &str, kind: AgentKind, x: f64, y: f64) -> AgentSnapshot {
    AgentSnapshot { id: id.into(), kind, position: Position::new(x, y), color: None }
}

fn snapshot(step: i64, agents: Vec<AgentSnapshot>) -> SimulationSnapshot {
    SimulationSnapshot {
        agents,
        step,
        traffic_light_state: if step % 2 == 0 {
            TrafficLightState::HorizontalGreen
        } else {
            TrafficLightState::VerticalGreen
        },
        obstacles_removed: step / 10,
    }
}

#[test]
fn cycle_with_empty_queue_is_a_no_op() {
    let (_tx, mut driver) = build();
    let report = driver.tick();
    assert_eq!(report.cycle, 1);
    assert_eq!(report.snapshots, 0);
    assert!(driver.view().calls.is_empty());
    assert!(driver.latest_meta().is_none());
}

#[test]
fn queued_snapshots_apply_in_push_order() {
    let (tx, mut driver) = build();
    tx.push(snapshot(1, vec![agent("a", AgentKind::Pedestrian, 0.0, 0.0)]));
    tx.push(snapshot(2, vec![agent("a", AgentKind::Pedestrian, 5.0, 0.0)]));

    let report = driver.tick();
    assert_eq!(report.snapshots, 2);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);

    // S2 applied last: its position wins.
    let a = driver.reconciler().get("a").expect("a tracked");
    assert_eq!(a.position, Position::new(5.0, 0.0));
    assert_eq!(driver.latest_meta().map(|m| m.step), Some(2));
}

#[test]
fn sweep_runs_after_apply_in_the_same_cycle() {
    let (tx, mut driver) = build();
    tx.push(snapshot(1, vec![agent("v", AgentKind::Vehicle, 0.0, 0.0)]));
    driver.tick();

    tx.push(snapshot(2, vec![agent("v", AgentKind::Vehicle, 30.0, 0.0)]));
    let report = driver.tick();

    assert_eq!(report.evicted, 1);
    assert_eq!(report.removed, 0);
    assert!(driver.reconciler().is_empty());
    assert_eq!(driver.view().removals_of("v"), 1);
    assert!(driver
        .view()
        .calls
        .contains(&ViewCall::Remove { id: "v".into(), reason: RemovalReason::OutOfBounds }));
}

#[test]
fn absent_entity_gets_one_removal_notification() {
    let (tx, mut driver) = build();
    tx.push(snapshot(1, vec![
        agent("a", AgentKind::Pedestrian, 0.0, 0.0),
        agent("b", AgentKind::Pedestrian, 1.0, 0.0),
    ]));
    driver.tick();
    tx.push(snapshot(2, vec![agent("a", AgentKind::Pedestrian, 0.0, 0.0)]));
    driver.tick();
    driver.tick();

    assert_eq!(driver.reconciler().ids(), vec!["a"]);
    assert_eq!(driver.view().removals_of("b"), 1);
    assert_eq!(driver.view().removals_of("a"), 0);
}

#[test]
fn each_kind_reaches_its_own_factory() {
    let (tx, mut driver) = build();
    tx.push(snapshot(1, vec![
        agent("p", AgentKind::Pedestrian, 0.0, 0.0),
        agent("v", AgentKind::Vehicle, 0.0, 0.0),
        agent("a", AgentKind::Authority, 0.0, 0.0),
        agent("o", AgentKind::Obstacle, 0.0, 0.0),
        agent("u", AgentKind::Unknown, 0.0, 0.0),
    ]));
    driver.tick();

    let factories: Vec<(&str, &str)> = driver
        .view()
        .calls
        .iter()
        .filter_map(|c| match c {
            ViewCall::Spawn { id, factory, .. } => Some((id.as_str(), *factory)),
            _ => None,
        })
        .collect();
    assert_eq!(
        factories,
        vec![
            ("p", "pedestrian"),
            ("v", "vehicle"),
            ("a", "authority"),
            ("o", "obstacle"),
            ("u", "fallback"),
        ]
    );
}

#[test]
fn metadata_follows_each_applied_snapshot() {
    let (tx, mut driver) = build();
    tx.push(snapshot(10, Vec::new()));
    tx.push(snapshot(11, Vec::new()));
    driver.tick();

    let metas: Vec<i64> = driver
        .view()
        .calls
        .iter()
        .filter_map(|c| match c {
            ViewCall::Metadata(m) => Some(m.step),
            _ => None,
        })
        .collect();
    assert_eq!(metas, vec![10, 11]);

    let last = driver.latest_meta().expect("meta recorded");
    assert_eq!(last.traffic_light_state, TrafficLightState::VerticalGreen);
    assert_eq!(last.obstacles_removed, 1);
}

#[test]
fn run_stops_at_cycle_cap() {
    let (_tx, mut driver) = build();
    let mut clock = TickClock::new(Duration::from_millis(1));
    let signal = ShutdownSignal::new();

    assert_eq!(driver.run(&mut clock, &signal, 5), 5);
    assert_eq!(driver.cycle(), 5);
    assert_eq!(clock.current_cycle, 5);
}

#[test]
fn run_returns_immediately_once_shutdown_is_requested() {
    let (_tx, mut driver) = build();
    let mut clock = TickClock::new(Duration::from_millis(1));
    let signal = ShutdownSignal::new();
    signal.request();

    assert_eq!(driver.run(&mut clock, &signal, 0), 0);
}

#[test]
fn into_view_closes_the_queue() {
    let (tx, driver) = build();
    let view = driver.into_view();
    assert!(view.calls.is_empty());
    assert!(tx.is_closed());
}

#[test]
fn repeated_snapshot_spawns_once() {
    let (tx, mut driver) = build();
    let s = snapshot(1, vec![agent("a", AgentKind::Authority, 2.0, 2.0)]);
    tx.push(s.clone());
    driver.tick();
    tx.push(s);
    let report = driver.tick();

    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 1);
    assert_eq!(driver.view().spawns_of("a"), 1);
}

#[test]
fn kind_change_respawns_through_the_new_factory() {
    let (tx, mut driver) = build();
    tx.push(snapshot(1, vec![agent("k", AgentKind::Obstacle, 1.0, 1.0)]));
    driver.tick();
    tx.push(snapshot(2, vec![agent("k", AgentKind::Authority, 1.0, 1.0)]));
    let report = driver.tick();

    assert_eq!(report.removed, 1);
    assert_eq!(report.created, 1);
    let calls = &driver.view().calls;
    assert!(calls.contains(&ViewCall::Remove { id: "k".into(), reason: RemovalReason::KindChanged }));
    let factories: Vec<&str> = calls
        .iter()
        .filter_map(|c| match c {
            ViewCall::Spawn { factory, .. } => Some(*factory),
            _ => None,
        })
        .collect();
    assert_eq!(factories, vec!["obstacle", "authority"]);
}
