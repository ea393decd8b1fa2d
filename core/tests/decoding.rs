//! Decoder tests.
//!
//! Covers: the wire schema, unknown kinds falling back, optional color,
//! malformed frames, and a bad frame not poisoning the rest of a batch.

use simbridge_core::{
    acceptor::ingest,
    decoder::{decode, decode_str},
    error::DecodeError,
    framer::Framer,
    queue::{handoff_queue, OverflowPolicy},
    snapshot::TrafficLightState,
    types::{AgentKind, Position},
};

const VALID: &str = r##"{
    "agents": [
        {"id": "p1", "type": "pedestrian", "position": {"x": 1.5, "y": -2}},
        {"id": "v1", "type": "vehicle", "position": {"x": 10, "y": 0}, "color": "#ff0000"}
    ],
    "step": 42,
    "trafficLightState": "vertical_green",
    "obstaclesRemoved": 3
}"##;

fn snapshot_json(step: i64) -> String {
    format!(
        r#"{{"agents":[{{"id":"a","type":"pedestrian","position":{{"x":0,"y":0}}}}],"step":{step},"trafficLightState":"horizontal_green","obstaclesRemoved":0}}"#
    )
}

#[test]
fn decodes_full_schema() {
    let snap = decode_str(VALID).expect("valid snapshot");
    assert_eq!(snap.step, 42);
    assert_eq!(snap.traffic_light_state, TrafficLightState::VerticalGreen);
    assert_eq!(snap.obstacles_removed, 3);
    assert_eq!(snap.agents.len(), 2);

    let p = &snap.agents[0];
    assert_eq!(p.id, "p1");
    assert_eq!(p.kind, AgentKind::Pedestrian);
    assert_eq!(p.position, Position::new(1.5, -2.0));
    assert_eq!(p.color, None);

    let v = &snap.agents[1];
    assert_eq!(v.kind, AgentKind::Vehicle);
    assert_eq!(v.color.as_deref(), Some("#ff0000"));
}

#[test]
fn unrecognized_kind_decodes_as_unknown() {
    let json = r#"{"agents":[{"id":"x","type":"helicopter","position":{"x":0,"y":0}}],
                  "step":1,"trafficLightState":"horizontal_green","obstaclesRemoved":0}"#;
    let snap = decode_str(json).expect("unknown kind is not an error");
    assert_eq!(snap.agents[0].kind, AgentKind::Unknown);
}

#[test]
fn surrounding_whitespace_is_tolerated() {
    let padded = format!("\r\n  {}\n", snapshot_json(7));
    assert_eq!(decode(padded.as_bytes()).expect("padded frame").step, 7);
}

#[test]
fn structural_mismatches_are_decode_errors() {
    let cases = [
        "",
        "not json",
        r#"{"agents":[],"step":1}"#,
        r#"{"agents":[],"step":"one","trafficLightState":"horizontal_green","obstaclesRemoved":0}"#,
        r#"{"agents":[],"step":1,"trafficLightState":"red","obstaclesRemoved":0}"#,
        r#"{"agents":[{"id":"a","type":"vehicle"}],"step":1,"trafficLightState":"horizontal_green","obstaclesRemoved":0}"#,
    ];
    for case in cases {
        assert!(
            matches!(decode_str(case), Err(DecodeError::Json(_))),
            "expected a JSON decode error for {case:?}"
        );
    }
}

#[test]
fn empty_id_is_rejected() {
    let json = r#"{"agents":[{"id":"ok","type":"vehicle","position":{"x":0,"y":0}},
                             {"id":"","type":"vehicle","position":{"x":0,"y":0}}],
                  "step":1,"trafficLightState":"horizontal_green","obstaclesRemoved":0}"#;
    assert!(matches!(decode_str(json), Err(DecodeError::EmptyId { index: 1 })));
}

#[test]
fn invalid_utf8_is_rejected() {
    assert!(matches!(
        decode(&[b'{', 0xff, 0xfe, b'}']),
        Err(DecodeError::InvalidUtf8 { valid_up_to: 1 })
    ));
}

#[test]
fn bad_frame_does_not_affect_later_frames_in_the_batch() {
    let (tx, rx) = handoff_queue(8, OverflowPolicy::DropOldest);
    let mut framer = Framer::default();
    let batch = format!("{}${{broken$${}$", snapshot_json(1), snapshot_json(2));

    let report = ingest(&mut framer, batch.as_bytes(), &tx);
    assert_eq!(report.frames, 4);
    assert_eq!(report.decoded, 2);
    assert_eq!(report.rejected, 2);

    let steps: Vec<i64> = rx.drain_all().iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![1, 2]);
}
