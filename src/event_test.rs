use super::*;

fn user() -> UserRef {
    UserRef { id: Uuid::new_v4(), name: "ada".into() }
}

// =============================================================================
// Topic tags
// =============================================================================

#[test]
fn cursor_move_tag_on_wire() {
    let ev = WireEvent::CursorMove(CursorPayload {
        position: Point { x: 10.0, y: 20.0 },
        user: user(),
        color: "hsl(120, 100%, 70%)".into(),
        timestamp: 1_700_000_000_000,
    });

    let json = ev.encode().expect("encode");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value.get("event").and_then(|v| v.as_str()), Some("cursor-move"));
    assert_eq!(ev.topic(), "cursor-move");
}

#[test]
fn topic_matches_serde_tag_for_every_variant() {
    let u = user();
    let events = vec![
        WireEvent::CursorMove(CursorPayload {
            position: Point { x: 0.0, y: 0.0 },
            user: u.clone(),
            color: "red".into(),
            timestamp: 0,
        }),
        WireEvent::Selection(SelectionPayload { rects: vec![], user: u.clone(), color: "red".into() }),
        WireEvent::AddHighlight(HighlightPayload {
            id: Uuid::new_v4(),
            text: "hello".into(),
            rects: vec![],
            user: u.clone(),
            color: "red".into(),
        }),
        WireEvent::RemoveHighlight(RemoveHighlightPayload { id: Uuid::new_v4() }),
        WireEvent::ChatMessage(ChatMessagePayload {
            id: Uuid::new_v4(),
            user: u,
            text: "hi".into(),
            timestamp: 0,
            highlight_ref: None,
        }),
    ];

    for ev in events {
        let json = ev.encode().expect("encode");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value.get("event").and_then(|v| v.as_str()), Some(ev.topic()));
    }
}

// =============================================================================
// Round trips
// =============================================================================

#[test]
fn selection_round_trip_preserves_rects() {
    let original = WireEvent::Selection(SelectionPayload {
        rects: vec![
            SelectionRect { x: 1.0, y: 2.0, width: 120.0, height: 14.0 },
            SelectionRect { x: 1.0, y: 18.0, width: 80.0, height: 14.0 },
        ],
        user: user(),
        color: "hsl(10, 100%, 70%)".into(),
    });

    let restored = WireEvent::decode(&original.encode().expect("encode")).expect("decode");
    assert_eq!(restored, original);
}

#[test]
fn chat_message_omits_missing_highlight_ref() {
    let ev = WireEvent::ChatMessage(ChatMessagePayload {
        id: Uuid::new_v4(),
        user: user(),
        text: "no reference here".into(),
        timestamp: 42,
        highlight_ref: None,
    });

    let json = ev.encode().expect("encode");
    assert!(!json.contains("highlight_ref"));
}

#[test]
fn chat_message_round_trip_with_highlight_ref() {
    let highlight_id = Uuid::new_v4();
    let original = WireEvent::ChatMessage(ChatMessagePayload {
        id: Uuid::new_v4(),
        user: user(),
        text: "see this".into(),
        timestamp: 7,
        highlight_ref: Some(HighlightReference { id: highlight_id, text: "Section 2.1".into() }),
    });

    let restored = WireEvent::decode(&original.encode().expect("encode")).expect("decode");
    let WireEvent::ChatMessage(msg) = restored else {
        panic!("wrong variant");
    };
    assert_eq!(msg.highlight_ref.expect("ref").id, highlight_id);
}

// =============================================================================
// Boundary validation
// =============================================================================

#[test]
fn decode_rejects_unknown_topic() {
    let body = r#"{"event":"teleport","payload":{}}"#;
    assert!(WireEvent::decode(body).is_err());
}

#[test]
fn decode_rejects_mismatched_payload_shape() {
    // A selection payload under the cursor-move topic must not parse.
    let body = r#"{"event":"cursor-move","payload":{"rects":[],"user":{"id":"00000000-0000-0000-0000-000000000000","name":"x"},"color":"red"}}"#;
    assert!(WireEvent::decode(body).is_err());
}

#[test]
fn decode_rejects_invalid_json() {
    assert!(WireEvent::decode("{not json").is_err());
}

#[test]
fn now_ms_is_positive() {
    assert!(now_ms() > 0);
}
