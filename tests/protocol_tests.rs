use jobcast::protocol::{decode, encode, JobAssignment, JobOutcome, Message};
use uuid::Uuid;

#[test]
fn test_assignment_round_trip() {
    let message = Message::Assignment(JobAssignment {
        id: Uuid::new_v4(),
        command: "echo hello".to_string(),
    });

    let decoded = decode(&encode(&message)).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn test_success_round_trip() {
    let message = Message::Success(JobOutcome {
        id: Uuid::new_v4(),
        std_out: "hello\n".to_string(),
        std_err: String::new(),
    });

    let decoded = decode(&encode(&message)).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn test_failure_round_trip() {
    let message = Message::Failure(JobOutcome {
        id: Uuid::new_v4(),
        std_out: String::new(),
        std_err: "boom\n".to_string(),
    });

    let decoded = decode(&encode(&message)).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn test_wire_shape() {
    let id = Uuid::new_v4();
    let message = Message::Failure(JobOutcome {
        id,
        std_out: "out".to_string(),
        std_err: "err".to_string(),
    });

    let value: serde_json::Value = serde_json::from_slice(&encode(&message)).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1, "exactly one top-level key");

    let body = &object["failed"];
    assert_eq!(body["std_out"], "out");
    assert_eq!(body["std_err"], "err");

    // Ids go out in the braced dashed-hex form.
    let rendered = body["id"].as_str().unwrap();
    assert_eq!(rendered, id.braced().to_string());
    assert!(rendered.starts_with('{') && rendered.ends_with('}'));
    assert_eq!(rendered.len(), 38);
}

#[test]
fn test_success_uses_success_key() {
    let message = Message::Success(JobOutcome {
        id: Uuid::new_v4(),
        std_out: String::new(),
        std_err: String::new(),
    });

    let value: serde_json::Value = serde_json::from_slice(&encode(&message)).unwrap();
    assert!(value.get("success").is_some());
}

#[test]
fn test_decode_accepts_unbraced_id() {
    let id = Uuid::new_v4();
    let raw = format!(r#"{{"assignment": {{"id": "{id}", "command": "true"}}}}"#);

    let decoded = decode(raw.as_bytes()).unwrap();
    match decoded {
        Message::Assignment(assignment) => {
            assert_eq!(assignment.id, id);
            assert_eq!(assignment.command, "true");
        }
        other => panic!("expected assignment, got {}", other.kind()),
    }
}

#[test]
fn test_decode_accepts_braced_id() {
    let id = Uuid::new_v4();
    let raw = format!(
        r#"{{"success": {{"id": "{}", "std_out": "", "std_err": ""}}}}"#,
        id.braced()
    );

    match decode(raw.as_bytes()).unwrap() {
        Message::Success(outcome) => assert_eq!(outcome.id, id),
        other => panic!("expected success, got {}", other.kind()),
    }
}

#[test]
fn test_unknown_top_level_key_is_an_error() {
    let raw = br#"{"greeting": {"id": "00000000-0000-0000-0000-000000000000"}}"#;
    assert!(decode(raw).is_err());
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(decode(b"not json at all").is_err());
    assert!(decode(b"").is_err());
    assert!(decode(b"{\"assignment\":").is_err());
}

#[test]
fn test_bad_uuid_is_an_error() {
    let raw = br#"{"assignment": {"id": "not-a-uuid", "command": "true"}}"#;
    assert!(decode(raw).is_err());
}

#[test]
fn test_message_kind() {
    let id = Uuid::new_v4();
    let outcome = JobOutcome {
        id,
        std_out: String::new(),
        std_err: String::new(),
    };

    assert_eq!(
        Message::Assignment(JobAssignment {
            id,
            command: String::new()
        })
        .kind(),
        "assignment"
    );
    assert_eq!(Message::Success(outcome.clone()).kind(), "success");
    assert_eq!(Message::Failure(outcome).kind(), "failed");
}
