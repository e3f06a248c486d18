use super::*;

#[test]
fn test_parse_session_frame() {
    let frame = parse_frame(
        r#"{"type":"session","token":"tok-1","sessionId":"s-1","verificationStatus":"verified","restored":true}"#,
    )
    .unwrap();

    match frame {
        InboundFrame::Session {
            token,
            session_id,
            verification_status,
            restored,
        } => {
            assert_eq!(token, "tok-1");
            assert_eq!(session_id, "s-1");
            assert_eq!(verification_status, VerificationStatus::Verified);
            assert!(restored);
        }
        other => panic!("unexpected frame: {:?}", other),
    }
}

#[test]
fn test_session_frame_defaults_to_anonymous() {
    let frame = parse_frame(r#"{"type":"session","token":"t","sessionId":"s"}"#).unwrap();
    assert!(matches!(
        frame,
        InboundFrame::Session {
            verification_status: VerificationStatus::Anonymous,
            restored: false,
            ..
        }
    ));
}

#[test]
fn test_parse_message_frame_with_action_and_quick_replies() {
    let frame = parse_frame(
        r#"{"type":"message","role":"assistant","content":"Sure!","action":"book-spa","quickReplies":["Yes","No"]}"#,
    )
    .unwrap();

    let InboundFrame::Message(message) = frame else {
        panic!("expected message frame");
    };
    assert_eq!(message.role, MessageRole::Assistant);
    assert_eq!(message.action.as_deref(), Some("book-spa"));
    assert_eq!(message.quick_replies, vec!["Yes", "No"]);
}

#[test]
fn test_parse_history_and_pong() {
    let frame = parse_frame(
        r#"{"type":"history","messages":[{"role":"guest","content":"hi"},{"role":"assistant","content":"hello"}]}"#,
    )
    .unwrap();
    match frame {
        InboundFrame::History { messages } => assert_eq!(messages.len(), 2),
        other => panic!("unexpected frame: {:?}", other),
    }

    assert_eq!(parse_frame(r#"{"type":"pong"}"#).unwrap(), InboundFrame::Pong);
}

#[test]
fn test_parse_errors_are_classified() {
    assert!(matches!(
        parse_frame("not json"),
        Err(ProtocolError::Malformed(_))
    ));
    assert_eq!(
        parse_frame(r#"{"content":"x"}"#),
        Err(ProtocolError::MissingType)
    );
    assert_eq!(
        parse_frame(r#"{"type":"presence"}"#),
        Err(ProtocolError::UnknownType("presence".to_string()))
    );
    // Known type, wrong shape
    assert!(matches!(
        parse_frame(r#"{"type":"session"}"#),
        Err(ProtocolError::Malformed(_))
    ));
}

#[test]
fn test_outbound_frames_encode_with_type_tag() {
    let json = encode_frame(&OutboundFrame::Message {
        content: "hello".to_string(),
    })
    .unwrap();
    assert_eq!(json, r#"{"type":"message","content":"hello"}"#);
    assert_eq!(encode_frame(&OutboundFrame::Ping).unwrap(), r#"{"type":"ping"}"#);
}
