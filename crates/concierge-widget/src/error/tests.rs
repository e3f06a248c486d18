use super::*;

#[test]
fn test_no_session_maps_to_no_session_text() {
    let strings = WidgetStrings::default();
    assert_eq!(Error::NoSession.user_message(&strings), strings.no_session);
}

#[test]
fn test_transport_errors_share_submit_failure_text() {
    let strings = WidgetStrings::default();
    for err in [
        Error::Network("connection reset".to_string()),
        Error::Http { status: 502 },
        Error::Decode("expected value".to_string()),
    ] {
        assert!(err.is_transport());
        assert_eq!(err.user_message(&strings), strings.submit_failed);
    }
}

#[test]
fn test_protocol_error_converts() {
    let err: Error = ProtocolError::UnknownType("presence".to_string()).into();
    assert!(matches!(err, Error::Protocol(ProtocolError::UnknownType(_))));
    assert!(!err.is_transport());
    assert_eq!(err.to_string(), "protocol error: unknown frame type: presence");
}
