use super::*;

fn session(token: &str, status: VerificationStatus) -> Session {
    Session {
        token: token.to_string(),
        session_id: "s-1".to_string(),
        verification_status: status,
        restored: false,
    }
}

#[test]
fn test_state_without_session_is_anonymous_and_tokenless() {
    let state = SessionState::new();
    assert_eq!(state.verification_status(), VerificationStatus::Anonymous);
    assert!(state.session_token().is_none());
}

#[test]
fn test_update_reports_transition_to_verified_once() {
    let mut state = SessionState::new();
    state.establish(session("tok", VerificationStatus::Anonymous));

    assert!(state.update_verification(VerificationStatus::Verified));
    assert!(!state.update_verification(VerificationStatus::Verified));
    assert_eq!(state.verification_status(), VerificationStatus::Verified);
    assert_eq!(state.session_token().as_deref(), Some("tok"));
}

#[test]
fn test_update_before_session_is_ignored() {
    let mut state = SessionState::new();
    assert!(!state.update_verification(VerificationStatus::Verified));
    assert!(state.current().is_none());
}

#[test]
fn test_memory_store_roundtrip() {
    let store = MemorySessionStore::new();
    assert!(store.load().is_none());
    store.save("abc");
    assert_eq!(store.load().as_deref(), Some("abc"));
    store.clear();
    assert!(store.load().is_none());
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session");

    FileSessionStore::new(&path).save("persisted-token");
    let reopened = FileSessionStore::new(&path);
    assert_eq!(reopened.load().as_deref(), Some("persisted-token"));

    reopened.clear();
    assert!(reopened.load().is_none());
    // Clearing twice is harmless
    reopened.clear();
}

#[test]
fn test_file_store_ignores_blank_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session");
    std::fs::write(&path, "  \n").unwrap();
    assert!(FileSessionStore::new(path).load().is_none());
}

#[test]
fn test_file_store_write_failure_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let store = FileSessionStore::new(blocker.join("session"));
    assert!(matches!(store.write("tok"), Err(Error::Storage(_))));
    // Trait-level save only logs
    store.save("tok");
    assert!(store.load().is_none());
}
