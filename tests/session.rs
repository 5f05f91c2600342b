//! Session state machine against the mock API and scripted backends.

mod common;

use common::*;
use qblog::api::ApiClient;
use qblog::session::{AuthOutcome, FileTokenStore, MemoryTokenStore, Session, SessionState, TokenStore};
use std::sync::Arc;

fn session(client: ApiClient, store: &MemoryTokenStore) -> Session {
    Session::new(client, Arc::new(store.clone()))
}

#[tokio::test]
async fn test_restore_with_valid_token() {
    let api = start_mock_api().await;
    let alice = api.seed_user("alice", "correct-pw");
    api.store.issue_token("tok-valid", &alice.id);

    let store = MemoryTokenStore::with_token("tok-valid");
    let session = session(api.client(), &store);
    assert_eq!(session.state(), SessionState::Restoring);
    assert!(session.loading());

    let snapshot = session.restore().await;
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(snapshot.user.as_ref(), Some(&alice));
    assert!(!snapshot.loading);
    assert_eq!(store.load().unwrap().as_deref(), Some("tok-valid"));
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_restore_with_rejected_token_clears_it() {
    let api = start_mock_api().await;
    let store = MemoryTokenStore::with_token("expired");
    let session = session(api.client(), &store);

    let snapshot = session.restore().await;
    assert_eq!(snapshot.state, SessionState::Unauthenticated);
    assert!(snapshot.token.is_none());
    assert!(snapshot.user.is_none());
    assert!(!snapshot.loading);
    assert_eq!(store.load().unwrap(), None);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_restore_when_service_down_signs_out() {
    let dead = unused_addr().await;
    let client = ApiClient::builder(format!("http://{dead}")).build().unwrap();
    let store = MemoryTokenStore::with_token("tok-valid");

    let snapshot = session(client, &store).restore().await;
    assert_eq!(snapshot.state, SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_login_persists_issued_token() {
    let backend = start_programmable_backend(|req| async move {
        match req.path() {
            "/api/auth/login" => (200, r#"{"access_token":"tok123","token_type":"bearer"}"#.to_string()),
            "/api/auth/me" if req.header("authorization") == Some("Bearer tok123") => (200, USER_JSON.to_string()),
            _ => (401, r#"{"detail":"Could not validate credentials"}"#.to_string()),
        }
    })
    .await;
    let client = ApiClient::builder(backend.url()).build().unwrap();
    let store = MemoryTokenStore::new();
    let session = session(client, &store);

    let outcome = session.login("alice", "correct-pw").await;
    let user = outcome.data().cloned().unwrap();
    assert_eq!(user.username, "alice");

    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.token().as_deref(), Some("tok123"));
    assert!(!session.loading());
    assert_eq!(store.load().unwrap().as_deref(), Some("tok123"));
    assert_eq!(backend.request_count(), 2);
}

#[tokio::test]
async fn test_login_with_wrong_password_leaves_storage_alone() {
    let api = start_mock_api().await;
    api.seed_user("alice", "correct-pw");
    let store = MemoryTokenStore::new();
    let session = session(api.client(), &store);

    let outcome = session.login("alice", "wrong-pw").await;
    match outcome {
        AuthOutcome::Failure { error } => {
            assert!(error.is_auth());
            assert_eq!(error.detail(), "Invalid credentials");
        }
        AuthOutcome::Success { .. } => panic!("login should fail"),
    }
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(!session.loading());
    assert_eq!(store.load().unwrap(), None);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_login_without_token_fails() {
    let backend = start_programmable_backend(|req| async move {
        match req.path() {
            "/api/auth/login" => (200, r#"{"access_token":"","token_type":"bearer"}"#.to_string()),
            _ => (200, USER_JSON.to_string()),
        }
    })
    .await;
    let client = ApiClient::builder(backend.url()).build().unwrap();
    let store = MemoryTokenStore::new();
    let session = session(client, &store);

    let outcome = session.login("alice", "correct-pw").await;
    assert!(!outcome.is_success());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_login_fails_when_identity_fetch_is_rejected() {
    let backend = start_programmable_backend(|req| async move {
        match req.path() {
            "/api/auth/login" => (200, r#"{"access_token":"tok123"}"#.to_string()),
            _ => (401, r#"{"detail":"Could not validate credentials"}"#.to_string()),
        }
    })
    .await;
    let client = ApiClient::builder(backend.url()).build().unwrap();
    let store = MemoryTokenStore::new();
    let session = session(client, &store);

    match session.login("alice", "correct-pw").await {
        AuthOutcome::Failure { error } => assert!(error.is_auth(), "{error:?}"),
        AuthOutcome::Success { .. } => panic!("login should fail"),
    }
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.token().is_none());
    assert!(session.user().is_none());
    assert!(!session.loading());
    assert_eq!(store.load().unwrap(), None);

    let seen: Vec<(String, String)> = backend
        .requests()
        .iter()
        .map(|r| (r.method.clone(), r.path().to_string()))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("POST".to_string(), "/api/auth/login".to_string()),
            ("GET".to_string(), "/api/auth/me".to_string()),
            ("GET".to_string(), "/api/auth/me".to_string()),
        ]
    );
    assert_eq!(backend.requests()[1].header("authorization"), Some("Bearer tok123"));
}

#[tokio::test]
async fn test_failed_relogin_keeps_existing_session() {
    let api = start_mock_api().await;
    api.seed_user("alice", "correct-pw");
    let store = MemoryTokenStore::new();
    let session = session(api.client(), &store);

    assert!(session.login("alice", "correct-pw").await.is_success());
    let token = session.token();

    assert!(!session.login("alice", "wrong-pw").await.is_success());
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.token(), token);
    assert_eq!(store.load().unwrap(), token);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_login_by_email() {
    let api = start_mock_api().await;
    api.seed_user("alice", "correct-pw");
    let store = MemoryTokenStore::new();
    let session = session(api.client(), &store);

    let outcome = session.login("alice@example.com", "correct-pw").await;
    assert_eq!(outcome.data().map(|u| u.username.as_str()), Some("alice"));
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_register_does_not_touch_session() {
    let api = start_mock_api().await;
    let store = MemoryTokenStore::new();
    let session = session(api.client(), &store);

    let outcome = session.register("bob", "bob@x.com", "pw123456").await;
    let user = outcome.into_result().unwrap();
    assert!(!user.id.is_empty());
    assert_eq!(user.username, "bob");

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.token().is_none());
    assert!(!session.loading());
    assert_eq!(store.load().unwrap(), None);

    let duplicate = session.register("bob", "bob@x.com", "pw123456").await;
    assert_eq!(
        duplicate.error().map(|e| e.detail()),
        Some("Email already registered".to_string())
    );
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_logout_clears_token_and_identity() {
    let api = start_mock_api().await;
    api.seed_user("alice", "correct-pw");
    let store = MemoryTokenStore::new();
    let session = session(api.client(), &store);
    assert!(session.login("alice", "correct-pw").await.is_success());

    session.logout();
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.user().is_none());
    assert!(!session.is_authenticated());
    assert_eq!(store.load().unwrap(), None);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let api = start_mock_api().await;
    api.seed_user("alice", "correct-pw");

    {
        let session = Session::new(api.client(), Arc::new(FileTokenStore::new(&path)));
        assert!(session.login("alice", "correct-pw").await.is_success());
    }

    let restarted = Session::new(api.client(), Arc::new(FileTokenStore::new(&path)));
    assert_eq!(restarted.state(), SessionState::Restoring);
    let snapshot = restarted.restore().await;
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(snapshot.user.as_ref().map(|u| u.username.as_str()), Some("alice"));
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_logins_are_serialized() {
    let api = start_mock_api().await;
    api.seed_user("alice", "correct-pw");
    let store = MemoryTokenStore::new();
    let session = Arc::new(session(api.client(), &store));

    let a = tokio::spawn({
        let session = session.clone();
        async move { session.login("alice", "correct-pw").await }
    });
    let b = tokio::spawn({
        let session = session.clone();
        async move { session.login("alice", "correct-pw").await }
    });
    assert!(a.await.unwrap().is_success());
    assert!(b.await.unwrap().is_success());

    // The session holds whichever login committed last, and storage agrees.
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(store.load().unwrap(), session.token());
    api.shutdown.trigger();
}
