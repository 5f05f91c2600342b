//! Two-tier execution against fake transports and real sockets.

mod common;

use common::*;
use qblog::api::models::{Credentials, NewBlog};
use qblog::api::{ApiClient, ApiError, AttemptError, RawResponse, RequestBody};
use std::time::Duration;

const BLOG_JSON: &str = r#"{"id":"b1","title":"Hello","content":"Hello, world!","tags":["intro"],"author_id":"u-alice","author_username":"alice","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#;

#[tokio::test]
async fn test_primary_success_never_invokes_secondary() {
    let primary = ScriptedTransport::ok("primary", 200, BLOG_JSON);
    let secondary = ScriptedTransport::ok("fallback", 200, BLOG_JSON);
    let client = scripted_client(primary.clone(), secondary.clone());

    let blog = client.get_blog("b1").await.unwrap();
    assert_eq!(blog.title, "Hello");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn test_secondary_result_returned_after_primary_failure() {
    let primary = ScriptedTransport::refusing("primary");
    let secondary = ScriptedTransport::ok("fallback", 200, BLOG_JSON);
    let client = scripted_client(primary.clone(), secondary.clone());

    let blog = client.get_blog("b1").await.unwrap();
    assert_eq!(blog.id, "b1");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn test_both_fail_reports_status_over_transport() {
    let primary = ScriptedTransport::ok("primary", 404, r#"{"detail":"Blog not found"}"#);
    let secondary = ScriptedTransport::refusing("fallback");
    let client = scripted_client(primary, secondary);

    let err = client.get_blog("missing").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::NotFound {
            detail: "Blog not found".into()
        }
    );
}

#[tokio::test]
async fn test_both_transport_failures_are_service_unavailable() {
    let client = scripted_client(ScriptedTransport::refusing("primary"), ScriptedTransport::refusing("fallback"));
    let err = client.list_blogs(&Default::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_malformed_primary_body_falls_back() {
    let primary = ScriptedTransport::ok("primary", 200, "<html>maintenance</html>");
    let secondary = ScriptedTransport::ok("fallback", 200, "[]");
    let client = scripted_client(primary, secondary.clone());

    assert!(client.list_blogs(&Default::default()).await.unwrap().is_empty());
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn test_both_tiers_see_the_same_request() {
    let primary = ScriptedTransport::refusing("primary");
    let secondary = ScriptedTransport::ok("fallback", 201, BLOG_JSON);
    let client = scripted_client(primary.clone(), secondary.clone());

    let new_blog = NewBlog {
        title: "Hello".into(),
        content: "Hello, world!".into(),
        tags: vec!["intro".into()],
    };
    client.create_blog(Some("tok123"), &new_blog).await.unwrap();

    let first = &primary.seen()[0];
    let second = &secondary.seen()[0];
    assert_eq!(first, second);
    assert_eq!(first.bearer.as_deref(), Some("tok123"));
    assert!(matches!(first.body, RequestBody::Json(_)));
}

#[tokio::test]
async fn test_user_blogs_resolves_author_within_each_tier() {
    let primary = ScriptedTransport::new(
        "primary",
        vec![
            Ok(RawResponse::new(200, format!("[{USER_JSON}]"))),
            Err(AttemptError::Transport("reset".into())),
        ],
    );
    let secondary = ScriptedTransport::new(
        "fallback",
        vec![
            Ok(RawResponse::new(200, format!("[{USER_JSON}]"))),
            Ok(RawResponse::new(200, format!("[{BLOG_JSON}]"))),
        ],
    );
    let client = scripted_client(primary.clone(), secondary.clone());

    let blogs = client.user_blogs("alice").await.unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(primary.calls(), 2);
    assert_eq!(secondary.calls(), 2);
    assert!(secondary.seen()[1]
        .query
        .contains(&("author_id".to_string(), "u-alice".to_string())));
}

#[tokio::test]
async fn test_user_blogs_unknown_user_is_empty() {
    let client = scripted_client(
        ScriptedTransport::ok("primary", 200, "[]"),
        ScriptedTransport::ok("fallback", 200, "[]"),
    );
    assert!(client.user_blogs("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_not_found_makes_exactly_two_attempts() {
    let backend =
        start_programmable_backend(|_req| async { (404, r#"{"detail":"Blog not found"}"#.to_string()) }).await;
    let client = ApiClient::builder(backend.url()).build().unwrap();

    let err = client.delete_blog(Some("tok123"), "b404").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail(), "Blog not found");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method == "DELETE" && r.path() == "/api/blogs/b404"));
}

#[tokio::test]
async fn test_get_blog_is_repeatable() {
    let api = start_mock_api().await;
    let alice = api.seed_user("alice", "correct-pw");
    let blog = api
        .store
        .create_blog(
            &alice,
            &NewBlog {
                title: "Stable".into(),
                content: "Same every time".into(),
                tags: vec![],
            },
        )
        .unwrap();

    let client = api.client();
    let first = client.get_blog(&blog.id).await.unwrap();
    let second = client.get_blog(&blog.id).await.unwrap();
    assert_eq!(first, second);
    api.shutdown.trigger();
}

#[tokio::test]
async fn test_fallback_transport_sends_explicit_headers() {
    let backend = start_programmable_backend(|req| async move {
        // Only the JSON re-encoded login is accepted.
        if req.header("content-type") == Some("application/json") {
            (200, r#"{"access_token":"tok123","token_type":"bearer"}"#.to_string())
        } else {
            (503, r#"{"detail":"form logins disabled"}"#.to_string())
        }
    })
    .await;
    let client = ApiClient::builder(backend.url())
        .origin("http://localhost:5173")
        .build()
        .unwrap();

    let token = client
        .login(&Credentials {
            username: "alice".into(),
            password: "correct-pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(token.access_token, "tok123");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(requests[0].body, "username=alice&password=correct-pw");
    assert_eq!(requests[1].header("origin"), Some("http://localhost:5173"));
    let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(body, serde_json::json!({"username": "alice", "password": "correct-pw"}));
}

#[tokio::test]
async fn test_slow_attempts_time_out() {
    let backend = start_programmable_backend(|_req| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        (200, "[]".to_string())
    })
    .await;
    let client = ApiClient::builder(backend.url())
        .attempt_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = client.list_blogs(&Default::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn test_fallback_host_used_when_primary_unreachable() {
    let api = start_mock_api().await;
    let dead = unused_addr().await;

    let client = ApiClient::builder(format!("http://{dead}"))
        .fallback_base_url(api.url())
        .attempt_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    assert!(client.list_blogs(&Default::default()).await.unwrap().is_empty());
    api.shutdown.trigger();
}
