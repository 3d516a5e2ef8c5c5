//! Integration tests for the authentication state provider

use std::time::Duration;

use futures::future::join_all;
use quizdeck_core::{LoginRequest, RegisterRequest};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quizdeck_http::{AuthStatus, ClientError, QuizClient, Session};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("quizdeck_http=debug")
        .try_init();
}

fn session_for(server: &MockServer) -> Session {
    let client = QuizClient::builder().base_url(server.uri()).build().unwrap();
    Session::new(client)
}

fn user_json() -> serde_json::Value {
    json!({"id": 7, "username": "maya", "email": "maya@example.com", "role": "student"})
}

async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/csrf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"csrfToken": "boot-tok"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn initialize_resolves_to_authenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(2)
        .mount(&server)
        .await;

    let session = session_for(&server);
    assert_eq!(session.status(), AuthStatus::Initializing);

    session.initialize().await;

    assert!(session.is_authenticated());
    assert_eq!(session.current_user().unwrap().username, "maya");

    // Re-probing on demand is idempotent for an unchanged backend session.
    session.check_status().await;
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn initialize_resolves_to_anonymous_on_401() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.initialize().await;

    assert_eq!(session.status(), AuthStatus::Anonymous);
}

#[tokio::test]
async fn probe_fails_closed_on_transport_errors() {
    // Nothing is listening here; the connection is refused.
    let client = QuizClient::builder()
        .base_url("http://127.0.0.1:9")
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let session = Session::new(client);

    session.initialize().await;

    assert_eq!(session.status(), AuthStatus::Anonymous);
}

#[tokio::test]
async fn login_authenticates_and_absorbs_rotated_token() {
    init_tracing();
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    let credentials = LoginRequest {
        email: "maya@example.com".to_owned(),
        password: "hunter2".to_owned(),
    };

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(body_json(&credentials))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "user": user_json(),
            "csrfToken": "fresh-tok",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let user = session.login(&credentials).await.unwrap();

    assert_eq!(user.id, 7);
    assert!(session.is_authenticated());
    assert_eq!(
        session.client().csrf().peek_token().as_deref(),
        Some("fresh-tok")
    );
}

#[tokio::test]
async fn login_failure_preserves_current_state() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("GET"))
        .and(path("/me/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"ok": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session.initialize().await;

    let result = session
        .login(&LoginRequest {
            email: "maya@example.com".to_owned(),
            password: "wrong".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(ClientError::BadRequest(_))));
    assert_eq!(session.status(), AuthStatus::Anonymous);
}

#[tokio::test]
async fn login_without_user_in_body_is_an_error() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let result = session
        .login(&LoginRequest {
            email: "maya@example.com".to_owned(),
            password: "hunter2".to_owned(),
        })
        .await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert_eq!(session.status(), AuthStatus::Initializing);
}

#[tokio::test]
async fn register_logs_the_new_user_in() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "ok": true,
            "user": user_json(),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let user = session
        .register(&RegisterRequest {
            username: "maya".to_owned(),
            email: "maya@example.com".to_owned(),
            password: "hunter2".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(user.username, "maya");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_state_even_when_the_backend_fails() {
    init_tracing();
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "user": user_json(),
            "csrfToken": "fresh-tok",
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session
        .login(&LoginRequest {
            email: "maya@example.com".to_owned(),
            password: "hunter2".to_owned(),
        })
        .await
        .unwrap();
    assert!(session.is_authenticated());

    session.logout().await;

    assert_eq!(session.status(), AuthStatus::Anonymous);
    assert_eq!(session.client().csrf().peek_token(), None);
}

#[tokio::test]
async fn redundant_401s_transition_to_anonymous_exactly_once() {
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "user": user_json(),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;

    let session = session_for(&server);
    session
        .login(&LoginRequest {
            email: "maya@example.com".to_owned(),
            password: "hunter2".to_owned(),
        })
        .await
        .unwrap();

    let mut watcher = session.subscribe();
    watcher.borrow_and_update();

    // Three requests race, all come back 401, all broadcast expiry.
    let results = join_all((0..3).map(|_| session.client().me())).await;
    for result in results {
        assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    }

    // Exactly one observable transition: the first expiry flips the state,
    // the rest find it already anonymous.
    tokio::time::timeout(Duration::from_secs(1), watcher.changed())
        .await
        .expect("expiry transition never arrived")
        .unwrap();
    assert_eq!(*watcher.borrow_and_update(), AuthStatus::Anonymous);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!watcher.has_changed().unwrap());
}
