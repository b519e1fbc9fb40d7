//! End-to-end tests against a mocked Gatehouse service.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatehouse_client::{
    ApiResult, ClientConfig, ClientError, GatehouseClient, Transport, CROSS_DOMAIN_HINT,
};

async fn client_for(server: &MockServer) -> GatehouseClient {
    let config = ClientConfig::new(&server.uri(), "https://app.example.com/callback")
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    GatehouseClient::new(config).unwrap()
}

fn session_body(access: &str, refresh: &str, user_id: &str) -> serde_json::Value {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "expiresIn": 900,
        "user": {"id": user_id, "email": "ada@example.com", "emailVerified": true}
    })
}

#[tokio::test]
async fn sign_in_stores_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("SignIn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"signIn": session_body("at-1", "rt-1", "u1")}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.sign_in("ada@example.com", "hunter2").await.unwrap();

    let session = result.ok().expect("service accepted the credentials");
    assert_eq!(session.access_token, "at-1");
    assert_eq!(session.user.id, "u1");
    assert_eq!(client.tokens().access_token().as_deref(), Some("at-1"));
    assert_eq!(client.tokens().refresh_token().as_deref(), Some("rt-1"));
}

#[tokio::test]
async fn sign_in_refusal_is_a_value_and_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "wrong password", "code": "InvalidCredentials"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.sign_in("ada@example.com", "wrong").await.unwrap();

    assert!(result.is_err());
    assert_eq!(result.errors()[0].message, "wrong password");
    assert_eq!(result.errors()[0].code.as_deref(), Some("InvalidCredentials"));
    assert_eq!(client.tokens().access_token(), None);
}

#[tokio::test]
async fn sign_out_clears_stored_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("SignOut"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"signOut": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.tokens().set_access_token("at-1");
    client.tokens().set_refresh_token("rt-1");

    let result = client.sign_out().await.unwrap();
    assert_eq!(result.ok(), Some(true));
    assert_eq!(client.tokens().access_token(), None);
    assert_eq!(client.tokens().refresh_token(), None);
}

#[tokio::test]
async fn session_falls_back_to_stored_token_on_422() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("CurrentSession"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{"message": "Unprocessable Entity"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("Viewer"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"viewer": {"id": "u1", "email": "ada@example.com"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.tokens().set_access_token("at-1");
    client.tokens().set_refresh_token("rt-1");

    let session = client.session().await.unwrap().ok().expect("fallback resolved");
    // Token fields come from the store, not the profile response.
    assert_eq!(session.access_token, "at-1");
    assert_eq!(session.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(session.user.id, "u1");
}

#[tokio::test]
async fn session_returns_original_errors_when_fallback_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{"message": "Unprocessable Entity"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri(), "https://app.example.com/callback")
        .unwrap()
        .with_token_fallback(false);
    let client = GatehouseClient::new(config).unwrap();
    client.tokens().set_access_token("at-1");

    let result = client.session().await.unwrap();
    assert!(result.is_err());
    assert_eq!(result.errors()[0].message, CROSS_DOMAIN_HINT);
}

#[tokio::test]
async fn session_returns_original_errors_without_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [{"message": "Unprocessable Entity"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.session().await.unwrap();
    assert!(result.is_err());
    assert_eq!(result.errors()[0].message, CROSS_DOMAIN_HINT);
}

#[tokio::test]
async fn session_with_token_validates_exactly_the_given_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("Viewer"))
        .and(header("authorization", "Bearer explicit-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"viewer": {"id": "u2", "email": "bob@example.com"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    // A stored token must not leak into the explicit variant.
    client.tokens().set_access_token("stored-token");

    let session = client
        .session_with_token("explicit-token")
        .await
        .unwrap()
        .ok()
        .expect("token resolved a profile");
    assert_eq!(session.access_token, "explicit-token");
    assert_eq!(session.refresh_token, None);
    assert_eq!(session.user.id, "u2");
}

#[tokio::test]
async fn profile_maps_401_error_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Unauthorized"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.profile(Some("expired")).await.unwrap();
    assert!(result.is_err());
    assert_eq!(result.errors()[0].message, "Unauthorized");
    assert_eq!(result.errors()[0].code.as_deref(), Some("Unauthorized"));
}

#[tokio::test]
async fn oauth_token_exchange_stores_bare_object_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-oauth",
            "refresh_token": "rt-oauth",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let tokens = client.oauth_token("code-123").await.unwrap().ok().unwrap();
    assert_eq!(tokens.access_token, "at-oauth");
    assert_eq!(client.tokens().access_token().as_deref(), Some("at-oauth"));
    assert_eq!(client.tokens().refresh_token().as_deref(), Some("rt-oauth"));
}

#[tokio::test]
async fn oauth_authorize_sends_configured_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/authorize"))
        .and(body_string_contains("provider=github"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_url": "https://github.com/login/oauth/authorize?state=s1",
            "state": "s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let payload = client.oauth_authorize("github").await.unwrap().ok().unwrap();
    assert!(payload.authorization_url.contains("github.com"));
    assert_eq!(payload.state.as_deref(), Some("s1"));
}

#[tokio::test]
async fn refresh_session_uses_form_encoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-2",
            "refresh_token": "rt-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let tokens = client.refresh_session("rt-1").await.unwrap().ok().unwrap();
    assert_eq!(tokens.access_token, "at-2");
    assert_eq!(client.tokens().refresh_token().as_deref(), Some("rt-2"));
}

#[tokio::test]
async fn transport_plain_get_attaches_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri(), "https://app.example.com/callback").unwrap();
    let transport = Transport::new(Arc::new(config)).unwrap();

    let raw = transport.get("/healthz", Some("at-1")).await.unwrap();
    assert_eq!(raw.status.as_u16(), 200);
    assert!(raw.body.contains("ok"));
}

#[tokio::test]
async fn transport_plain_post_json_sends_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/introspect"))
        .and(body_partial_json(json!({"token": "at-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"active": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri(), "https://app.example.com/callback").unwrap();
    let transport = Transport::new(Arc::new(config)).unwrap();

    let raw = transport
        .post_json("/introspect", json!({"token": "at-1"}), None)
        .await
        .unwrap();
    assert_eq!(raw.status.as_u16(), 200);
    assert!(raw.body.contains("active"));
}

#[tokio::test]
async fn timeout_is_raised_not_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"signIn": session_body("at", "rt", "u")}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri(), "https://app.example.com/callback")
        .unwrap()
        .with_timeout(Duration::from_millis(50));
    let client = GatehouseClient::new(config).unwrap();

    let err = client.sign_in("ada@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout));
    assert_eq!(client.tokens().access_token(), None);
}

#[tokio::test]
async fn cancellation_aborts_without_touching_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"signIn": session_body("at", "rt", "u")}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let cancel = CancellationToken::new();
    let handle = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { client.sign_in_with_cancel("ada@example.com", "pw", cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
    assert_eq!(client.tokens().access_token(), None);
}

#[tokio::test]
async fn empty_success_body_resolves_to_default_view() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let result = client.profile(Some("at-1")).await.unwrap();
    match result {
        ApiResult::Ok(profile) => assert!(profile.id.is_empty()),
        ApiResult::Err(errors) => panic!("expected lenient default, got {:?}", errors),
    }
}

#[tokio::test]
async fn api_key_and_extra_headers_are_attached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", "gh-live-123"))
        .and(header("x-client-version", "1.4.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"viewer": {"id": "u1", "email": "ada@example.com"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri(), "https://app.example.com/callback")
        .unwrap()
        .with_api_key("gh-live-123")
        .with_header("X-Client-Version", "1.4.2");
    let client = GatehouseClient::new(config).unwrap();

    let result = client.profile(Some("at-1")).await.unwrap();
    assert!(result.is_ok());
}
