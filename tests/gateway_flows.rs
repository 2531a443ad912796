//! End-to-end credential lifecycle tests.
//!
//! A stub backend and a real proxy router are served on ephemeral ports; the
//! client stack talks to both over real TCP, with reqwest's cookie jar
//! standing in for the browser.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde_json::json;
use url::Url;

use quizlink_session::{
    ApiGateway, ApiRequest, ClientConfig, CredentialStore, LinkTokenExchanger, ProxyConfig,
    SessionClient, ShareableToken, UrlToken, proxy_routes,
};

const REFRESH_CREDENTIAL: &str = "rt-0";
const VALID_URL_TOKEN: &str = "one-time-ok";

/// In-memory resource API: issues tokens, validates bearers, counts calls.
#[derive(Default)]
struct StubBackend {
    issued: AtomicU32,
    valid_bearers: Mutex<HashSet<String>>,
    resource_bearers: Mutex<Vec<String>>,
    refresh_calls: AtomicU32,
    resource_calls: AtomicU32,
    refresh_revoked: AtomicBool,
}

impl StubBackend {
    fn issue_access(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("access-{n}");
        self.valid_bearers.lock().insert(token.clone());
        token
    }

    fn issue_shareable(&self, quiz: i64) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("shareable-{quiz}-{n}");
        self.valid_bearers.lock().insert(token.clone());
        token
    }

    /// Server-side token expiry: every previously issued bearer stops
    /// validating.
    fn expire_all(&self) {
        self.valid_bearers.lock().clear();
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn stub_authenticate(
    State(stub): State<Arc<StubBackend>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if body["username"] == "alice" && body["password"] == "hunter2" {
        let token = stub.issue_access();
        Json(json!({
            "user_id": 7,
            "access_token": token,
            "refresh_token": REFRESH_CREDENTIAL,
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "bad credentials" })),
        )
            .into_response()
    }
}

async fn stub_refresh(State(stub): State<Arc<StubBackend>>, headers: HeaderMap) -> Response {
    stub.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !stub.refresh_revoked.load(Ordering::SeqCst) && bearer(&headers) == Some(REFRESH_CREDENTIAL)
    {
        let token = stub.issue_access();
        // Rotated refresh token in the body: the proxy must drop it.
        Json(json!({
            "user_id": 7,
            "access_token": token,
            "refresh_token": "rt-rotated",
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid refresh token" })),
        )
            .into_response()
    }
}

async fn stub_validate_url_token(
    State(stub): State<Arc<StubBackend>>,
    Path(quiz): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if body["urlToken"] == VALID_URL_TOKEN {
        Json(json!({ "access_token": stub.issue_shareable(quiz) })).into_response()
    } else {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "invalid url token" })),
        )
            .into_response()
    }
}

async fn stub_quiz_info(
    State(stub): State<Arc<StubBackend>>,
    Path(quiz): Path<i64>,
    headers: HeaderMap,
) -> Response {
    stub.resource_calls.fetch_add(1, Ordering::SeqCst);
    let token = bearer(&headers).unwrap_or_default().to_string();
    stub.resource_bearers.lock().push(token.clone());
    if stub.valid_bearers.lock().contains(&token) {
        Json(json!({ "id": quiz, "name": "Who said it?" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid bearer token" })),
        )
            .into_response()
    }
}

fn stub_router(stub: Arc<StubBackend>) -> Router {
    Router::new()
        .route("/api/auth/authenticate", post(stub_authenticate))
        .route("/api/auth/refresh", post(stub_refresh))
        .route(
            "/api/auth/quizzes/{quiz}/validate-url-token",
            post(stub_validate_url_token),
        )
        .route("/api/quizzes/{quiz}/info", get(stub_quiz_info))
        .with_state(stub)
}

async fn serve(app: Router) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    Ok(addr)
}

struct Harness {
    stub: Arc<StubBackend>,
    store: CredentialStore,
    session: SessionClient,
    gateway: Arc<ApiGateway>,
    link: LinkTokenExchanger,
    quiz_url: Url,
}

/// Stub backend + real proxy + client stack, freshly wired per test.
async fn harness() -> anyhow::Result<Harness> {
    let stub = Arc::new(StubBackend::default());
    let backend_addr = serve(stub_router(Arc::clone(&stub))).await?;
    let backend_root: Url = format!("http://{backend_addr}/api").parse()?;

    let proxy_config = ProxyConfig::new()
        .with_upstream_root(&backend_root)?
        // Plain HTTP in tests; reqwest's jar drops Secure cookies otherwise.
        .with_secure_cookies(false);
    let proxy_addr = serve(proxy_routes(proxy_config)).await?;

    let config = ClientConfig::new()
        .with_proxy_root(&format!("http://{proxy_addr}/api").parse()?)?
        .with_backend_root(backend_root.clone())?;

    let store = CredentialStore::new();
    let session = SessionClient::new(config.clone(), store.clone());
    let gateway = Arc::new(ApiGateway::new(session.clone()));
    let link = LinkTokenExchanger::new(config, store.clone());
    let quiz_url: Url = format!("http://{backend_addr}/api/quizzes/3/info").parse()?;

    Ok(Harness {
        stub,
        store,
        session,
        gateway,
        link,
        quiz_url,
    })
}

#[tokio::test]
async fn login_then_call_attaches_the_access_token() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bearers = h.stub.resource_bearers.lock().clone();
    assert_eq!(bearers, vec!["access-1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn expired_token_triggers_one_refresh_and_one_retry() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    h.stub.expire_all();

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.stub.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.stub.resource_calls.load(Ordering::SeqCst), 2);
    let bearers = h.stub.resource_bearers.lock().clone();
    assert_eq!(bearers, vec!["access-1".to_string(), "access-2".to_string()]);

    // The refreshed session is cached for the next call.
    assert_eq!(
        h.store.get().access_token.map(|t| t.as_str().to_string()),
        Some("access-2".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn missing_token_with_valid_cookie_refreshes_before_the_first_attempt() -> anyhow::Result<()>
{
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    h.store.clear_access_token();

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.stub.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.stub.resource_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn shareable_token_takes_priority_over_the_user_session() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    assert!(
        h.link
            .redeem(3.into(), &UrlToken::from(VALID_URL_TOKEN.to_string()))
            .await
    );

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bearers = h.stub.resource_bearers.lock().clone();
    assert_eq!(bearers.len(), 1);
    assert!(
        bearers[0].starts_with("shareable-"),
        "first attempt used {:?}",
        bearers[0]
    );
    Ok(())
}

#[tokio::test]
async fn rejected_shareable_token_is_dropped_and_never_retried() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    h.store
        .set_shareable_token(ShareableToken::from("stale-shareable".to_string()));

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.store.get().shareable_token.is_none());

    let bearers = h.stub.resource_bearers.lock().clone();
    assert_eq!(
        bearers,
        vec!["stale-shareable".to_string(), "access-1".to_string()]
    );

    // The next call goes straight to the user session.
    h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    let bearers = h.stub.resource_bearers.lock().clone();
    assert_eq!(bearers[2], "access-1");
    Ok(())
}

#[tokio::test]
async fn no_session_yields_a_synthetic_401_without_touching_the_resource_api() -> anyhow::Result<()>
{
    let h = harness().await?;

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.text().await?;
    assert!(body.contains("no stored session"));

    assert_eq!(h.stub.resource_calls.load(Ordering::SeqCst), 0);
    // The proxy rejects the cookie-less refresh on its own.
    assert_eq!(h.stub.refresh_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn redeeming_the_same_url_token_twice_works_both_times() -> anyhow::Result<()> {
    let h = harness().await?;
    let token = UrlToken::from(VALID_URL_TOKEN.to_string());

    assert!(h.link.redeem(3.into(), &token).await);
    let first = h.store.get().shareable_token;
    assert!(first.is_some());

    assert!(h.link.redeem(3.into(), &token).await);
    let second = h.store.get().shareable_token;
    assert!(second.is_some());
    assert_ne!(first, second, "each redemption issues a fresh token");

    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn invalid_url_token_leaves_the_store_untouched() -> anyhow::Result<()> {
    let h = harness().await?;
    let rejected = h
        .link
        .redeem(3.into(), &UrlToken::from("spent".to_string()))
        .await;
    assert!(!rejected);
    assert!(h.store.get().shareable_token.is_none());
    Ok(())
}

#[tokio::test]
async fn logout_is_final() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    h.session.logout().await?;

    let creds = h.store.get();
    assert!(creds.user_id.is_none());
    assert!(creds.access_token.is_none());

    // The cookie is gone, so the silent refresh has nothing to trade in.
    let refresh_calls_before = h.stub.refresh_calls.load(Ordering::SeqCst);
    assert!(h.session.refresh().await.is_none());
    assert_eq!(
        h.stub.refresh_calls.load(Ordering::SeqCst),
        refresh_calls_before,
        "the proxy rejects a cookie-less refresh without calling upstream"
    );
    Ok(())
}

#[tokio::test]
async fn failed_refresh_ends_the_session() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    h.stub.expire_all();
    h.stub.refresh_revoked.store(true, Ordering::SeqCst);

    // The stale attempt's 401 comes back: the refresh failed, so there is no
    // retry.
    let response = h.gateway.send(ApiRequest::get(h.quiz_url.clone())).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.stub.resource_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.stub.refresh_calls.load(Ordering::SeqCst), 1);

    // The dead session is dropped from the store.
    let creds = h.store.get();
    assert!(creds.user_id.is_none());
    assert!(creds.access_token.is_none());
    Ok(())
}

#[tokio::test]
async fn concurrent_expired_calls_share_a_single_refresh() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;
    h.stub.expire_all();

    let (first, second) = tokio::join!(
        h.gateway.send(ApiRequest::get(h.quiz_url.clone())),
        h.gateway.send(ApiRequest::get(h.quiz_url.clone())),
    );
    assert_eq!(first?.status(), StatusCode::OK);
    assert_eq!(second?.status(), StatusCode::OK);

    assert_eq!(
        h.stub.refresh_calls.load(Ordering::SeqCst),
        1,
        "the second caller reuses the token installed by the first"
    );
    Ok(())
}

#[tokio::test]
async fn non_auth_errors_are_returned_without_a_retry() -> anyhow::Result<()> {
    let h = harness().await?;
    h.session.login("alice", "hunter2", false).await?;

    let missing: Url = h.quiz_url.as_str().replace("/info", "/nope").parse()?;
    let response = h.gateway.send(ApiRequest::get(missing)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(h.stub.refresh_calls.load(Ordering::SeqCst), 0);
    Ok(())
}
