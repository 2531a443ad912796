use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::types::{AccessToken, LoginRequest, SessionTokens, UserId};

use super::config::ProxyConfig;
use super::cookies;
use super::error::ProxyError;
use super::state::ProxyState;

/// Create the proxy router.
///
/// Mounts `POST {api}/auth`, `GET {api}/refresh`, and `POST {api}/logout`
/// under the configured path prefix. These three handlers are the only code
/// allowed to touch the refresh-credential cookie.
pub fn proxy_routes(config: ProxyConfig) -> Router {
    let api_path = config.settings.api_path.clone();

    let state = ProxyState {
        http: reqwest::Client::new(),
        settings: config.settings,
    };

    Router::new()
        .route(&format!("{api_path}/auth"), post(authenticate))
        .route(&format!("{api_path}/refresh"), get(refresh))
        .route(&format!("{api_path}/logout"), post(logout))
        .with_state(state)
}

/// What the upstream returns from authenticate. The refresh token goes
/// straight into the cookie and nowhere else; no Debug derive so it cannot
/// leak through logging.
#[derive(Deserialize)]
struct UpstreamGrant {
    user_id: UserId,
    access_token: AccessToken,
    refresh_token: String,
}

// ── Authenticate ───────────────────────────────────────────────────

/// Forward credentials to the upstream; on success, move the refresh token
/// into the HttpOnly cookie and return only the short-lived pair.
async fn authenticate(
    State(state): State<ProxyState>,
    jar: CookieJar,
    Json(login): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionTokens>), ProxyError> {
    let response = state
        .http
        .post(state.settings.upstream_auth_url.clone())
        .json(&serde_json::json!({
            "username": login.username,
            "password": login.password,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "upstream rejected authentication");
        return Err(ProxyError::Rejected(response.status()));
    }

    let grant: UpstreamGrant = response.json().await?;

    let (refresh_cookie, remember_cookie) = cookies::session_cookies(
        &grant.refresh_token,
        login.remember_user,
        state.settings.secure_cookies,
        &state.settings.refresh_cookie_path,
        state.settings.remember_ttl_days,
    );

    tracing::info!(user_id = %grant.user_id, "user authenticated");

    Ok((
        jar.add(refresh_cookie).add(remember_cookie),
        Json(SessionTokens {
            user_id: grant.user_id,
            access_token: grant.access_token,
        }),
    ))
}

// ── Refresh ────────────────────────────────────────────────────────

/// Trade the cookie-held refresh credential for a new access token.
///
/// Reads the cookie, never writes one: cookie state only changes at
/// authenticate and logout. Without the cookie this answers 401 without
/// contacting the upstream.
async fn refresh(
    State(state): State<ProxyState>,
    jar: CookieJar,
) -> Result<Json<SessionTokens>, ProxyError> {
    let refresh_token = jar
        .get(cookies::REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ProxyError::MissingRefreshToken)?;

    let response = state
        .http
        .post(state.settings.upstream_refresh_url.clone())
        .bearer_auth(refresh_token)
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "upstream rejected refresh");
        return Err(ProxyError::Rejected(response.status()));
    }

    // The upstream rotates its refresh token on every call; the rotated value
    // is dropped here, keeping the cookie set at login valid until logout.
    let tokens: SessionTokens = response.json().await?;

    tracing::debug!(user_id = %tokens.user_id, "access token refreshed");
    Ok(Json(tokens))
}

// ── Logout ─────────────────────────────────────────────────────────

/// Delete the session cookies by overwriting them with values that expired
/// at the Unix epoch. No upstream call is involved.
async fn logout(State(state): State<ProxyState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let (refresh_cookie, remember_cookie) =
        cookies::clear_session_cookies(&state.settings.refresh_cookie_path);

    tracing::info!("session cookies cleared");

    (
        jar.add(refresh_cookie).add(remember_cookie),
        StatusCode::OK,
    )
}
