use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Backend user identifier.
///
/// Issued by the resource API alongside every access token. An access token
/// is never cached without the user id it belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Quiz identifier — the only resource a shareable token can be scoped to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct QuizId(pub i64);

/// Short-lived bearer token authorizing requests as a signed-in user.
///
/// Opaque: the backend issues and validates it, this crate only caches and
/// attaches it. Held in memory for the lifetime of the session, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bearer token scoped to exactly one quiz, obtained by redeeming a
/// shareable link. The backend enforces the scope; the client only caches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct ShareableToken(String);

impl ShareableToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One-time token embedded in a shareable quiz link, exchanged for a
/// [`ShareableToken`] by
/// [`LinkTokenExchanger::redeem`](crate::client::LinkTokenExchanger::redeem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct UrlToken(String);

impl UrlToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// User id + access token pair, as returned by the proxy `auth` and
/// `refresh` endpoints.
///
/// This is the whole body: the refresh token is set as an HttpOnly cookie by
/// the proxy and deliberately has no field here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub user_id: UserId,
    pub access_token: AccessToken,
}

/// Credentials sent to the proxy `auth` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// When set, the refresh cookie persists across browser restarts.
    #[serde(default)]
    pub remember_user: bool,
}

/// Body POSTed to the backend's URL-token validation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRedemption {
    #[serde(rename = "urlToken")]
    pub url_token: UrlToken,
}

/// Backend response to a successful URL-token redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareableGrant {
    pub access_token: ShareableToken,
}
