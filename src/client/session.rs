use std::sync::Arc;

use crate::error::Error;
use crate::store::CredentialStore;
use crate::types::{LoginRequest, SessionTokens};

use super::config::ClientConfig;

/// Client for the same-origin proxy endpoints: login, silent refresh,
/// logout.
///
/// Holds a cookie-enabled HTTP client so the proxy's HttpOnly refresh cookie
/// rides along exactly as it would in a browser. The cookie value itself is
/// never readable from this side; the only way to use it is to call
/// [`refresh`](Self::refresh).
///
/// Cheap to clone; clones share the HTTP client (and thus the cookie jar),
/// the configuration, and the credential store.
#[derive(Clone)]
pub struct SessionClient {
    config: Arc<ClientConfig>,
    store: CredentialStore,
    http: reqwest::Client,
}

impl SessionClient {
    #[must_use]
    pub fn new(config: ClientConfig, store: CredentialStore) -> Self {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("default HTTP client");
        Self {
            config: Arc::new(config),
            store,
            http,
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    ///
    /// The client must keep a cookie store, or the refresh credential set at
    /// login is lost and every [`refresh`](Self::refresh) will fail.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Authenticate with the proxy and cache the returned session.
    ///
    /// On success the proxy has set the refresh cookie in this client's jar
    /// and the store holds the new user id + access token. With
    /// `remember_user` the cookie persists across restarts; otherwise it is
    /// a session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure, or [`Error::Api`] when
    /// the proxy passes through a backend rejection (bad credentials map to
    /// the backend's status).
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember_user: bool,
    ) -> Result<SessionTokens, Error> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            remember_user,
        };
        let response = self
            .http
            .post(self.config.auth_url().clone())
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, "login").await?;
        let tokens: SessionTokens = response.json().await?;

        self.store
            .set_session(tokens.user_id, tokens.access_token.clone());
        tracing::info!(user_id = %tokens.user_id, "login succeeded");
        Ok(tokens)
    }

    /// Exchange the cookie-held refresh credential for a new access token.
    ///
    /// Exactly one network call per invocation; no retry. On success the
    /// store is updated and the new pair returned. On any failure —
    /// transport error, non-2xx, malformed body — returns `None` and leaves
    /// the store untouched.
    pub async fn refresh(&self) -> Option<SessionTokens> {
        tracing::debug!("refreshing access token");
        let response = match self.http.get(self.config.refresh_url().clone()).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, "refresh request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "refresh rejected");
            return None;
        }
        let tokens: SessionTokens = match response.json().await {
            Ok(tokens) => tokens,
            Err(error) => {
                tracing::debug!(%error, "refresh response malformed");
                return None;
            }
        };

        self.store
            .set_session(tokens.user_id, tokens.access_token.clone());
        Some(tokens)
    }

    /// End the session: the proxy expires the refresh cookie, then the whole
    /// credential store is cleared. A subsequent [`refresh`](Self::refresh)
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure or [`Error::Api`] on an
    /// unexpected proxy status; the store is left untouched in that case so
    /// the caller can surface a retryable error.
    pub async fn logout(&self) -> Result<(), Error> {
        let response = self.http.post(self.config.logout_url().clone()).send().await?;
        ensure_success(response, "logout").await?;
        self.store.clear();
        tracing::info!("logout succeeded");
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Checks HTTP response status; returns the response on success or an error
/// with details.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    Err(Error::Api {
        operation,
        status: Some(status),
        detail,
    })
}
