use std::sync::Arc;

use crate::store::CredentialStore;
use crate::types::{LinkRedemption, QuizId, ShareableGrant, UrlToken};

use super::config::ClientConfig;

/// Redeems a one-time URL token from a shared quiz link for a quiz-scoped
/// shareable token.
///
/// This is the only path by which a shareable token enters the credential
/// store. It talks to the backend directly, not the proxy: no long-lived
/// credential is involved.
#[derive(Clone)]
pub struct LinkTokenExchanger {
    config: Arc<ClientConfig>,
    store: CredentialStore,
    http: reqwest::Client,
}

impl LinkTokenExchanger {
    #[must_use]
    pub fn new(config: ClientConfig, store: CredentialStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Validate `token` for `quiz` and cache the issued shareable token.
    ///
    /// Returns `true` when the backend accepted the token and the store now
    /// holds the shareable token. On any rejection or failure returns
    /// `false` and leaves the store untouched. Redeeming the same valid
    /// token again simply issues a fresh shareable token.
    pub async fn redeem(&self, quiz: QuizId, token: &UrlToken) -> bool {
        let url = match self.config.link_validation_url(quiz) {
            Ok(url) => url,
            Err(error) => {
                tracing::error!(%error, "unusable backend root for URL token validation");
                return false;
            }
        };

        let body = LinkRedemption {
            url_token: token.clone(),
        };
        let response = match self.http.post(url).json(&body).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, quiz = %quiz, "URL token validation request failed");
                return false;
            }
        };
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), quiz = %quiz, "URL token rejected");
            return false;
        }

        match response.json::<ShareableGrant>().await {
            Ok(grant) => {
                self.store.set_shareable_token(grant.access_token);
                tracing::debug!(quiz = %quiz, "shareable token cached");
                true
            }
            Err(error) => {
                tracing::warn!(%error, quiz = %quiz, "URL token response malformed");
                false
            }
        }
    }
}
