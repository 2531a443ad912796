use reqwest::{Response, StatusCode};
use tokio::sync::Mutex;

use crate::error::Error;
use crate::types::{AccessToken, ShareableToken};

use super::request::ApiRequest;
use super::session::SessionClient;

/// Retrying fetch wrapper around the resource API.
///
/// Attaches the right bearer credential for the caller's trust tier, treats
/// 401/403 as an expired or mis-scoped credential, silently refreshes the
/// session through the proxy, and re-issues the request at most once.
///
/// Per call: at most one shareable attempt, one user attempt, one refresh
/// and one post-refresh retry. The post-refresh response is returned
/// whatever its status, so the machine can never loop.
///
/// A shareable token always wins over a cached access token: a shared quiz
/// link must work for a signed-in caller without silently consuming their
/// own session. The first time the backend rejects the shareable token it is
/// dropped from the store and never retried.
pub struct ApiGateway {
    session: SessionClient,
    // Concurrent calls that both lose their token serialize here, so only
    // one of them pays for the refresh round trip.
    refresh_gate: Mutex<()>,
}

/// Where a call stands in the credential ladder.
enum Attempt {
    NoCredential,
    HasShareable(ShareableToken),
    HasAccess(AccessToken),
    Refreshing { last: Option<Response> },
    Exhausted { last: Option<Response> },
}

impl ApiGateway {
    #[must_use]
    pub fn new(session: SessionClient) -> Self {
        Self {
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Issue `request` with the best credential available.
    ///
    /// Returns the final HTTP response: a success, a non-auth error
    /// (4xx/5xx are surfaced to the caller, not retried), the post-refresh
    /// response, or a synthetic `401` when there was nothing to attach and
    /// no refresh credential to fall back on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on a transport-level failure of whichever
    /// attempt was in flight; the failure is logged first.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, Error> {
        let store = self.session.store();
        let credentials = store.get();
        let observed_epoch = store.epoch();

        let mut state = match (&credentials.shareable_token, &credentials.access_token) {
            (Some(token), _) => Attempt::HasShareable(token.clone()),
            (None, Some(token)) => Attempt::HasAccess(token.clone()),
            (None, None) => Attempt::NoCredential,
        };

        loop {
            state = match state {
                Attempt::NoCredential => Attempt::Refreshing { last: None },

                Attempt::HasShareable(token) => {
                    let response = self.execute(&request, token.as_str()).await?;
                    if !is_auth_failure(response.status()) {
                        // The shareable path short-circuits everything else
                        // when it works.
                        return Ok(response);
                    }
                    // Rejected for this caller (e.g. a guest context
                    // superseded by a real login): drop it, never retry it.
                    tracing::debug!(
                        status = %response.status(),
                        "shareable token rejected, discarding"
                    );
                    store.clear_shareable_token();
                    match credentials.access_token.clone() {
                        Some(access) => Attempt::HasAccess(access),
                        None => Attempt::Refreshing {
                            last: Some(response),
                        },
                    }
                }

                Attempt::HasAccess(token) => {
                    let response = self.execute(&request, token.as_str()).await?;
                    if !is_auth_failure(response.status()) {
                        return Ok(response);
                    }
                    Attempt::Refreshing {
                        last: Some(response),
                    }
                }

                Attempt::Refreshing { last } => {
                    let gate = self.refresh_gate.lock().await;
                    // A concurrent call may have refreshed while we waited
                    // on the gate; reuse its token instead of spending
                    // another round trip.
                    let token = match self.installed_since(observed_epoch) {
                        Some(token) => {
                            tracing::debug!("reusing access token from concurrent refresh");
                            Some(token)
                        }
                        None => {
                            let refreshed =
                                self.session.refresh().await.map(|tokens| tokens.access_token);
                            if refreshed.is_none() {
                                // The cookie can no longer mint tokens; the
                                // session is over. Drop whatever is left so
                                // callers see an unauthenticated state.
                                store.clear();
                            }
                            refreshed
                        }
                    };
                    drop(gate);

                    match token {
                        // One retry, returned as-is: success or failure, the
                        // machine is done.
                        Some(token) => return self.execute(&request, token.as_str()).await,
                        None => Attempt::Exhausted { last },
                    }
                }

                Attempt::Exhausted { last } => {
                    return Ok(last.unwrap_or_else(no_session_response));
                }
            };
        }
    }

    /// The access token installed by another call since `observed_epoch`,
    /// if any.
    fn installed_since(&self, observed_epoch: u64) -> Option<AccessToken> {
        let store = self.session.store();
        if store.epoch() == observed_epoch {
            return None;
        }
        store.get().access_token
    }

    async fn execute(&self, request: &ApiRequest, bearer: &str) -> Result<Response, Error> {
        request
            .builder(self.session.http())
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(%error, url = %request.url(), "request transport failure");
                Error::from(error)
            })
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// 401 produced without touching the network: nothing cached, nothing to
/// refresh with.
fn no_session_response() -> Response {
    let mut response = http::Response::new(r#"{"error":"no stored session"}"#);
    *response.status_mut() = http::StatusCode::UNAUTHORIZED;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    Response::from(response)
}
