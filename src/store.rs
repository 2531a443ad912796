//! In-memory holder of the current session credentials.
//!
//! The store is a cheaply-cloneable handle: every clone views the same
//! state, so it can be threaded through the refresher, the link exchanger,
//! and the request gateway instead of living in ambient global context.
//! Nothing here performs I/O and nothing is ever persisted.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{AccessToken, ShareableToken, UserId};

/// Snapshot of the session tuple at a point in time.
///
/// `access_token` is only ever `Some` together with `user_id`. At most one
/// access token and one shareable token are cached; a newly obtained one
/// overwrites the previous.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user_id: Option<UserId>,
    pub access_token: Option<AccessToken>,
    pub shareable_token: Option<ShareableToken>,
}

#[derive(Debug, Default)]
struct Inner {
    credentials: Credentials,
    epoch: u64,
}

/// Shared, in-memory credential store.
///
/// Starts empty at application bootstrap and is populated by a successful
/// login or silent refresh. Tokens are opaque strings; the store does not
/// validate their contents.
///
/// Concurrent writers may race: last write wins. Callers that read, await a
/// network response, and write back get no transaction around the sequence.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Inner>>,
}

impl CredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current credentials.
    #[must_use]
    pub fn get(&self) -> Credentials {
        self.inner.read().credentials.clone()
    }

    /// Store a freshly issued user session.
    ///
    /// Taking both values in one call is what guarantees an access token is
    /// never cached without the user id it was issued for.
    pub fn set_session(&self, user_id: UserId, access_token: AccessToken) {
        let mut inner = self.inner.write();
        inner.credentials.user_id = Some(user_id);
        inner.credentials.access_token = Some(access_token);
        inner.epoch += 1;
    }

    /// Drop the cached access token, keeping the user id and any shareable
    /// token. Used when a token is known to be stale.
    pub fn clear_access_token(&self) {
        let mut inner = self.inner.write();
        inner.credentials.access_token = None;
        inner.epoch += 1;
    }

    /// Cache a quiz-scoped shareable token alongside (not instead of) any
    /// user session.
    pub fn set_shareable_token(&self, token: ShareableToken) {
        self.inner.write().credentials.shareable_token = Some(token);
    }

    /// Drop the shareable token. Called the first time the backend rejects
    /// it, so it is never retried.
    pub fn clear_shareable_token(&self) {
        self.inner.write().credentials.shareable_token = None;
    }

    /// Clear the whole session: logout or unrecoverable refresh failure.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.credentials = Credentials::default();
        inner.epoch += 1;
    }

    /// Monotonic counter bumped on every access-token write or clear.
    ///
    /// The gateway compares epochs around its refresh step to detect that a
    /// concurrent call already installed a fresh token.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.read().epoch
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("CredentialStore")
            .field("user_id", &inner.credentials.user_id)
            .field("has_access_token", &inner.credentials.access_token.is_some())
            .field(
                "has_shareable_token",
                &inner.credentials.shareable_token.is_some(),
            )
            .finish()
    }
}
