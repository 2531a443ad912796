//! Browser-side credential lifecycle.
//!
//! Four collaborators, wired together by a shared [`CredentialStore`]
//! handle instead of ambient global state:
//!
//! - [`SessionClient`] — login, logout, and the silent refresh that trades
//!   the cookie-held long-lived credential for a fresh access token.
//! - [`LinkTokenExchanger`] — turns a one-time URL token from a shared quiz
//!   link into a quiz-scoped shareable token.
//! - [`ApiGateway`] — the retrying fetch wrapper: attaches the right bearer
//!   token, refreshes on 401/403, re-issues the request at most once.
//! - [`ApiRequest`] — plain-data request the gateway can safely re-issue.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quizlink_session::{ApiGateway, ApiRequest, ClientConfig, CredentialStore, SessionClient};
//!
//! let store = CredentialStore::default();
//! let session = SessionClient::new(ClientConfig::from_env()?, store.clone());
//! let gateway = ApiGateway::new(session.clone());
//!
//! session.login("alice", "hunter2", true).await?;
//! let response = gateway.send(ApiRequest::get(quiz_url)).await?;
//! ```
//!
//! [`CredentialStore`]: crate::store::CredentialStore

mod config;
mod gateway;
mod link;
mod request;
mod session;

pub use config::ClientConfig;
pub use gateway::ApiGateway;
pub use link::LinkTokenExchanger;
pub use request::ApiRequest;
pub use session::SessionClient;
