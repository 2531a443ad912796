//! Same-origin proxy endpoints guarding the long-lived refresh credential.
//!
//! The browser never sees the refresh token: it lives in an HttpOnly cookie
//! path-scoped to the refresh endpoint, set and cleared only here. The three
//! handlers are a stateless translation layer between the backend's
//! bearer-token API and that cookie:
//!
//! - `POST {api}/auth` — verify credentials upstream, set the cookie, return
//!   the short-lived `{user_id, access_token}` pair.
//! - `GET {api}/refresh` — forward the cookie's value as a bearer credential,
//!   return a fresh pair. Reads the cookie, never writes it.
//! - `POST {api}/logout` — expire the cookie. No upstream call.
//!
//! ```rust,ignore
//! use quizlink_session::{ProxyConfig, proxy_routes};
//!
//! let app = proxy_routes(ProxyConfig::from_env()?);
//! axum::serve(listener, app).await?;
//! ```

mod config;
mod cookies;
mod error;
mod routes;
mod state;

pub use config::ProxyConfig;
pub use routes::proxy_routes;
