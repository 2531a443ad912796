#![doc = include_str!("../README.md")]

#[cfg(feature = "client")]
pub mod client;
pub mod error;
#[cfg(feature = "proxy")]
pub mod proxy;
pub mod store;
pub mod types;

// Re-exports for convenient access
#[cfg(feature = "client")]
pub use client::{ApiGateway, ApiRequest, ClientConfig, LinkTokenExchanger, SessionClient};
pub use error::Error;
#[cfg(feature = "proxy")]
pub use proxy::{ProxyConfig, proxy_routes};
pub use store::{CredentialStore, Credentials};
pub use types::{
    AccessToken, LinkRedemption, LoginRequest, QuizId, SessionTokens, ShareableGrant,
    ShareableToken, UrlToken, UserId,
};
