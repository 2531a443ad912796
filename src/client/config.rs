use url::Url;

use crate::error::Error;
use crate::types::QuizId;

const DEFAULT_PROXY_ROOT: &str = "http://localhost:3000/api";
const DEFAULT_BACKEND_ROOT: &str = "http://localhost:8080/api";

/// Client-side endpoint configuration.
///
/// Two roots: the same-origin proxy (which holds the refresh cookie) and the
/// backend resource API (which link redemption talks to directly).
///
/// ```rust,ignore
/// use quizlink_session::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_proxy_root(&"https://quizlink.example.com/api".parse()?)?;
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) auth_url: Url,
    pub(crate) refresh_url: Url,
    pub(crate) logout_url: Url,
    pub(crate) backend_root: Url,
}

impl ClientConfig {
    /// Configuration pointing at the local development servers.
    #[must_use]
    pub fn new() -> Self {
        let proxy_root: Url = DEFAULT_PROXY_ROOT.parse().expect("valid default URL");
        let backend_root: Url = DEFAULT_BACKEND_ROOT.parse().expect("valid default URL");
        Self::from_roots(&proxy_root, backend_root).expect("valid default URL")
    }

    /// Build configuration from environment variables.
    ///
    /// - `QUIZLINK_PROXY_ROOT`: override the proxy endpoint root
    /// - `QUIZLINK_BACKEND_ROOT`: override the backend API root
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a set variable is not a usable URL.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::new();
        if let Ok(raw) = std::env::var("QUIZLINK_PROXY_ROOT") {
            let url: Url = raw
                .parse()
                .map_err(|e| Error::Config(format!("QUIZLINK_PROXY_ROOT: {e}")))?;
            config = config.with_proxy_root(&url)?;
        }
        if let Ok(raw) = std::env::var("QUIZLINK_BACKEND_ROOT") {
            let url: Url = raw
                .parse()
                .map_err(|e| Error::Config(format!("QUIZLINK_BACKEND_ROOT: {e}")))?;
            config = config.with_backend_root(url)?;
        }
        Ok(config)
    }

    /// Point the proxy endpoints (`auth`, `refresh`, `logout`) under a new
    /// root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL cannot host endpoint paths.
    pub fn with_proxy_root(self, root: &Url) -> Result<Self, Error> {
        Self::from_roots(root, self.backend_root)
    }

    /// Point link redemption at a new backend API root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL cannot host endpoint paths.
    pub fn with_backend_root(mut self, root: Url) -> Result<Self, Error> {
        // Validate up front so redemption URLs cannot fail to build later.
        join_under(&root, "auth")?;
        self.backend_root = root;
        Ok(self)
    }

    fn from_roots(proxy_root: &Url, backend_root: Url) -> Result<Self, Error> {
        Ok(Self {
            auth_url: join_under(proxy_root, "auth")?,
            refresh_url: join_under(proxy_root, "refresh")?,
            logout_url: join_under(proxy_root, "logout")?,
            backend_root,
        })
    }

    /// Proxy login endpoint.
    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Proxy refresh endpoint. The refresh cookie is path-scoped to exactly
    /// this URL's path.
    #[must_use]
    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }

    /// Proxy logout endpoint.
    #[must_use]
    pub fn logout_url(&self) -> &Url {
        &self.logout_url
    }

    /// Backend API root.
    #[must_use]
    pub fn backend_root(&self) -> &Url {
        &self.backend_root
    }

    /// Backend endpoint validating a one-time URL token for `quiz`.
    pub(crate) fn link_validation_url(&self, quiz: QuizId) -> Result<Url, Error> {
        let mut url = self.backend_root.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("URL cannot host endpoint paths: {}", self.backend_root)))?
            .pop_if_empty()
            .extend(["auth", "quizzes", &quiz.to_string(), "validate-url-token"]);
        Ok(url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn join_under(base: &Url, segment: &str) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("URL cannot host endpoint paths: {base}")))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}
