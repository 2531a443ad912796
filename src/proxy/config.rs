use url::Url;

use crate::error::Error;

const DEFAULT_UPSTREAM_ROOT: &str = "http://localhost:8080/api";

/// Shared proxy settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct ProxySettings {
    pub(crate) upstream_auth_url: Url,
    pub(crate) upstream_refresh_url: Url,
    pub(crate) api_path: String,
    pub(crate) refresh_cookie_path: String,
    pub(crate) secure_cookies: bool,
    pub(crate) remember_ttl_days: i64,
}

/// Proxy endpoint configuration.
///
/// Defaults target a local backend; override with `with_*` methods or
/// [`from_env()`](ProxyConfig::from_env) for convention-based setup.
pub struct ProxyConfig {
    pub(super) settings: ProxySettings,
}

impl ProxyConfig {
    /// Configuration pointing at the local development backend.
    #[must_use]
    pub fn new() -> Self {
        let upstream: Url = DEFAULT_UPSTREAM_ROOT.parse().expect("valid default URL");
        let api_path = "/api".to_string();
        Self {
            settings: ProxySettings {
                upstream_auth_url: join_under(&upstream, &["auth", "authenticate"])
                    .expect("valid default URL"),
                upstream_refresh_url: join_under(&upstream, &["auth", "refresh"])
                    .expect("valid default URL"),
                refresh_cookie_path: format!("{api_path}/refresh"),
                api_path,
                secure_cookies: true,
                remember_ttl_days: 7,
            },
        }
    }

    /// Build configuration from environment variables.
    ///
    /// - `QUIZLINK_UPSTREAM_ROOT`: override the backend API root
    /// - `DEV_AUTH`: set to `"1"` or `"true"` to disable the `Secure` cookie
    ///   attribute for plain-HTTP development
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `QUIZLINK_UPSTREAM_ROOT` is set but not
    /// a usable URL.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::new();
        if let Ok(raw) = std::env::var("QUIZLINK_UPSTREAM_ROOT") {
            let url: Url = raw
                .parse()
                .map_err(|e| Error::Config(format!("QUIZLINK_UPSTREAM_ROOT: {e}")))?;
            config = config.with_upstream_root(&url)?;
        }
        let dev_auth = matches!(std::env::var("DEV_AUTH").as_deref(), Ok("1") | Ok("true"));
        Ok(config.with_secure_cookies(!dev_auth))
    }

    /// Point the upstream auth endpoints under a new backend root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL cannot host endpoint paths.
    pub fn with_upstream_root(mut self, root: &Url) -> Result<Self, Error> {
        self.settings.upstream_auth_url = join_under(root, &["auth", "authenticate"])?;
        self.settings.upstream_refresh_url = join_under(root, &["auth", "refresh"])?;
        Ok(self)
    }

    /// Mount the proxy routes under a different path prefix. The refresh
    /// cookie's path scope follows it.
    #[must_use]
    pub fn with_api_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.settings.refresh_cookie_path = format!("{path}/refresh");
        self.settings.api_path = path;
        self
    }

    /// Toggle the `Secure` attribute on the cookies (on by default).
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// How long the refresh cookie persists when the user asked to be
    /// remembered (default 7 days). Without the flag it is a session cookie
    /// regardless of this value.
    #[must_use]
    pub fn with_remember_ttl_days(mut self, days: i64) -> Self {
        self.settings.remember_ttl_days = days;
        self
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn join_under(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("URL cannot host endpoint paths: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_backend() {
        let config = ProxyConfig::new();
        assert_eq!(
            config.settings.upstream_auth_url.as_str(),
            "http://localhost:8080/api/auth/authenticate"
        );
        assert_eq!(
            config.settings.upstream_refresh_url.as_str(),
            "http://localhost:8080/api/auth/refresh"
        );
        assert_eq!(config.settings.refresh_cookie_path, "/api/refresh");
        assert!(config.settings.secure_cookies);
        assert_eq!(config.settings.remember_ttl_days, 7);
    }

    #[test]
    fn api_path_moves_cookie_scope() {
        let config = ProxyConfig::new().with_api_path("/proxy");
        assert_eq!(config.settings.api_path, "/proxy");
        assert_eq!(config.settings.refresh_cookie_path, "/proxy/refresh");
    }

    #[test]
    fn upstream_override_rebuilds_endpoints() {
        let config = ProxyConfig::new()
            .with_upstream_root(&"https://api.quizlink.example.com/api/".parse().unwrap())
            .unwrap();
        assert_eq!(
            config.settings.upstream_refresh_url.as_str(),
            "https://api.quizlink.example.com/api/auth/refresh"
        );
    }

    #[test]
    #[serial_test::serial]
    fn from_env_overrides_upstream_root() {
        unsafe {
            std::env::set_var("QUIZLINK_UPSTREAM_ROOT", "https://api.quizlink.example.com/api");
        }
        let config = ProxyConfig::from_env();
        unsafe {
            std::env::remove_var("QUIZLINK_UPSTREAM_ROOT");
        }

        let config = config.unwrap();
        assert_eq!(
            config.settings.upstream_auth_url.as_str(),
            "https://api.quizlink.example.com/api/auth/authenticate"
        );
        assert!(config.settings.secure_cookies);
    }

    #[test]
    #[serial_test::serial]
    fn dev_auth_disables_secure_cookies() {
        unsafe {
            std::env::set_var("DEV_AUTH", "1");
        }
        let config = ProxyConfig::from_env();
        unsafe {
            std::env::remove_var("DEV_AUTH");
        }
        assert!(!config.unwrap().settings.secure_cookies);
    }
}
