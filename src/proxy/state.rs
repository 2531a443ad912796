use super::config::ProxySettings;

/// Shared state for the proxy route handlers.
#[derive(Clone)]
pub(super) struct ProxyState {
    pub(super) http: reqwest::Client,
    pub(super) settings: ProxySettings,
}
