#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[cfg(any(feature = "client", feature = "proxy"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} rejected: {detail}")]
    Api {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
}
