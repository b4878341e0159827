#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {detail}")]
    Status {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Fallback storage error: {0}")]
    Storage(String),
    #[error("Password hash error: {0}")]
    Hash(String),
}
