use thiserror::Error;

/// Faults reported by the external client boundary.
///
/// The resolver and gateway map these into their own taxonomies; nothing
/// above this crate inspects bridge responses directly.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The client explicitly rejected the supplied username/password or
    /// session settings.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Network-level fault: connect failure, timeout, aborted transfer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The client answered, but with an error the caller cannot act on
    /// (rate limit, challenge, malformed response, server fault).
    #[error("client api error: {0}")]
    Api(String),
}
