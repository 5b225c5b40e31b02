//! Router error taxonomy.

use crate::Backend;

/// Router result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the routing layer.
///
/// Only `MalformedProfile` and `Config` escape as hard failures. The
/// others are recovered inside the router and show up as data: a zero
/// speed, a fallback event, or the apology reply.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The benchmark download could not complete.
    #[error("network probe unreachable: {0}")]
    ProbeUnreachable(String),

    /// A backend call failed (transport, auth, rate limit, bad response).
    #[error("{backend} backend unavailable: {source}")]
    BackendUnavailable {
        backend: Backend,
        #[source]
        source: anyhow::Error,
    },

    /// Remote and local both failed within one turn.
    #[error("both backends failed, local: {local}")]
    BothBackendsFailed {
        /// The remote failure, if remote was tried this turn.
        remote: Option<String>,
        local: String,
    },

    /// A generation profile violates its bounds.
    #[error("malformed profile: {0}")]
    MalformedProfile(String),

    /// Invalid router or probe configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a backend failure.
    pub fn unavailable(backend: Backend, source: anyhow::Error) -> Self {
        Self::BackendUnavailable { backend, source }
    }
}
