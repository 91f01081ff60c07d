//! Failures that can end or interrupt the relay of a search.

use thiserror::Error;

/// Everything that can go wrong after the trigger matched.
#[derive(Debug, Error)]
pub(crate) enum RelayError {
    /// The search service was unreachable, answered with an error status, or sent a body we
    /// couldn't decode.
    #[error("search failed: {0}")]
    Search(#[source] anyhow::Error),

    #[error("image {id} has no `{representation}` representation")]
    MissingRepresentation { id: u64, representation: String },

    #[error("downloading {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("uploading {filename} failed: {source}")]
    Upload {
        filename: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("sending notice failed: {0}")]
    Notice(#[source] anyhow::Error),
}
