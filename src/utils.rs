//! Utilities.
use std::fmt::Display;
use std::time::Duration;

use tracing::warn;

/// Log errors. Used for actions like sending a message where the fallback is "do nothing".
pub(crate) fn log_err<T, E: Display>(res: Result<T, E>) {
    if let Err(e) = res {
        warn!(error = %e, "Errored");
    }
}

/// The HTTP client shared by the search and download sides.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!(
            "{} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(timeout)
        .build()
}
