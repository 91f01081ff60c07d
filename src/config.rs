//! Module for global bot configuration.
//!
//! The constants are the defaults; [`Config::from_env`] lets the environment override any of them.

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::message_handler::FailurePolicy;

/// Messages starting with this are search requests.
pub(crate) const SEARCH_COMMAND: &str = "!derpi";
/// How many images one search posts at most.
pub(crate) const NUMBER_OF_IMAGES_TO_POST: usize = 3;
/// Which rendition of each image gets downloaded. Big, but not the full size.
pub(crate) const REPRESENTATION: &str = "large";
/// Base URL of the image board.
pub(crate) const DERPIBOORU_URL: &str = "https://derpibooru.org";
/// Timeout applied to every outbound HTTP request, in seconds.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration, assembled once at startup and shared read-only afterwards.
#[derive(Clone)]
pub(crate) struct Config {
    pub token: String,
    pub trigger: String,
    pub limit: usize,
    pub representation: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub filter_id: Option<u64>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
    pub timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN")
            .ok_or_else(|| anyhow!("Expected a token in the environment (DISCORD_TOKEN)"))?;

        let limit = match get("DERPI_LIMIT") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("DERPI_LIMIT is not a valid count: {v:?}"))?,
            None => NUMBER_OF_IMAGES_TO_POST,
        };

        let filter_id = get("DERPI_FILTER_ID")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("DERPI_FILTER_ID is not a valid id: {v:?}"))
            })
            .transpose()?;

        let timeout_secs = match get("DERPI_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("DERPI_TIMEOUT_SECS is not a number: {v:?}"))?,
            None => REQUEST_TIMEOUT_SECS,
        };

        let failure_policy = match get("DERPI_FAILURE_POLICY") {
            Some(v) => v.parse()?,
            None => FailurePolicy::default(),
        };

        Ok(Self {
            token,
            trigger: get("DERPI_TRIGGER").unwrap_or_else(|| SEARCH_COMMAND.to_string()),
            limit,
            representation: get("DERPI_REPRESENTATION")
                .unwrap_or_else(|| REPRESENTATION.to_string()),
            api_url: get("DERPI_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DERPIBOORU_URL.to_string()),
            api_key: get("DERPI_API_KEY"),
            filter_id,
            sort_field: get("DERPI_SORT_FIELD"),
            sort_direction: get("DERPI_SORT_DIRECTION"),
            timeout: Duration::from_secs(timeout_secs),
            failure_policy,
        })
    }
}

// Keeps the Discord token and the API key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("trigger", &self.trigger)
            .field("limit", &self.limit)
            .field("representation", &self.representation)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("filter_id", &self.filter_id)
            .field("sort_field", &self.sort_field)
            .field("sort_direction", &self.sort_direction)
            .field("timeout", &self.timeout)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}
