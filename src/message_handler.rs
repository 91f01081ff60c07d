//! Message handler functionality: trigger → tags → search → download → upload.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::command::{parse_trigger, split_tags};
use crate::config::Config;
use crate::derpibooru::{ImageResult, SearchBackend, SearchClient};
use crate::error::RelayError;
use crate::fetch::{fetch_image, ImageFetcher};
use crate::relay::Relay;
use crate::utils::log_err;

/// What happens to the rest of a search when one image can't be relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FailurePolicy {
    /// Stop at the first failure. Later results are never downloaded.
    #[default]
    Abort,
    /// Log the failure and carry on with the next result.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(anyhow!(
                "unknown failure policy {:?} (expected `abort` or `continue`)",
                other
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// How a single message was dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Not a search request.
    Ignored,
    /// The search ran; `skipped` is only ever non-zero under [`FailurePolicy::Continue`].
    Relayed { uploaded: usize, skipped: usize },
}

/// Everything needed to answer a search request, built once at startup.
pub(crate) struct Pipeline<S, F> {
    trigger: String,
    representation: String,
    policy: FailurePolicy,
    search: SearchClient<S>,
    fetcher: F,
}

impl<S: SearchBackend, F: ImageFetcher> Pipeline<S, F> {
    pub fn new(config: &Config, search: SearchClient<S>, fetcher: F) -> Self {
        Self {
            trigger: config.trigger.clone(),
            representation: config.representation.clone(),
            policy: config.failure_policy,
            search,
            fetcher,
        }
    }

    /// Like [`Pipeline::handle`], but messages from bots are never answered, so the bot can't
    /// end up talking to itself or to another bot.
    pub async fn handle_message<R: Relay + ?Sized>(
        &self,
        author_is_bot: bool,
        content: &str,
        relay: &R,
    ) -> Result<Outcome, RelayError> {
        if author_is_bot {
            return Ok(Outcome::Ignored);
        }
        self.handle(content, relay).await
    }

    /// Handles one chat message, posting results through `relay`.
    ///
    /// Messages that don't start with the trigger are ignored without touching the network. If
    /// anything fails after that, one short notice listing the failures is posted when the search
    /// ends; whether a failure also ends the search depends on the [`FailurePolicy`]. The notice is
    /// best-effort and never changes the returned result.
    pub async fn handle<R: Relay + ?Sized>(
        &self,
        content: &str,
        relay: &R,
    ) -> Result<Outcome, RelayError> {
        let raw = match parse_trigger(content, &self.trigger) {
            Some(raw) => raw,
            None => return Ok(Outcome::Ignored),
        };
        let tags = split_tags(raw);
        debug!(?tags, "search requested");

        let mut failures = vec![];
        let result = self.run(&tags, relay, &mut failures).await;
        if !failures.is_empty() {
            log_err(relay.notify(&failures.join("\n")).await);
        }
        result
    }

    async fn run<R: Relay + ?Sized>(
        &self,
        tags: &[String],
        relay: &R,
        failures: &mut Vec<String>,
    ) -> Result<Outcome, RelayError> {
        let mut results = self.search.query(tags);
        let mut uploaded = 0;
        let mut skipped = 0;

        loop {
            let image = match results.next().await {
                Ok(Some(image)) => image,
                Ok(None) => break,
                Err(e) => {
                    failures.push(e.to_string());
                    return Err(e);
                }
            };

            let id = image.id;
            match self.relay_image(&image, relay).await {
                Ok(()) => uploaded += 1,
                Err(e) => {
                    failures.push(format!("Couldn't relay image {}: {}", id, e));
                    match self.policy {
                        FailurePolicy::Abort => return Err(e),
                        FailurePolicy::Continue => {
                            warn!(id, error = %e, "skipping image");
                            skipped += 1;
                        }
                    }
                }
            }
        }

        Ok(Outcome::Relayed { uploaded, skipped })
    }

    async fn relay_image<R: Relay + ?Sized>(
        &self,
        image: &ImageResult,
        relay: &R,
    ) -> Result<(), RelayError> {
        let bytes = fetch_image(&self.fetcher, image, &self.representation).await?;
        relay.upload(bytes).await
    }
}
