//! Sends downloaded images back into the channel the search came from.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::channel::AttachmentType;
use serenity::model::id::ChannelId;
use tracing::info;

use crate::error::RelayError;
use crate::fetch::ImageBytes;

/// Where results of one search end up.
#[async_trait]
pub(crate) trait Relay: Send + Sync {
    /// Posts one image as an attachment.
    async fn upload(&self, image: ImageBytes) -> Result<(), RelayError>;

    /// Posts a short plain-text message.
    async fn notify(&self, text: &str) -> Result<(), RelayError>;
}

/// A Discord channel, reached through serenity's HTTP client.
pub(crate) struct ChannelRelay {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelRelay {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl Relay for ChannelRelay {
    async fn upload(&self, image: ImageBytes) -> Result<(), RelayError> {
        let ImageBytes { filename, data } = image;
        let len = data.len();
        let attachment_name = filename.clone();

        self.channel_id
            .send_message(&self.http, |m| {
                m.add_file(AttachmentType::Bytes {
                    data: data.into(),
                    filename: attachment_name,
                })
            })
            .await
            .map_err(|e| RelayError::Upload {
                filename: filename.clone(),
                source: e.into(),
            })?;

        info!(channel = %self.channel_id, %filename, len, "image posted");
        Ok(())
    }

    async fn notify(&self, text: &str) -> Result<(), RelayError> {
        self.channel_id
            .say(&self.http, text)
            .await
            .map_err(|e| RelayError::Notice(e.into()))?;
        Ok(())
    }
}
