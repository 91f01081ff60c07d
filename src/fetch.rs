//! Downloads images so they can be re-uploaded.

use async_trait::async_trait;
use tracing::debug;

use crate::derpibooru::ImageResult;
use crate::error::RelayError;

/// A downloaded image, held in memory only until it has been uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImageBytes {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Anything that can GET a URL and hand back the whole body.
#[async_trait]
pub(crate) trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RelayError>;
}

#[derive(Clone, Debug)]
pub(crate) struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RelayError> {
        let fail = |e: reqwest::Error| RelayError::Fetch {
            url: url.to_string(),
            source: e.into(),
        };
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fail)?
            .bytes()
            .await
            .map_err(fail)?;
        debug!(url, len = body.len(), "image downloaded");
        Ok(body.to_vec())
    }
}

/// Downloads the `representation` rendition of `image`. No other size is tried if that one is
/// missing.
pub(crate) async fn fetch_image<F: ImageFetcher + ?Sized>(
    fetcher: &F,
    image: &ImageResult,
    representation: &str,
) -> Result<ImageBytes, RelayError> {
    let url = image.representations.get(representation).ok_or_else(|| {
        RelayError::MissingRepresentation {
            id: image.id,
            representation: representation.to_string(),
        }
    })?;
    let data = fetcher.fetch(url).await?;
    Ok(ImageBytes {
        filename: image.filename(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image_at(url: String) -> ImageResult {
        ImageResult {
            id: 1,
            format: "jpg".to_string(),
            representations: HashMap::from([("large".to_string(), url)]),
        }
    }

    #[tokio::test]
    async fn test_fetch_large() {
        let server = MockServer::start().await;
        let payload = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
        Mock::given(method("GET"))
            .and(path("/img/1/large.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new());
        let image = image_at(format!("{}/img/1/large.jpg", server.uri()));
        let bytes = fetch_image(&fetcher, &image, "large").await.unwrap();
        assert_eq!(bytes.filename, "1.jpg");
        assert_eq!(bytes.data, payload);
    }

    #[tokio::test]
    async fn test_missing_representation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new());
        let image = image_at(format!("{}/img/1/large.jpg", server.uri()));
        let err = fetch_image(&fetcher, &image, "full").await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::MissingRepresentation { id: 1, ref representation } if representation == "full"
        ));
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(reqwest::Client::new());
        let url = format!("{}/img/1/large.jpg", server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();
        match err {
            RelayError::Fetch { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("unexpected error: {}", other),
        }
    }
}
