pub mod image_client;

use crate::{
    config::Config,
    download::Downloader,
    error::{DalleError, Result},
};
use reqwest::Client;

pub use image_client::ImageClient;

/// Known generation API failures, checked in order.
const KNOWN_STATUSES: &[(u16, &str)] = &[
    (400, "bad request"),
    (401, "unauthorized"),
    (403, "forbidden"),
    (404, "not found"),
    (429, "too many requests"),
    (500, "internal server error"),
    (502, "bad gateway"),
    (503, "service unavailable"),
    (504, "gateway timeout"),
];

pub fn status_label(status: u16) -> &'static str {
    KNOWN_STATUSES
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, label)| *label)
        .unwrap_or("unknown error")
}

/// Entry point bundling the generation client and the downloader built from
/// one [`Config`].
#[derive(Clone)]
pub struct OpenAiClient {
    image_client: ImageClient,
    downloader: Downloader,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;

        let api_http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DalleError::ClientError(e.to_string()))?;

        // Image hosts get the transport's default timeouts.
        let download_http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DalleError::ClientError(e.to_string()))?;

        Ok(Self {
            image_client: ImageClient::new(api_http, config.base_url.clone(), api_key),
            downloader: Downloader::new(download_http)
                .with_concurrency(config.concurrency)
                .with_progress(config.show_progress),
        })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }
}
