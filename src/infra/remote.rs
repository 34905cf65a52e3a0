//! Outbound HTTP client shared by the oEmbed proxy and the share-count refresher.

use std::time::{Duration, Instant};

use metrics::histogram;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub const METRIC_REMOTE_REQUEST_MS: &str = "popit_remote_request_ms";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("wrong http response status code: {status} from {url}")]
    Status { status: u16, url: String },
    #[error("upstream returned malformed json: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct RemoteClient {
    client: Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn default_user_agent() -> &'static str {
        concat!("popit/", env!("CARGO_PKG_VERSION"))
    }

    /// GET `url` and decode a JSON body. Non-2xx answers are errors.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let started = Instant::now();
        let host = url.host_str().unwrap_or("unknown").to_string();

        let outcome = self.fetch(url).await;

        histogram!(
            METRIC_REMOTE_REQUEST_MS,
            "host" => host,
            "outcome" => if outcome.is_ok() { "ok" } else { "error" }
        )
        .record(started.elapsed().as_secs_f64() * 1000.0);

        outcome
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let url_text = url.to_string();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url_text,
            });
        }

        debug!(
            target = "popit::infra::remote",
            url = %url_text,
            bytes = bytes.len(),
            "upstream answered"
        );
        Ok(serde_json::from_slice(&bytes)?)
    }
}
