//! SlideShare oEmbed proxy.

use reqwest::Url;
use serde_json::{Map, Value};

use crate::infra::remote::{RemoteClient, RemoteError};

pub const DEFAULT_OEMBED_URL: &str = "https://www.slideshare.net/api/oembed/2";

#[derive(Clone, Debug)]
pub struct EmbedService {
    client: RemoteClient,
    endpoint: Url,
}

impl EmbedService {
    pub fn new(client: RemoteClient, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Ask the oEmbed endpoint to describe `link` and return its JSON object untouched.
    pub async fn slideshare(&self, link: &str) -> Result<Map<String, Value>, RemoteError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", link)
            .append_pair("format", "json");
        self.client.get_json(url).await
    }
}
