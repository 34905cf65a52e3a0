//! Facebook share-count refresher.
//!
//! Walks every published post, asks the Graph API for the share count of both
//! the `http` and `https` permalink, and stores the larger one as an external
//! meta of the post.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::pagination::{MAX_PAGE_SIZE, PageRequest};
use crate::application::repos::{
    ExternalMetaRepo, PostOrder, PostQueryFilter, PostsRepo, RepoError,
};
use crate::domain::entities::PostRecord;
use crate::domain::types::FACEBOOK_SHARE_COUNT;
use crate::infra::remote::{RemoteClient, RemoteError};

pub const METRIC_SOCIAL_REFRESH: &str = "popit_social_refresh_total";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/";

const PROTOCOLS: [&str; 2] = ["http", "https"];

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("share count lookup failed: {0}")]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct SocialOptions {
    pub graph_url: Url,
    pub site_host: String,
    pub post_delay: Duration,
    pub cycle_interval: Duration,
}

/// Outcome counts of one pass over the published posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: u64,
    pub zero: u64,
    pub failed: u64,
}

pub struct ShareCountRefresher {
    posts: Arc<dyn PostsRepo>,
    external_meta: Arc<dyn ExternalMetaRepo>,
    client: RemoteClient,
    options: SocialOptions,
}

impl ShareCountRefresher {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        external_meta: Arc<dyn ExternalMetaRepo>,
        client: RemoteClient,
        options: SocialOptions,
    ) -> Self {
        Self {
            posts,
            external_meta,
            client,
            options,
        }
    }

    /// Refresh forever, pausing `cycle_interval` between passes.
    pub async fn run(self: Arc<Self>) {
        loop {
            match self.refresh_all().await {
                Ok(summary) => info!(
                    target = "popit::application::social",
                    updated = summary.updated,
                    zero = summary.zero,
                    failed = summary.failed,
                    "share count pass complete"
                ),
                Err(err) => warn!(
                    target = "popit::application::social",
                    error = %err,
                    "share count pass aborted"
                ),
            }
            tokio::time::sleep(self.options.cycle_interval).await;
        }
    }

    /// One pass over all published posts, newest first. Failures of single
    /// posts are logged and counted; only listing failures abort the pass.
    pub async fn refresh_all(&self) -> Result<RefreshSummary, RepoError> {
        let mut summary = RefreshSummary::default();
        let mut page = 1;
        let mut first = true;

        loop {
            let posts = self
                .posts
                .list_posts(
                    &PostQueryFilter::default(),
                    PostOrder::Newest,
                    PageRequest::new(page, MAX_PAGE_SIZE),
                )
                .await?;
            if posts.is_empty() {
                break;
            }

            for post in &posts {
                if !first && !self.options.post_delay.is_zero() {
                    tokio::time::sleep(self.options.post_delay).await;
                }
                first = false;

                match self.refresh_post(post).await {
                    Ok(Some(_)) => {
                        summary.updated += 1;
                        counter!(METRIC_SOCIAL_REFRESH, "outcome" => "updated").increment(1);
                    }
                    Ok(None) => {
                        summary.zero += 1;
                        counter!(METRIC_SOCIAL_REFRESH, "outcome" => "zero").increment(1);
                    }
                    Err(err) => {
                        summary.failed += 1;
                        counter!(METRIC_SOCIAL_REFRESH, "outcome" => "failed").increment(1);
                        warn!(
                            target = "popit::application::social",
                            post_id = post.id,
                            post_name = %post.post_name,
                            error = %err,
                            "share count refresh failed"
                        );
                    }
                }
            }

            if posts.len() < MAX_PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }

        Ok(summary)
    }

    /// Store the larger of the two share counts. Returns `None` when both are zero.
    pub async fn refresh_post(&self, post: &PostRecord) -> Result<Option<u64>, SocialError> {
        let mut best = 0;
        for protocol in PROTOCOLS {
            best = best.max(self.share_count(&post.post_name, protocol).await?);
        }

        if best == 0 {
            return Ok(None);
        }

        self.external_meta
            .upsert(post.id, FACEBOOK_SHARE_COUNT, &best.to_string())
            .await?;
        Ok(Some(best))
    }

    async fn share_count(&self, post_name: &str, protocol: &str) -> Result<u64, RemoteError> {
        let mut url = self.options.graph_url.clone();
        url.query_pairs_mut()
            .append_pair("ids", &self.permalink(post_name, protocol));
        let body: Map<String, Value> = self.client.get_json(url).await?;
        Ok(body
            .values()
            .filter_map(|entry| entry.pointer("/share/share_count"))
            .filter_map(Value::as_u64)
            .max()
            .unwrap_or(0))
    }

    fn permalink(&self, post_name: &str, protocol: &str) -> String {
        let trailing = if post_name.ends_with('/') { "" } else { "/" };
        format!(
            "{protocol}://{}/{post_name}{trailing}",
            self.options.site_host
        )
    }
}
