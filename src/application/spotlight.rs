//! Random term and author spotlights.
//!
//! Candidates are loaded in a stable order, a [`Sampler`] picks distinct
//! indices, and each picked candidate is resolved into a page of random posts.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use metrics::{counter, histogram};
use popit_api_types::{AuthorPosts, TermPosts};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::debug;

use crate::application::posts::{PostService, PostServiceError, author_view, term_view};
use crate::application::repos::{AuthorsRepo, RepoError, TermsRepo};
use crate::domain::sampler::{ResolutionError, Sampler, SelectionStrategy, resolve_in_order};

pub const METRIC_SPOTLIGHT_SAMPLES: &str = "popit_spotlight_samples_total";
pub const METRIC_SPOTLIGHT_MS: &str = "popit_spotlight_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotlightMode {
    Full,
    /// Fewer groups with fewer posts each, for small screens.
    Compact,
}

impl SpotlightMode {
    pub fn from_mobile_flag(is_mobile: bool) -> Self {
        if is_mobile {
            SpotlightMode::Compact
        } else {
            SpotlightMode::Full
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotlightOptions {
    pub count: usize,
    pub compact_count: usize,
    pub page_size: u32,
    pub compact_page_size: u32,
    pub min_posts: u64,
    pub candidate_limit: u32,
    pub strategy: SelectionStrategy,
    pub seed: Option<u64>,
}

impl Default for SpotlightOptions {
    fn default() -> Self {
        Self {
            count: 5,
            compact_count: 3,
            page_size: 5,
            compact_page_size: 2,
            min_posts: 2,
            candidate_limit: 500,
            strategy: SelectionStrategy::Rejection,
            seed: None,
        }
    }
}

impl SpotlightOptions {
    fn shape(&self, mode: SpotlightMode) -> (usize, u32) {
        match mode {
            SpotlightMode::Full => (self.count, self.page_size),
            SpotlightMode::Compact => (self.compact_count, self.compact_page_size),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpotlightError {
    #[error("failed to load {kind} spotlight candidates")]
    Candidates {
        kind: &'static str,
        #[source]
        source: RepoError,
    },
    #[error("failed to build {kind} spotlight: {source}")]
    Resolution {
        kind: &'static str,
        #[source]
        source: ResolutionError<PostServiceError>,
    },
}

pub struct SpotlightService {
    posts: PostService,
    terms: Arc<dyn TermsRepo>,
    authors: Arc<dyn AuthorsRepo>,
    sampler: Sampler,
    rng: Mutex<StdRng>,
    options: SpotlightOptions,
}

impl SpotlightService {
    pub fn new(
        posts: PostService,
        terms: Arc<dyn TermsRepo>,
        authors: Arc<dyn AuthorsRepo>,
        options: SpotlightOptions,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            posts,
            terms,
            authors,
            sampler: Sampler::new(options.strategy),
            rng: Mutex::new(rng),
            options,
        }
    }

    /// Random popular tags, each with a random page of its posts.
    pub async fn term_spotlight(
        &self,
        mode: SpotlightMode,
    ) -> Result<Vec<TermPosts>, SpotlightError> {
        const KIND: &str = "term";
        let started = Instant::now();
        let (count, page_size) = self.options.shape(mode);

        let candidates = self
            .terms
            .list_popular_tags(self.options.min_posts, self.options.candidate_limit)
            .await
            .map_err(|source| SpotlightError::Candidates { kind: KIND, source })?;
        let indices = self.draw(candidates.len(), count);
        debug!(
            target = "popit::application::spotlight",
            kind = KIND,
            candidates = candidates.len(),
            picked = ?indices,
            "spotlight indices drawn"
        );

        let result = resolve_in_order(indices, |index| {
            let candidate = &candidates[index];
            async move {
                let posts = self
                    .posts
                    .random_for_term(candidate.term.id, page_size)
                    .await?;
                Ok::<_, PostServiceError>(TermPosts {
                    term: term_view(&candidate.term),
                    posts,
                })
            }
        })
        .await
        .map_err(|source| SpotlightError::Resolution { kind: KIND, source });

        record_sample(KIND, result.is_ok(), started);
        result
    }

    /// Random prolific authors, each with a random page of their posts.
    pub async fn author_spotlight(
        &self,
        mode: SpotlightMode,
    ) -> Result<Vec<AuthorPosts>, SpotlightError> {
        const KIND: &str = "author";
        let started = Instant::now();
        let (count, page_size) = self.options.shape(mode);

        let candidates = self
            .authors
            .list_with_min_posts(self.options.min_posts)
            .await
            .map_err(|source| SpotlightError::Candidates { kind: KIND, source })?;
        let indices = self.draw(candidates.len(), count);
        debug!(
            target = "popit::application::spotlight",
            kind = KIND,
            candidates = candidates.len(),
            picked = ?indices,
            "spotlight indices drawn"
        );

        let result = resolve_in_order(indices, |index| {
            let author = &candidates[index];
            async move {
                let posts = self.posts.random_for_author(author.id, page_size).await?;
                Ok::<_, PostServiceError>(AuthorPosts {
                    author: author_view(author),
                    posts,
                })
            }
        })
        .await
        .map_err(|source| SpotlightError::Resolution { kind: KIND, source });

        record_sample(KIND, result.is_ok(), started);
        result
    }

    /// The generator lock is released before any resolution starts.
    fn draw(&self, candidates: usize, desired: usize) -> Vec<usize> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.sampler.select(&mut *rng, candidates, desired)
    }
}

fn record_sample(kind: &'static str, success: bool, started: Instant) {
    let outcome = if success { "ok" } else { "error" };
    counter!(METRIC_SPOTLIGHT_SAMPLES, "kind" => kind, "outcome" => outcome).increment(1);
    histogram!(METRIC_SPOTLIGHT_MS, "kind" => kind)
        .record(started.elapsed().as_secs_f64() * 1000.0);
}
