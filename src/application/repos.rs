//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{
    AuthorRecord, ExternalMetaRecord, PostMetaRecord, PostRecord, SitePreferenceRecord,
    TermCountRecord, TermRecord,
};
use crate::domain::types::Taxonomy;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Ordering applied to post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// Newest `post_date` first.
    Newest,
    /// Database-side shuffle, used by the spotlights.
    Random,
}

/// Narrowing applied on top of the published-post scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQueryFilter {
    pub term_id: Option<u64>,
    pub author_id: Option<u64>,
    pub search: Option<String>,
    pub excludes: Vec<u64>,
}

impl PostQueryFilter {
    pub fn term(term_id: u64, excludes: Vec<u64>) -> Self {
        Self {
            term_id: Some(term_id),
            excludes,
            ..Self::default()
        }
    }

    pub fn author(author_id: u64, excludes: Vec<u64>) -> Self {
        Self {
            author_id: Some(author_id),
            excludes,
            ..Self::default()
        }
    }

    pub fn search(keyword: impl Into<String>) -> Self {
        Self {
            search: Some(keyword.into()),
            ..Self::default()
        }
    }
}

/// Read access to published posts. Every method only ever sees rows with
/// `post_status = 'publish'` and `post_type = 'post'`.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        order: PostOrder,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_name(&self, post_name: &str) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait TermsRepo: Send + Sync {
    async fn list_for_post(&self, post_id: u64) -> Result<Vec<TermRecord>, RepoError>;

    async fn find_by_slug(
        &self,
        slug: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Option<TermRecord>, RepoError>;

    /// Tags with at least `min_posts` published posts, most used first.
    async fn list_popular_tags(
        &self,
        min_posts: u64,
        limit: u32,
    ) -> Result<Vec<TermCountRecord>, RepoError>;
}

#[async_trait]
pub trait AuthorsRepo: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<AuthorRecord>, RepoError>;

    async fn find_by_login(&self, login: &str) -> Result<Option<AuthorRecord>, RepoError>;

    /// Authors with at least `min_posts` published posts, ordered by id.
    async fn list_with_min_posts(&self, min_posts: u64) -> Result<Vec<AuthorRecord>, RepoError>;
}

#[async_trait]
pub trait PostMetaRepo: Send + Sync {
    async fn list_for_post(
        &self,
        post_id: u64,
        keys: &[&str],
    ) -> Result<Vec<PostMetaRecord>, RepoError>;
}

#[async_trait]
pub trait SitePreferencesRepo: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<SitePreferenceRecord>, RepoError>;
}

#[async_trait]
pub trait ExternalMetaRepo: Send + Sync {
    async fn list_for_post(&self, post_id: u64) -> Result<Vec<ExternalMetaRecord>, RepoError>;

    /// Insert the named value for the post, or overwrite the existing one.
    async fn upsert(&self, post_id: u64, name: &str, value: &str) -> Result<(), RepoError>;
}

/// Liveness probe of the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
