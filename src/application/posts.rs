//! Post listings and the denormalized post aggregate.

use std::sync::Arc;

use popit_api_types::{AuthorPosts, AuthorView, ExternalMetaView, PostView, TermView};
use thiserror::Error;
use url::form_urlencoded;

use crate::application::pagination::PageRequest;
use crate::application::render::{RenderError, expand_shortcodes, social_description};
use crate::application::repos::{
    AuthorsRepo, ExternalMetaRepo, PostMetaRepo, PostOrder, PostQueryFilter, PostsRepo,
    RepoError, TermsRepo,
};
use crate::domain::entities::{AuthorRecord, ExternalMetaRecord, PostRecord, TermRecord};
use crate::domain::types::{Taxonomy, meta_keys};

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("No term [{slug}]")]
    UnknownTerm { slug: String },
    #[error("Author {login} not found")]
    UnknownAuthorLogin { login: String },
    #[error("Author not found")]
    UnknownAuthorId { id: u64 },
    #[error("{permalink} Not Found")]
    UnknownPermalink { permalink: String },
    #[error("author #{author_id} of post #{post_id} does not exist")]
    MissingAuthor { post_id: u64, author_id: u64 },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    terms: Arc<dyn TermsRepo>,
    authors: Arc<dyn AuthorsRepo>,
    meta: Arc<dyn PostMetaRepo>,
    external_meta: Arc<dyn ExternalMetaRepo>,
    excerpt_chars: usize,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        terms: Arc<dyn TermsRepo>,
        authors: Arc<dyn AuthorsRepo>,
        meta: Arc<dyn PostMetaRepo>,
        external_meta: Arc<dyn ExternalMetaRepo>,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            posts,
            terms,
            authors,
            meta,
            external_meta,
            excerpt_chars,
        }
    }

    pub async fn recent(&self, page: PageRequest) -> Result<Vec<PostView>, PostServiceError> {
        self.list(&PostQueryFilter::default(), PostOrder::Newest, page)
            .await
    }

    pub async fn search(
        &self,
        keyword: &str,
        page: PageRequest,
    ) -> Result<Vec<PostView>, PostServiceError> {
        self.list(&PostQueryFilter::search(keyword), PostOrder::Newest, page)
            .await
    }

    pub async fn by_term_id(
        &self,
        term_id: u64,
        excludes: Vec<u64>,
        page: PageRequest,
    ) -> Result<Vec<PostView>, PostServiceError> {
        self.list(
            &PostQueryFilter::term(term_id, excludes),
            PostOrder::Newest,
            page,
        )
        .await
    }

    /// Posts of the term with the given slug. Slugs are stored form-url-encoded,
    /// so the raw value is encoded before the lookup.
    pub async fn by_term_slug(
        &self,
        slug: &str,
        taxonomy: &Taxonomy,
        excludes: Vec<u64>,
        page: PageRequest,
    ) -> Result<Vec<PostView>, PostServiceError> {
        let encoded = form_encode(slug);
        let term = self
            .terms
            .find_by_slug(&encoded, taxonomy)
            .await?
            .ok_or(PostServiceError::UnknownTerm { slug: encoded })?;
        self.by_term_id(term.id, excludes, page).await
    }

    pub async fn by_author_login(
        &self,
        login: &str,
        excludes: Vec<u64>,
        page: PageRequest,
    ) -> Result<AuthorPosts, PostServiceError> {
        let author = self.authors.find_by_login(login).await?.ok_or_else(|| {
            PostServiceError::UnknownAuthorLogin {
                login: login.to_string(),
            }
        })?;
        self.author_posts(author, excludes, page).await
    }

    pub async fn by_author_id(
        &self,
        id: u64,
        excludes: Vec<u64>,
        page: PageRequest,
    ) -> Result<AuthorPosts, PostServiceError> {
        let author = self
            .authors
            .find_by_id(id)
            .await?
            .ok_or(PostServiceError::UnknownAuthorId { id })?;
        self.author_posts(author, excludes, page).await
    }

    pub async fn by_permalink(&self, permalink: &str) -> Result<PostView, PostServiceError> {
        let encoded = form_encode(permalink);
        let record = self
            .posts
            .find_by_name(&encoded)
            .await?
            .ok_or(PostServiceError::UnknownPermalink { permalink: encoded })?;
        self.assemble(record).await
    }

    /// A random page of the term's posts, used by the term spotlight.
    pub async fn random_for_term(
        &self,
        term_id: u64,
        size: u32,
    ) -> Result<Vec<PostView>, PostServiceError> {
        self.list(
            &PostQueryFilter::term(term_id, Vec::new()),
            PostOrder::Random,
            PageRequest::first(size),
        )
        .await
    }

    /// A random page of the author's posts, used by the author spotlight.
    pub async fn random_for_author(
        &self,
        author_id: u64,
        size: u32,
    ) -> Result<Vec<PostView>, PostServiceError> {
        self.list(
            &PostQueryFilter::author(author_id, Vec::new()),
            PostOrder::Random,
            PageRequest::first(size),
        )
        .await
    }

    async fn author_posts(
        &self,
        author: AuthorRecord,
        excludes: Vec<u64>,
        page: PageRequest,
    ) -> Result<AuthorPosts, PostServiceError> {
        let posts = self
            .list(
                &PostQueryFilter::author(author.id, excludes),
                PostOrder::Newest,
                page,
            )
            .await?;
        Ok(AuthorPosts {
            author: author_view(&author),
            posts,
        })
    }

    async fn list(
        &self,
        filter: &PostQueryFilter,
        order: PostOrder,
        page: PageRequest,
    ) -> Result<Vec<PostView>, PostServiceError> {
        let records = self.posts.list_posts(filter, order, page).await?;
        self.assemble_all(records).await
    }

    /// Load the associations of every record in order, stopping at the first failure.
    pub async fn assemble_all(
        &self,
        records: Vec<PostRecord>,
    ) -> Result<Vec<PostView>, PostServiceError> {
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.assemble(record).await?);
        }
        Ok(views)
    }

    pub async fn assemble(&self, record: PostRecord) -> Result<PostView, PostServiceError> {
        let author = self.authors.find_by_id(record.author_id).await?.ok_or(
            PostServiceError::MissingAuthor {
                post_id: record.id,
                author_id: record.author_id,
            },
        )?;

        let mut image = String::new();
        let mut social_title = String::new();
        let mut stored_description = String::new();
        for meta in self.meta.list_for_post(record.id, &meta_keys::ALL).await? {
            match meta.key.as_str() {
                meta_keys::IMAGE => image = meta.value,
                meta_keys::SOCIAL_TITLE => social_title = meta.value,
                meta_keys::SOCIAL_DESCRIPTION => stored_description = meta.value,
                _ => {}
            }
        }
        if social_title.is_empty() {
            social_title = record.title.clone();
        }
        let content = expand_shortcodes(&record.content);
        let social_desc = social_description(&stored_description, &content, self.excerpt_chars)?;

        let mut categories = Vec::new();
        let mut tags = Vec::new();
        for term in self.terms.list_for_post(record.id).await? {
            match term.taxonomy {
                Taxonomy::Category => categories.push(term_view(&term)),
                Taxonomy::PostTag => tags.push(term_view(&term)),
                Taxonomy::Other(_) => {}
            }
        }

        let external_metas = self
            .external_meta
            .list_for_post(record.id)
            .await?
            .iter()
            .map(external_meta_view)
            .collect();

        Ok(PostView {
            id: record.id,
            author: author_view(&author),
            content,
            title: record.title,
            date: record.post_date,
            post_name: record.post_name,
            image,
            social_title,
            social_desc,
            categories,
            tags,
            external_metas,
        })
    }
}

fn form_encode(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

pub fn author_view(author: &AuthorRecord) -> AuthorView {
    AuthorView {
        id: author.id,
        user_login: author.user_login.clone(),
        display_name: author.display_name.clone(),
        user_url: author.user_url.clone(),
        avatar: author.avatar_url(),
    }
}

pub fn term_view(term: &TermRecord) -> TermView {
    TermView {
        id: term.id,
        taxonomy: term.taxonomy.to_string(),
        name: term.name.clone(),
        slug: term.slug.clone(),
    }
}

fn external_meta_view(meta: &ExternalMetaRecord) -> ExternalMetaView {
    ExternalMetaView {
        id: meta.id,
        post_id: meta.post_id,
        name: meta.name.clone(),
        value: meta.value.clone(),
    }
}
