//! In-memory WordPress store shared by the integration tests.

#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{Duration as TimeDuration, macros::datetime};
use tokio::sync::Mutex;
use tower::ServiceExt;
use url::Url;

use popit::application::embed::EmbedService;
use popit::application::pagination::PageRequest;
use popit::application::posts::PostService;
use popit::application::preferences::PreferenceService;
use popit::application::repos::{
    AuthorsRepo, ExternalMetaRepo, PostMetaRepo, PostOrder, PostQueryFilter, PostsRepo,
    RepoError, SitePreferencesRepo, StoreHealth, TermsRepo,
};
use popit::application::spotlight::{SpotlightOptions, SpotlightService};
use popit::config::ListingSettings;
use popit::domain::entities::{
    AuthorRecord, ExternalMetaRecord, PostMetaRecord, PostRecord, SitePreferenceRecord,
    TermCountRecord, TermRecord,
};
use popit::domain::types::Taxonomy;
use popit::infra::http::{ApiState, build_router};
use popit::infra::remote::RemoteClient;

pub const CATEGORY_ID: u64 = 1;
pub const LONELY_TAG_ID: u64 = 16;
pub const POPULAR_TAG_IDS: [u64; 6] = [10, 11, 12, 13, 14, 15];
pub const KOREAN_POST_NAME: &str = "%ED%95%9C%EA%B8%80";

#[derive(Default)]
pub struct MemoryStore {
    pub posts: Vec<PostRecord>,
    pub authors: Vec<AuthorRecord>,
    pub terms: Vec<TermRecord>,
    /// `(post_id, term_id)` pairs in attachment order.
    pub relationships: Vec<(u64, u64)>,
    pub meta: Vec<(u64, PostMetaRecord)>,
    pub preferences: Vec<SitePreferenceRecord>,
    pub external_meta: Mutex<Vec<ExternalMetaRecord>>,
    pub healthy: bool,
    /// Fail every randomly ordered listing, which only the spotlights issue.
    pub fail_random_listings: bool,
}

impl MemoryStore {
    fn post_has_term(&self, post_id: u64, term_id: u64) -> bool {
        self.relationships
            .iter()
            .any(|&(post, term)| post == post_id && term == term_id)
    }

    fn post_count(&self, predicate: impl Fn(&PostRecord) -> bool) -> u64 {
        self.posts.iter().filter(|post| predicate(post)).count() as u64
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        order: PostOrder,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        if order == PostOrder::Random && self.fail_random_listings {
            return Err(RepoError::from_persistence("random listing unavailable"));
        }

        let mut posts: Vec<PostRecord> = self
            .posts
            .iter()
            .filter(|post| {
                filter
                    .term_id
                    .is_none_or(|term_id| self.post_has_term(post.id, term_id))
            })
            .filter(|post| filter.author_id.is_none_or(|id| post.author_id == id))
            .filter(|post| {
                filter.search.as_ref().is_none_or(|keyword| {
                    post.title.contains(keyword.as_str()) || post.content.contains(keyword.as_str())
                })
            })
            .filter(|post| !filter.excludes.contains(&post.id))
            .cloned()
            .collect();

        if order == PostOrder::Newest {
            posts.sort_by(|a, b| b.post_date.cmp(&a.post_date).then(b.id.cmp(&a.id)));
        }

        Ok(posts
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size() as usize)
            .collect())
    }

    async fn find_by_name(&self, post_name: &str) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .iter()
            .find(|post| post.post_name == post_name)
            .cloned())
    }
}

#[async_trait]
impl TermsRepo for MemoryStore {
    async fn list_for_post(&self, post_id: u64) -> Result<Vec<TermRecord>, RepoError> {
        Ok(self
            .relationships
            .iter()
            .filter(|(post, _)| *post == post_id)
            .filter_map(|(_, term_id)| self.terms.iter().find(|term| term.id == *term_id))
            .cloned()
            .collect())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Option<TermRecord>, RepoError> {
        Ok(self
            .terms
            .iter()
            .find(|term| term.slug == slug && &term.taxonomy == taxonomy)
            .cloned())
    }

    async fn list_popular_tags(
        &self,
        min_posts: u64,
        limit: u32,
    ) -> Result<Vec<TermCountRecord>, RepoError> {
        let mut counts: Vec<TermCountRecord> = self
            .terms
            .iter()
            .filter(|term| term.taxonomy == Taxonomy::PostTag)
            .map(|term| TermCountRecord {
                term: term.clone(),
                post_count: self.post_count(|post| self.post_has_term(post.id, term.id)),
            })
            .filter(|count| count.post_count >= min_posts)
            .collect();
        counts.sort_by(|a, b| {
            b.post_count
                .cmp(&a.post_count)
                .then(a.term.id.cmp(&b.term.id))
        });
        counts.truncate(limit as usize);
        Ok(counts)
    }
}

#[async_trait]
impl AuthorsRepo for MemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self.authors.iter().find(|author| author.id == id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self
            .authors
            .iter()
            .find(|author| author.user_login == login)
            .cloned())
    }

    async fn list_with_min_posts(&self, min_posts: u64) -> Result<Vec<AuthorRecord>, RepoError> {
        let mut authors: Vec<AuthorRecord> = self
            .authors
            .iter()
            .filter(|author| self.post_count(|post| post.author_id == author.id) >= min_posts)
            .cloned()
            .collect();
        authors.sort_by_key(|author| author.id);
        Ok(authors)
    }
}

#[async_trait]
impl PostMetaRepo for MemoryStore {
    async fn list_for_post(
        &self,
        post_id: u64,
        keys: &[&str],
    ) -> Result<Vec<PostMetaRecord>, RepoError> {
        Ok(self
            .meta
            .iter()
            .filter(|(post, meta)| *post == post_id && keys.contains(&meta.key.as_str()))
            .map(|(_, meta)| meta.clone())
            .collect())
    }
}

#[async_trait]
impl SitePreferencesRepo for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<SitePreferenceRecord>, RepoError> {
        Ok(self
            .preferences
            .iter()
            .find(|preference| preference.name == name)
            .cloned())
    }
}

#[async_trait]
impl ExternalMetaRepo for MemoryStore {
    async fn list_for_post(&self, post_id: u64) -> Result<Vec<ExternalMetaRecord>, RepoError> {
        Ok(self
            .external_meta
            .lock()
            .await
            .iter()
            .filter(|meta| meta.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, post_id: u64, name: &str, value: &str) -> Result<(), RepoError> {
        let mut metas = self.external_meta.lock().await;
        match metas
            .iter_mut()
            .find(|meta| meta.post_id == post_id && meta.name == name)
        {
            Some(meta) => meta.value = value.to_string(),
            None => {
                let id = metas.len() as u64 + 1;
                metas.push(ExternalMetaRecord {
                    id,
                    post_id,
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepoError::from_persistence("connection refused"))
        }
    }
}

fn author(id: u64, login: &str, email: &str) -> AuthorRecord {
    AuthorRecord {
        id,
        user_login: login.to_string(),
        display_name: login.to_uppercase(),
        user_url: format!("https://example.com/{login}"),
        email: email.to_string(),
    }
}

fn term(id: u64, taxonomy: Taxonomy, slug: &str) -> TermRecord {
    TermRecord {
        id,
        taxonomy,
        name: slug.to_uppercase(),
        slug: slug.to_string(),
    }
}

fn meta(key: &str, value: &str) -> PostMetaRecord {
    PostMetaRecord {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Twelve published posts, newest has the highest id.
///
/// Posts 1-6 belong to `kim`, 7-11 to `lee` and 12 to `park`. Every post is in
/// the `dev` category. Tags 10-15 each hold two posts, tag 16 holds one.
pub fn fixture() -> MemoryStore {
    let base = datetime!(2018-01-01 09:00 UTC);
    let posts = (1..=12)
        .map(|id: u64| PostRecord {
            id,
            author_id: match id {
                1..=6 => 1,
                7..=11 => 2,
                _ => 3,
            },
            content: match id {
                12 => "<p>Latest news</p>[caption id=\"a1\"]<img src=\"a.png\">[/caption]"
                    .to_string(),
                _ => format!("<p>Body of post {id}</p>"),
            },
            title: format!("Post {id}"),
            post_date: base + TimeDuration::days(id as i64),
            post_name: match id {
                5 => KOREAN_POST_NAME.to_string(),
                _ => format!("post-{id}"),
            },
        })
        .collect();

    let mut terms = vec![term(CATEGORY_ID, Taxonomy::Category, "dev")];
    for (tag_id, slug) in POPULAR_TAG_IDS
        .iter()
        .zip(["rust", "go", "java", "kotlin", "swift", "scala"])
    {
        terms.push(term(*tag_id, Taxonomy::PostTag, slug));
    }
    terms.push(term(LONELY_TAG_ID, Taxonomy::PostTag, "lonely"));
    terms.push(term(
        20,
        Taxonomy::Other("series".to_string()),
        "season-one",
    ));

    let mut relationships: Vec<(u64, u64)> = (1..=12).map(|id| (id, CATEGORY_ID)).collect();
    for tag_id in POPULAR_TAG_IDS {
        relationships.push((tag_id - 9, tag_id));
        relationships.push((tag_id - 3, tag_id));
    }
    relationships.push((1, LONELY_TAG_ID));
    relationships.push((12, 20));

    MemoryStore {
        posts,
        authors: vec![
            author(1, "kim", "Kim@Example.com "),
            author(2, "lee", "lee@example.com"),
            author(3, "park", "park@example.com"),
        ],
        terms,
        relationships,
        meta: vec![
            (12, meta("post_image", "https://cdn.example.com/12.png")),
            (11, meta("_aioseop_title", "Custom title")),
            (11, meta("_aioseop_description", "Custom description")),
            (11, meta("unrelated", "ignored")),
        ],
        preferences: vec![
            SitePreferenceRecord {
                id: 1,
                name: "ad.mobile.top".to_string(),
                value: "<ins>mobile top</ins>".to_string(),
            },
            SitePreferenceRecord {
                id: 2,
                name: "ad.mobile.bottom".to_string(),
                value: "<ins>mobile bottom</ins>".to_string(),
            },
        ],
        external_meta: Mutex::new(vec![ExternalMetaRecord {
            id: 1,
            post_id: 12,
            name: "facebook_share_count".to_string(),
            value: "42".to_string(),
        }]),
        healthy: true,
        fail_random_listings: false,
    }
}

pub fn listing() -> ListingSettings {
    ListingSettings {
        recent_page_size: NonZeroU32::new(4).expect("non-zero"),
        term_page_size: NonZeroU32::new(2).expect("non-zero"),
        author_page_size: NonZeroU32::new(2).expect("non-zero"),
        search_page_size: NonZeroU32::new(5).expect("non-zero"),
    }
}

pub fn app(store: MemoryStore) -> Router {
    app_with_embed(store, "http://127.0.0.1:9/api/oembed/2")
}

pub fn app_with_embed(store: MemoryStore, oembed_url: &str) -> Router {
    let store = Arc::new(store);
    let posts = PostService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        80,
    );
    let spotlight = SpotlightService::new(
        posts.clone(),
        store.clone(),
        store.clone(),
        SpotlightOptions {
            seed: Some(7),
            ..SpotlightOptions::default()
        },
    );
    let client = RemoteClient::new(Duration::from_secs(5), "popit-test").expect("client");
    let embed = EmbedService::new(client, Url::parse(oembed_url).expect("oembed url"));

    build_router(ApiState {
        posts,
        spotlight: Arc::new(spotlight),
        preferences: PreferenceService::new(store.clone()),
        embed,
        listing: listing(),
        store,
    })
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}
