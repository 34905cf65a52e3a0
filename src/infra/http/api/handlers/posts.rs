//! Post listing handlers

use axum::Json;
use axum::extract::{Query, State};
use popit_api_types::{ApiResult, AuthorPosts, PostView};

use crate::application::pagination::PageRequest;
use crate::domain::types::Taxonomy;

use super::{
    AuthorQuery, CategoryQuery, IdQuery, ListQuery, PermalinkQuery, SearchQuery, TagQuery,
    parse_id, required,
};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

type PostsResponse = Result<Json<ApiResult<Vec<PostView>>>, ApiError>;
type AuthorPostsResponse = Result<Json<ApiResult<AuthorPosts>>, ApiError>;

pub async fn search_posts(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> PostsResponse {
    let keyword = match query.keyword.as_deref().map(str::trim) {
        Some(keyword) if !keyword.is_empty() => keyword,
        _ => return Err(ApiError::bad_request("No keyword")),
    };
    let page = PageRequest::from_query(
        query.page.as_deref(),
        None,
        state.listing.search_page_size.get(),
    );

    let posts = state.posts.search(keyword, page).await?;
    Ok(Json(ApiResult::ok(posts)))
}

pub async fn recent_posts(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> PostsResponse {
    let page = query.page_request(state.listing.recent_page_size.get());
    let posts = state.posts.recent(page).await?;
    Ok(Json(ApiResult::ok(posts)))
}

pub async fn posts_by_tag_id(
    State(state): State<ApiState>,
    Query(query): Query<IdQuery>,
) -> PostsResponse {
    let id = parse_id(query.id.as_deref())?;
    let excludes = query.list.excludes()?;
    let page = query.list.page_request(state.listing.term_page_size.get());

    let posts = state.posts.by_term_id(id, excludes, page).await?;
    Ok(Json(ApiResult::ok(posts)))
}

pub async fn posts_by_tag(
    State(state): State<ApiState>,
    Query(query): Query<TagQuery>,
) -> PostsResponse {
    let slug = required("tag", query.tag.as_deref())?;
    posts_by_term_slug(&state, slug, Taxonomy::PostTag, &query.list).await
}

pub async fn posts_by_category(
    State(state): State<ApiState>,
    Query(query): Query<CategoryQuery>,
) -> PostsResponse {
    let slug = required("category", query.category.as_deref())?;
    posts_by_term_slug(&state, slug, Taxonomy::Category, &query.list).await
}

async fn posts_by_term_slug(
    state: &ApiState,
    slug: &str,
    taxonomy: Taxonomy,
    list: &ListQuery,
) -> PostsResponse {
    let excludes = list.excludes()?;
    let page = list.page_request(state.listing.term_page_size.get());

    let posts = state
        .posts
        .by_term_slug(slug, &taxonomy, excludes, page)
        .await?;
    Ok(Json(ApiResult::ok(posts)))
}

pub async fn posts_by_author(
    State(state): State<ApiState>,
    Query(query): Query<AuthorQuery>,
) -> AuthorPostsResponse {
    let login = required("author", query.author.as_deref())?;
    let excludes = query.list.excludes()?;
    let page = query.list.page_request(state.listing.author_page_size.get());

    let posts = state.posts.by_author_login(login, excludes, page).await?;
    Ok(Json(ApiResult::ok(posts)))
}

pub async fn posts_by_author_id(
    State(state): State<ApiState>,
    Query(query): Query<IdQuery>,
) -> AuthorPostsResponse {
    let id = parse_id(query.id.as_deref())?;
    let excludes = query.list.excludes()?;
    let page = query.list.page_request(state.listing.author_page_size.get());

    let posts = state.posts.by_author_id(id, excludes, page).await?;
    Ok(Json(ApiResult::ok(posts)))
}

pub async fn post_by_permalink(
    State(state): State<ApiState>,
    Query(query): Query<PermalinkQuery>,
) -> Result<Json<ApiResult<PostView>>, ApiError> {
    let permalink = required("permalink", query.permalink.as_deref())?;
    let post = state.posts.by_permalink(permalink).await?;
    Ok(Json(ApiResult::ok(post)))
}
