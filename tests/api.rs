mod support;

use std::collections::HashSet;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;

use popit_api_types::{ApiResult, AuthorPosts, PostView, TermPosts};

use support::{KOREAN_POST_NAME, MemoryStore, app, app_with_embed, fixture, get};

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).expect("decode envelope")
}

fn post_ids(posts: &[PostView]) -> Vec<u64> {
    posts.iter().map(|post| post.id).collect()
}

async fn expect_failure(uri: &str, status: StatusCode, message: &str) {
    let (actual, body) = get(app(fixture()), uri).await;
    assert_eq!(actual, status, "status of {uri}");
    assert_eq!(
        body,
        json!({"data": null, "success": false, "message": message}),
        "body of {uri}"
    );
}

#[tokio::test]
async fn recent_posts_are_newest_first_with_associations() {
    let (status, body) = get(app(fixture()), "/api/RecentPosts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!(""));

    let posts = decode::<Vec<PostView>>(body.clone())
        .data
        .expect("posts");
    assert_eq!(post_ids(&posts), vec![12, 11, 10, 9]);

    let latest = &posts[0];
    assert_eq!(latest.author.user_login, "park");
    assert_eq!(latest.image, "https://cdn.example.com/12.png");
    assert_eq!(latest.social_title, "Post 12");
    assert_eq!(latest.social_desc, "Latest news");
    assert_eq!(latest.content, "<p>Latest news</p><img src=\"a.png\">");
    assert_eq!(
        latest.categories.iter().map(|t| t.slug.as_str()).collect::<Vec<_>>(),
        vec!["dev"]
    );
    assert_eq!(
        latest.tags.iter().map(|t| t.slug.as_str()).collect::<Vec<_>>(),
        vec!["scala"]
    );
    assert_eq!(latest.external_metas.len(), 1);
    assert_eq!(latest.external_metas[0].value, "42");

    let custom = &posts[1];
    assert_eq!(custom.social_title, "Custom title");
    assert_eq!(custom.social_desc, "Custom description");

    let raw_author = &body["data"][0]["author"];
    assert!(raw_author.get("email").is_none());
    assert!(
        raw_author["avatar"]
            .as_str()
            .expect("avatar")
            .starts_with("https://www.gravatar.com/avatar/")
    );
    assert!(body["data"][0]["date"].as_str().expect("date").starts_with("2018-01-13T09:00:00"));
}

#[tokio::test]
async fn recent_posts_honor_page_and_size() {
    let (status, body) = get(app(fixture()), "/api/RecentPosts?page=2&size=5").await;
    assert_eq!(status, StatusCode::OK);
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![7, 6, 5, 4, 3]);

    let (_, body) = get(app(fixture()), "/api/RecentPosts?page=zero&size=many").await;
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12, 11, 10, 9]);

    let (_, body) = get(app(fixture()), "/api/RecentPosts?size=-1").await;
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12]);
}

#[tokio::test]
async fn routes_accept_a_trailing_slash() {
    let (status, body) = get(app(fixture()), "/api/RecentPosts/?size=1").await;
    assert_eq!(status, StatusCode::OK);
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12]);
}

#[tokio::test]
async fn search_requires_a_keyword() {
    expect_failure("/api/Search", StatusCode::BAD_REQUEST, "No keyword").await;
    expect_failure("/api/Search?keyword=", StatusCode::BAD_REQUEST, "No keyword").await;
}

#[tokio::test]
async fn search_matches_title_and_content() {
    let (status, body) = get(app(fixture()), "/api/Search?keyword=Latest").await;
    assert_eq!(status, StatusCode::OK);
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12]);

    let (_, body) = get(app(fixture()), "/api/Search?keyword=Post&page=2").await;
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![7, 6, 5, 4, 3]);
}

#[tokio::test]
async fn posts_by_tag_id_validates_parameters() {
    expect_failure(
        "/api/PostsByTagId?id=abc",
        StatusCode::BAD_REQUEST,
        "Wrong id parameter[abc]",
    )
    .await;
    expect_failure(
        "/api/PostsByTagId",
        StatusCode::BAD_REQUEST,
        "Wrong id parameter[]",
    )
    .await;
    expect_failure(
        "/api/PostsByTagId?id=1&excludes=3,x",
        StatusCode::BAD_REQUEST,
        "Wrong exclude post id: 3,x",
    )
    .await;
}

#[tokio::test]
async fn posts_by_tag_id_pages_and_excludes() {
    let (status, body) = get(app(fixture()), "/api/PostsByTagId?id=1").await;
    assert_eq!(status, StatusCode::OK);
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12, 11]);

    let (_, body) = get(
        app(fixture()),
        "/api/PostsByTagId?id=1&excludes=12,11,9&size=3",
    )
    .await;
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![10, 8, 7]);

    let (_, body) = get(app(fixture()), "/api/PostsByTagId?id=1&excludes=%20").await;
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12, 11]);
}

#[tokio::test]
async fn posts_by_tag_and_category_resolve_slugs() {
    let (status, body) = get(app(fixture()), "/api/PostsByTag?tag=rust").await;
    assert_eq!(status, StatusCode::OK);
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![7, 1]);

    let (status, body) = get(app(fixture()), "/api/PostsByCategory?category=dev&size=3").await;
    assert_eq!(status, StatusCode::OK);
    let posts = decode::<Vec<PostView>>(body).data.expect("posts");
    assert_eq!(post_ids(&posts), vec![12, 11, 10]);
}

#[tokio::test]
async fn unknown_or_missing_terms_are_reported() {
    expect_failure(
        "/api/PostsByTag?tag=",
        StatusCode::BAD_REQUEST,
        "Wrong tag parameter[]",
    )
    .await;
    expect_failure(
        "/api/PostsByTag?tag=nope",
        StatusCode::NOT_FOUND,
        "No term [nope]",
    )
    .await;
    // A category slug is not a tag.
    expect_failure(
        "/api/PostsByTag?tag=dev",
        StatusCode::NOT_FOUND,
        "No term [dev]",
    )
    .await;
    expect_failure(
        "/api/PostsByCategory",
        StatusCode::BAD_REQUEST,
        "Wrong category parameter[]",
    )
    .await;
}

#[tokio::test]
async fn posts_by_author_wraps_author_and_posts() {
    let (status, body) = get(app(fixture()), "/api/PostsByAuthor?author=lee&excludes=11").await;
    assert_eq!(status, StatusCode::OK);
    let author_posts = decode::<AuthorPosts>(body).data.expect("author posts");
    assert_eq!(author_posts.author.user_login, "lee");
    assert_eq!(post_ids(&author_posts.posts), vec![10, 9]);

    let (status, body) = get(app(fixture()), "/api/PostsByAuthorId?id=1&page=3").await;
    assert_eq!(status, StatusCode::OK);
    let author_posts = decode::<AuthorPosts>(body).data.expect("author posts");
    assert_eq!(author_posts.author.id, 1);
    assert_eq!(post_ids(&author_posts.posts), vec![2, 1]);
}

#[tokio::test]
async fn unknown_authors_are_not_found() {
    expect_failure(
        "/api/PostsByAuthor?author=ghost",
        StatusCode::NOT_FOUND,
        "Author ghost not found",
    )
    .await;
    expect_failure(
        "/api/PostsByAuthorId?id=99",
        StatusCode::NOT_FOUND,
        "Author not found",
    )
    .await;
    expect_failure(
        "/api/PostsByAuthorId?id=-1",
        StatusCode::BAD_REQUEST,
        "Wrong id parameter[-1]",
    )
    .await;
}

#[tokio::test]
async fn permalink_is_form_encoded_before_lookup() {
    let (status, body) = get(app(fixture()), "/api/PostByPermalink?permalink=post-3").await;
    assert_eq!(status, StatusCode::OK);
    let post = decode::<PostView>(body).data.expect("post");
    assert_eq!(post.id, 3);

    let (status, body) = get(
        app(fixture()),
        "/api/PostByPermalink?permalink=%ED%95%9C%EA%B8%80",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let post = decode::<PostView>(body).data.expect("post");
    assert_eq!(post.post_name, KOREAN_POST_NAME);
}

#[tokio::test]
async fn missing_permalinks_are_reported() {
    expect_failure(
        "/api/PostByPermalink",
        StatusCode::BAD_REQUEST,
        "Wrong permalink parameter[]",
    )
    .await;
    expect_failure(
        "/api/PostByPermalink?permalink=no%20such",
        StatusCode::NOT_FOUND,
        "no+such Not Found",
    )
    .await;
}

#[tokio::test]
async fn tag_spotlight_picks_distinct_popular_tags() {
    let (status, body) = get(app(fixture()), "/api/TagPosts").await;
    assert_eq!(status, StatusCode::OK);
    let groups = decode::<Vec<TermPosts>>(body).data.expect("spotlight");

    assert_eq!(groups.len(), 5);
    let ids: HashSet<u64> = groups.iter().map(|group| group.term.id).collect();
    assert_eq!(ids.len(), 5);
    for group in &groups {
        assert_ne!(group.term.slug, "lonely");
        assert_eq!(group.term.taxonomy, "post_tag");
        assert_eq!(group.posts.len(), 2);
        for post in &group.posts {
            assert!(post.tags.iter().any(|tag| tag.id == group.term.id));
        }
    }
}

#[tokio::test]
async fn compact_spotlights_are_smaller() {
    let (status, body) = get(app(fixture()), "/api/TagPosts?isMobile=true").await;
    assert_eq!(status, StatusCode::OK);
    let groups = decode::<Vec<TermPosts>>(body).data.expect("spotlight");
    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|group| group.posts.len() <= 2));

    let (_, body) = get(app(fixture()), "/api/TagPosts?isMobile=yes").await;
    let groups = decode::<Vec<TermPosts>>(body).data.expect("spotlight");
    assert_eq!(groups.len(), 5);
}

#[tokio::test]
async fn author_spotlight_is_capped_by_candidates() {
    let (status, body) = get(app(fixture()), "/api/RandomAuthorPosts").await;
    assert_eq!(status, StatusCode::OK);
    let groups = decode::<Vec<AuthorPosts>>(body).data.expect("spotlight");

    let mut logins: Vec<&str> = groups
        .iter()
        .map(|group| group.author.user_login.as_str())
        .collect();
    logins.sort_unstable();
    assert_eq!(logins, vec!["kim", "lee"]);
    for group in &groups {
        assert!(!group.posts.is_empty() && group.posts.len() <= 5);
        assert!(group.posts.iter().all(|post| post.author.id == group.author.id));
    }
}

#[tokio::test]
async fn spotlight_is_empty_without_candidates() {
    let (status, body) = get(app(MemoryStore::default()), "/api/TagPosts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn spotlight_resolution_failure_is_a_server_error() {
    let store = MemoryStore {
        fail_random_listings: true,
        ..fixture()
    };
    let (status, body) = get(app(store), "/api/RandomAuthorPosts").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .starts_with("failed to build author spotlight")
    );
}

#[tokio::test]
async fn google_ads_return_existing_slots() {
    let (status, body) = get(app(fixture()), "/api/GetGoogleAd?mode=mobile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "ad.mobile.bottom": {"id": 2, "name": "ad.mobile.bottom", "value": "<ins>mobile bottom</ins>"},
            "ad.mobile.top": {"id": 1, "name": "ad.mobile.top", "value": "<ins>mobile top</ins>"}
        })
    );

    let (_, body) = get(app(fixture()), "/api/GetGoogleAd?mode=desktop").await;
    assert_eq!(body["data"], json!({}));
}

#[tokio::test]
async fn slideshare_embed_proxies_oembed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/oembed/2")
                .query_param("url", "https://www.slideshare.net/kim/deck")
                .query_param("format", "json");
            then.status(200)
                .json_body(json!({"slideshow_id": 7, "title": "Deck"}));
        })
        .await;
    let router = app_with_embed(fixture(), &server.url("/api/oembed/2"));

    let (status, body) = get(
        router,
        "/api/GetSlideShareEmbedLink?link=https%3A%2F%2Fwww.slideshare.net%2Fkim%2Fdeck",
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"slideshow_id": 7, "title": "Deck"}));
}

#[tokio::test]
async fn slideshare_upstream_failure_is_bad_gateway() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/oembed/2");
            then.status(500).body("down");
        })
        .await;
    let router = app_with_embed(fixture(), &server.url("/api/oembed/2"));

    let (status, body) = get(router, "/api/GetSlideShareEmbedLink?link=deck").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], json!(false));

    expect_failure(
        "/api/GetSlideShareEmbedLink",
        StatusCode::BAD_REQUEST,
        "Wrong link parameter[]",
    )
    .await;
}

#[tokio::test]
async fn cors_preflight_is_answered_directly() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/RecentPosts")
        .header(header::ORIGIN, "https://www.popit.kr")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .expect("request");
    let response = app(fixture()).oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    assert!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .expect("methods")
            .contains("GET")
    );

    let request = Request::builder()
        .uri("/api/RecentPosts")
        .body(Body::empty())
        .expect("request");
    let response = app(fixture()).oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn health_reflects_the_store() {
    let (status, _) = get(app(fixture()), "/health").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let store = MemoryStore {
        healthy: false,
        ..fixture()
    };
    let (status, _) = get(app(store), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
