pub mod error;
pub mod handlers;
pub mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

/// Content routes. Each one also answers with a trailing slash.
pub fn build_api_router(state: ApiState) -> Router {
    let routes = [
        ("/api/Search", get(handlers::search_posts)),
        ("/api/RecentPosts", get(handlers::recent_posts)),
        ("/api/TagPosts", get(handlers::tag_spotlight)),
        ("/api/RandomAuthorPosts", get(handlers::author_spotlight)),
        ("/api/PostsByTagId", get(handlers::posts_by_tag_id)),
        ("/api/PostsByTag", get(handlers::posts_by_tag)),
        ("/api/PostsByCategory", get(handlers::posts_by_category)),
        ("/api/PostsByAuthor", get(handlers::posts_by_author)),
        ("/api/PostsByAuthorId", get(handlers::posts_by_author_id)),
        ("/api/PostByPermalink", get(handlers::post_by_permalink)),
        ("/api/GetGoogleAd", get(handlers::google_ads)),
        ("/api/GetSlideShareEmbedLink", get(handlers::slideshare_embed)),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| {
            router
                .route(path, handler.clone())
                .route(&format!("{path}/"), handler)
        })
        .with_state(state)
}
