//! Random spotlight handlers

use axum::Json;
use axum::extract::{Query, State};
use popit_api_types::{ApiResult, AuthorPosts, TermPosts};

use crate::application::spotlight::SpotlightMode;

use super::SpotlightQuery;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn tag_spotlight(
    State(state): State<ApiState>,
    Query(query): Query<SpotlightQuery>,
) -> Result<Json<ApiResult<Vec<TermPosts>>>, ApiError> {
    let spotlight = state.spotlight.term_spotlight(query.mode()).await?;
    Ok(Json(ApiResult::ok(spotlight)))
}

pub async fn author_spotlight(
    State(state): State<ApiState>,
    Query(query): Query<SpotlightQuery>,
) -> Result<Json<ApiResult<Vec<AuthorPosts>>>, ApiError> {
    let spotlight = state.spotlight.author_spotlight(query.mode()).await?;
    Ok(Json(ApiResult::ok(spotlight)))
}

impl SpotlightQuery {
    /// Only the literal `true` selects the compact layout.
    fn mode(&self) -> SpotlightMode {
        SpotlightMode::from_mobile_flag(self.is_mobile.as_deref() == Some("true"))
    }
}
