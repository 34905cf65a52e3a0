//! Site-level handlers: ad slots and the SlideShare oEmbed proxy

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Query, State};
use popit_api_types::{ApiResult, SitePreferenceView};
use serde_json::{Map, Value};

use super::{AdQuery, EmbedQuery, required};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn google_ads(
    State(state): State<ApiState>,
    Query(query): Query<AdQuery>,
) -> Result<Json<ApiResult<BTreeMap<String, SitePreferenceView>>>, ApiError> {
    let mode = query.mode.unwrap_or_default();
    let ads = state.preferences.ads(&mode).await?;
    Ok(Json(ApiResult::ok(ads)))
}

pub async fn slideshare_embed(
    State(state): State<ApiState>,
    Query(query): Query<EmbedQuery>,
) -> Result<Json<ApiResult<Map<String, Value>>>, ApiError> {
    let link = required("link", query.link.as_deref())?;
    let embed = state.embed.slideshare(link).await?;
    Ok(Json(ApiResult::ok(embed)))
}
