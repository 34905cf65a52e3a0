//! Wire types for the popit content API.
//!
//! Every endpoint answers with an [`ApiResult`] envelope. The aggregates below
//! are the denormalized shapes front-ends consume: a post carries its author,
//! taxonomy terms and social metadata inline.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult<T> {
    pub data: Option<T>,
    pub success: bool,
    pub message: String,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            success: true,
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            success: false,
            message: message.into(),
        }
    }
}

/// Public projection of a user account. The e-mail address never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: u64,
    pub user_login: String,
    pub display_name: String,
    pub user_url: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermView {
    pub id: u64,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMetaView {
    pub id: u64,
    pub post_id: u64,
    pub name: String,
    pub value: String,
}

/// A published post with its associations resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: u64,
    pub author: AuthorView,
    pub content: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub post_name: String,
    pub image: String,
    pub social_title: String,
    pub social_desc: String,
    pub categories: Vec<TermView>,
    pub tags: Vec<TermView>,
    #[serde(default)]
    pub external_metas: Vec<ExternalMetaView>,
}

/// One entry of the term spotlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermPosts {
    pub term: TermView,
    pub posts: Vec<PostView>,
}

/// One entry of the author spotlight, also the payload of the by-author listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorPosts {
    pub author: AuthorView,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePreferenceView {
    pub id: u64,
    pub name: String,
    pub value: String,
}
