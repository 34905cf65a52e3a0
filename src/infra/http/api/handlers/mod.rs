//! API handlers organized by resource type.
//!
//! Query structs and the parameter helpers shared by the handlers live here.

mod posts;
mod site;
mod spotlight;

pub use posts::*;
pub use site::*;
pub use spotlight::*;

use serde::Deserialize;

use crate::application::pagination::{PageRequest, parse_excludes};

use super::error::ApiError;

/// Every parameter is taken as raw text so malformed values surface as
/// envelope errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub excludes: Option<String>,
}

impl ListQuery {
    fn page_request(&self, default_size: u32) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.size.as_deref(), default_size)
    }

    fn excludes(&self) -> Result<Vec<u64>, ApiError> {
        Ok(parse_excludes(self.excludes.as_deref())?)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub tag: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: Option<String>,
    #[serde(flatten)]
    pub list: ListQuery,
}

#[derive(Debug, Deserialize)]
pub struct PermalinkQuery {
    pub permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpotlightQuery {
    #[serde(rename = "isMobile")]
    pub is_mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbedQuery {
    pub link: Option<String>,
}

/// Non-empty parameter value, or a `Wrong {name} parameter[..]` error.
fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, ApiError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        other => Err(wrong_parameter(name, other.unwrap_or_default())),
    }
}

fn parse_id(raw: Option<&str>) -> Result<u64, ApiError> {
    let raw = raw.unwrap_or_default();
    raw.trim()
        .parse::<u64>()
        .map_err(|_| wrong_parameter("id", raw))
}

fn wrong_parameter(name: &str, raw: &str) -> ApiError {
    ApiError::bad_request(format!("Wrong {name} parameter[{raw}]"))
}
