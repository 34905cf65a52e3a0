//! Domain entities mirrored from the WordPress store.

use md5::{Digest, Md5};
use time::OffsetDateTime;

use crate::domain::types::Taxonomy;

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: u64,
    pub user_login: String,
    pub display_name: String,
    pub user_url: String,
    pub email: String,
}

impl AuthorRecord {
    /// Gravatar URL keyed by the MD5 of the normalized e-mail address.
    pub fn avatar_url(&self) -> String {
        let normalized = self.email.trim().to_lowercase();
        let digest = Md5::digest(normalized.as_bytes());
        format!("{GRAVATAR_BASE}{}", hex::encode(digest))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    pub id: u64,
    pub taxonomy: Taxonomy,
    pub name: String,
    pub slug: String,
}

/// A term together with the number of distinct published posts attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCountRecord {
    pub term: TermRecord,
    pub post_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: u64,
    pub author_id: u64,
    pub content: String,
    pub title: String,
    pub post_date: OffsetDateTime,
    pub post_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMetaRecord {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePreferenceRecord {
    pub id: u64,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMetaRecord {
    pub id: u64,
    pub post_id: u64,
    pub name: String,
    pub value: String,
}
