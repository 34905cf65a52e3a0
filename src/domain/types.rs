use std::fmt;

/// WordPress taxonomy of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    Category,
    PostTag,
    Other(String),
}

impl Taxonomy {
    pub fn as_str(&self) -> &str {
        match self {
            Taxonomy::Category => "category",
            Taxonomy::PostTag => "post_tag",
            Taxonomy::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for Taxonomy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "category" => Taxonomy::Category,
            "post_tag" => Taxonomy::PostTag,
            _ => Taxonomy::Other(value),
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post meta keys the aggregate reads.
pub mod meta_keys {
    pub const IMAGE: &str = "post_image";
    pub const SOCIAL_TITLE: &str = "_aioseop_title";
    pub const SOCIAL_DESCRIPTION: &str = "_aioseop_description";

    pub const ALL: [&str; 3] = [IMAGE, SOCIAL_DESCRIPTION, SOCIAL_TITLE];
}

/// External meta written by the social share refresher.
pub const FACEBOOK_SHARE_COUNT: &str = "facebook_share_count";
