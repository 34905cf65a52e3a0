//! Offset pagination and exclusion-list parsing shared by the listing endpoints.

use thiserror::Error;

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Wrong exclude post id: {raw}")]
    InvalidExclude { raw: String },
}

/// One page of a listing. `page` is 1-based and `size` stays within `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn first(size: u32) -> Self {
        Self::new(1, size)
    }

    /// Build a page from raw query values; anything that does not parse falls back to the defaults.
    pub fn from_query(page: Option<&str>, size: Option<&str>, default_size: u32) -> Self {
        let page = parse_or(page, 1);
        let size = parse_or(size, default_size);
        Self::new(page, size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

fn parse_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|value| value.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(default)
}

/// Parse a comma separated list of post ids. A blank value means no exclusions.
pub fn parse_excludes(raw: Option<&str>) -> Result<Vec<u64>, PaginationError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| PaginationError::InvalidExclude {
                    raw: raw.to_string(),
                })
        })
        .collect()
}
