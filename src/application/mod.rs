//! Application services layer.

pub mod embed;
pub mod error;
pub mod pagination;
pub mod posts;
pub mod preferences;
pub mod render;
pub mod repos;
pub mod social;
pub mod spotlight;
