//! Presentation helpers applied to stored post content before it is served.
//!
//! Everything here is pure: the same input always yields the same output.

mod shortcode;
mod text;

use thiserror::Error;

pub use shortcode::expand_shortcodes;
pub use text::{excerpt, html_to_text, social_description};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document processing failed: {message}")]
    Document { message: String },
}
