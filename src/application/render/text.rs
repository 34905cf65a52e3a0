//! Plain-text extraction from post HTML.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::{RewriteStrSettings, doc_text, element, rewrite_str};

use super::RenderError;

const BLOCK_ELEMENTS: &str =
    "p, div, br, li, h1, h2, h3, h4, h5, h6, tr, blockquote, pre, ul, ol, table, hr";

/// Separator runs authors paste into descriptions; stripped from excerpts.
const SEPARATOR_RUNS: [&str; 3] = [
    "--------------------------",
    "-----------------",
    "*****************",
];

/// Convert an HTML fragment into readable plain text.
///
/// `script` and `style` content is dropped, block elements start a new line,
/// common entities are decoded and whitespace runs are collapsed.
pub fn html_to_text(html: &str) -> Result<String, RenderError> {
    if html.trim().is_empty() {
        return Ok(String::new());
    }

    let stripped = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("script, style", |el| {
                el.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let buffer = Rc::new(RefCell::new(String::with_capacity(stripped.len())));
    let block_buffer = Rc::clone(&buffer);
    let text_buffer = Rc::clone(&buffer);

    rewrite_str(
        &stripped,
        RewriteStrSettings {
            element_content_handlers: vec![element!(BLOCK_ELEMENTS, move |_el| {
                block_buffer.borrow_mut().push('\n');
                Ok(())
            })],
            document_content_handlers: vec![doc_text!(move |chunk| {
                text_buffer.borrow_mut().push_str(chunk.as_str());
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let raw = buffer.borrow();
    Ok(collapse_whitespace(&decode_entities(&raw)))
}

/// Cut `text` to `max_chars` characters and strip separator runs from the result.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut truncated: String = text.chars().take(max_chars).collect();
    for run in SEPARATOR_RUNS {
        truncated = truncated.replace(run, "");
    }
    truncated
}

/// Social description of a post: the stored description, or the content's
/// text when none is stored, cut down to an excerpt.
pub fn social_description(
    description: &str,
    content_html: &str,
    max_chars: usize,
) -> Result<String, RenderError> {
    let source = if description.trim().is_empty() {
        html_to_text(content_html)?
    } else {
        description.to_string()
    };
    Ok(excerpt(&source, max_chars))
}

fn decode_entities(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match candidate.find(';').filter(|end| *end <= 10) {
            Some(end) => match decode_entity(&candidate[1..end]) {
                Some(decoded) => {
                    output.push(decoded);
                    rest = &candidate[end + 1..];
                }
                None => {
                    output.push('&');
                    rest = &candidate[1..];
                }
            },
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "hellip" => Some('…'),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "lsquo" => Some('‘'),
        "rsquo" => Some('’'),
        "ldquo" => Some('“'),
        "rdquo" => Some('”'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
