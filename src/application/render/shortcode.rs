//! Expansion of the WordPress shortcodes found in stored post content.
//!
//! Only `caption`, `embed` and `slideshare` are understood. Anything else that
//! looks like a shortcode, and any malformed occurrence of the known ones, is
//! copied through unchanged.

const SLIDESHARE_EMBED_BASE: &str = "https://www.slideshare.net/slideshow/embed_code/";

struct OpenTag<'a> {
    name: &'a str,
    attrs: &'a str,
    /// Byte length of the whole `[name attrs]` token.
    len: usize,
}

/// Expand the supported shortcodes in `content`.
pub fn expand_shortcodes(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find('[') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];

        match expand_at(candidate) {
            Some((replacement, consumed)) => {
                output.push_str(&replacement);
                rest = &candidate[consumed..];
            }
            None => {
                output.push('[');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Try to expand a shortcode starting at the beginning of `input`. Returns the
/// replacement and the number of bytes it replaces.
fn expand_at(input: &str) -> Option<(String, usize)> {
    let tag = parse_open_tag(input)?;
    match tag.name {
        "caption" => {
            let (inner, consumed) = enclosed(input, &tag)?;
            Some((expand_shortcodes(inner.trim()), consumed))
        }
        "embed" => {
            let (inner, consumed) = enclosed(input, &tag)?;
            let url = inner.trim();
            if url.is_empty() || url.contains(['"', '<', '>']) {
                return None;
            }
            Some((format!(r#"<a href="{url}">{url}</a>"#), consumed))
        }
        "slideshare" => {
            let id = attribute(tag.attrs, "id")?;
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Some((slideshare_iframe(id), tag.len))
        }
        _ => None,
    }
}

fn parse_open_tag(input: &str) -> Option<OpenTag<'_>> {
    let body = input.strip_prefix('[')?;
    let close = body.find(']')?;
    let inside = &body[..close];
    if inside.contains('[') {
        return None;
    }

    let name_len = inside
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(inside.len());
    if name_len == 0 {
        return None;
    }
    let (name, attrs) = inside.split_at(name_len);
    if !attrs.is_empty() && !attrs.starts_with(char::is_whitespace) {
        return None;
    }

    Some(OpenTag {
        name,
        attrs: attrs.trim(),
        len: close + 2,
    })
}

/// Content between an opening tag and its matching `[/name]`, plus the total
/// length consumed including both tags.
fn enclosed<'a>(input: &'a str, tag: &OpenTag<'_>) -> Option<(&'a str, usize)> {
    let closing = format!("[/{}]", tag.name);
    let after_open = &input[tag.len..];
    let end = after_open.find(&closing)?;
    Some((&after_open[..end], tag.len + end + closing.len()))
}

fn attribute<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    let mut rest = attrs;
    while !rest.is_empty() {
        rest = rest.trim_start();
        let eq = rest.find('=')?;
        let name = rest[..eq].trim();
        let value_start = rest[eq + 1..].trim_start();

        let (value, remainder) = match value_start.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let unquoted = &value_start[1..];
                let end = unquoted.find(quote)?;
                (&unquoted[..end], &unquoted[end + 1..])
            }
            // slideshare packs extra options as `id=1&doc=name&w=425`
            Some(_) => {
                let end = value_start
                    .find(|c: char| c.is_whitespace() || c == '&')
                    .unwrap_or(value_start.len());
                (
                    &value_start[..end],
                    value_start[end..].trim_start_matches('&'),
                )
            }
            None => ("", ""),
        };

        if name == key {
            return Some(value);
        }
        rest = remainder;
    }
    None
}

fn slideshare_iframe(id: &str) -> String {
    format!(
        r#"<iframe src="{SLIDESHARE_EMBED_BASE}{id}" width="595" height="485" frameborder="0" marginwidth="0" marginheight="0" scrolling="no" allowfullscreen></iframe>"#
    )
}
