//! Text normalization for user-submitted record fields.

use url::Url;

/// Sanitizes a single-line text field.
///
/// Strips markup tags, drops line breaks, tabs and other control characters,
/// collapses runs of whitespace and trims the result.
pub fn sanitize_text_field(input: &str) -> String {
    let mut without_tags = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        without_tags.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            // Unclosed `<` is literal text.
            None => {
                without_tags.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    without_tags.push_str(rest);

    without_tags
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sanitizes an optional field, mapping blank results to `None`.
pub fn sanitize_optional(input: Option<&str>) -> Option<String> {
    input
        .map(sanitize_text_field)
        .filter(|value| !value.is_empty())
}

/// True for absolute `http://` or `https://` URLs with a non-empty host.
pub fn is_http_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
