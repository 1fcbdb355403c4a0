//! URL and inline-style checks for attribute values.

/// Schemes an anchor may navigate to.
const LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Schemes an image may load from.
const IMAGE_SCHEMES: &[&str] = &["http", "https", "cid"];

/// Raster image types accepted as `data:` URLs.
const DATA_IMAGE_TYPES: &[&str] = &[
    "data:image/png",
    "data:image/gif",
    "data:image/jpeg",
    "data:image/jpg",
    "data:image/webp",
    "data:image/bmp",
];

/// Fragments that make an inline style executable in some engines.
const STYLE_DENYLIST: &[&str] = &[
    "expression(",
    "javascript:",
    "vbscript:",
    "-moz-binding",
    "behavior:",
];

/// Lowercases and strips whitespace and control characters.
///
/// Browsers ignore tabs and newlines inside URLs, so `java\tscript:` must be
/// seen as `javascript:`.
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns the scheme of a normalized URL, or `None` for relative URLs.
fn scheme(normalized: &str) -> Option<&str> {
    let end = normalized.find(':')?;
    let candidate = &normalized[..end];
    let is_scheme = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then_some(candidate)
}

/// Returns true if an anchor may point at `value`.
#[must_use]
pub fn is_safe_link(value: &str) -> bool {
    let normalized = normalize(value);
    if normalized.is_empty() {
        return false;
    }
    scheme(&normalized).is_none_or(|s| LINK_SCHEMES.contains(&s))
}

/// Returns true if an image may load `value`.
#[must_use]
pub fn is_safe_image(value: &str) -> bool {
    let normalized = normalize(value);
    if normalized.is_empty() {
        return false;
    }
    match scheme(&normalized) {
        None => true,
        Some("data") => DATA_IMAGE_TYPES
            .iter()
            .any(|prefix| normalized.starts_with(prefix)),
        Some(s) => IMAGE_SCHEMES.contains(&s),
    }
}

/// Returns true if an inline style cannot execute anything.
#[must_use]
pub fn is_safe_style(value: &str) -> bool {
    // CSS escapes can spell any denied keyword.
    if value.contains('\\') {
        return false;
    }
    let normalized = normalize(&strip_css_comments(value));
    !STYLE_DENYLIST.iter().any(|bad| normalized.contains(bad))
}

/// Removes `/* ... */` comments; an unterminated comment runs to the end.
fn strip_css_comments(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
