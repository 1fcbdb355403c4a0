//! Allow-list policy for sanitized HTML.

use std::collections::HashSet;

/// Elements kept by the default policy.
pub const DEFAULT_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "caption",
    "code",
    "dd",
    "div",
    "dl",
    "dt",
    "em",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "i",
    "img",
    "li",
    "ol",
    "p",
    "pre",
    "s",
    "small",
    "span",
    "strong",
    "sub",
    "sup",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "u",
    "ul",
];

/// Attributes kept by the default policy.
pub const DEFAULT_ATTRIBUTES: &[&str] = &[
    "alt", "class", "height", "href", "src", "style", "title", "width",
];

/// Elements removed together with everything inside them.
///
/// These can run script, load active content, or change how the rest of the
/// document is parsed. A policy can never allow them.
pub const FORBIDDEN_TAGS: &[&str] = &[
    "applet", "audio", "base", "basefont", "button", "canvas", "embed", "form", "frame",
    "frameset", "head", "iframe", "input", "link", "marquee", "math", "meta", "noembed",
    "noframes", "noscript", "object", "option", "param", "plaintext", "script", "select",
    "style", "svg", "template", "textarea", "title", "video", "xmp",
];

/// Elements without content or closing tag.
pub(crate) const VOID_TAGS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Which elements and attributes survive sanitization.
///
/// Elements outside the allow-list are unwrapped (their children are kept),
/// except for [`FORBIDDEN_TAGS`], which disappear with their content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    tags: HashSet<String>,
    attributes: HashSet<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            tags: DEFAULT_TAGS.iter().map(|t| (*t).to_string()).collect(),
            attributes: DEFAULT_ATTRIBUTES.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

impl Policy {
    /// Creates the default email policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that keeps no elements and no attributes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tags: HashSet::new(),
            attributes: HashSet::new(),
        }
    }

    /// Allows an element. Forbidden elements are ignored.
    #[must_use]
    pub fn allow_tag(mut self, tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        if !FORBIDDEN_TAGS.contains(&tag.as_str()) {
            self.tags.insert(tag);
        }
        self
    }

    /// Removes an element from the allow-list.
    #[must_use]
    pub fn deny_tag(mut self, tag: &str) -> Self {
        self.tags.remove(&tag.to_ascii_lowercase());
        self
    }

    /// Allows an attribute. Event handlers (`on*`) are ignored.
    #[must_use]
    pub fn allow_attribute(mut self, attribute: &str) -> Self {
        let attribute = attribute.to_ascii_lowercase();
        if !attribute.starts_with("on") {
            self.attributes.insert(attribute);
        }
        self
    }

    /// Removes an attribute from the allow-list.
    #[must_use]
    pub fn deny_attribute(mut self, attribute: &str) -> Self {
        self.attributes.remove(&attribute.to_ascii_lowercase());
        self
    }

    /// Returns true if the element is kept.
    #[must_use]
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns true if the attribute is kept (subject to value checks).
    #[must_use]
    pub fn allows_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    /// Returns true if the element must be dropped with its content.
    #[must_use]
    pub fn is_forbidden(tag: &str) -> bool {
        FORBIDDEN_TAGS.contains(&tag)
    }
}
