//! HTML sanitization and message body rendering.

use ego_tree::NodeRef;
use ego_tree::iter::Edge;
use scraper::node::Element;
use scraper::{Html, Node};

use crate::policy::{Policy, VOID_TAGS};
use crate::url::{is_safe_image, is_safe_link, is_safe_style};

/// Attributes forced onto every anchor.
const LINK_TARGET: &str = "_blank";
const LINK_REL: &str = "noopener noreferrer";

/// Upper bound on sanitize passes before the output is returned as is.
const MAX_PASSES: usize = 4;

/// Body of a message to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderInput {
    /// HTML body, if the message has one.
    pub body_html: Option<String>,
    /// Plain text body, if the message has one.
    pub body_text: Option<String>,
}

impl RenderInput {
    /// Creates an input from optional HTML and text bodies.
    #[must_use]
    pub const fn new(body_html: Option<String>, body_text: Option<String>) -> Self {
        Self {
            body_html,
            body_text,
        }
    }

    /// Creates an input with only an HTML body.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(Some(body.into()), None)
    }

    /// Creates an input with only a plain text body.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(None, Some(body.into()))
    }

    fn source(&self) -> Source<'_> {
        if let Some(html) = self.body_html.as_deref().filter(|h| !h.trim().is_empty()) {
            return Source::Html(html);
        }
        match self.body_text.as_deref() {
            Some(text) if !text.is_empty() => Source::Text(text),
            _ => Source::Empty,
        }
    }
}

enum Source<'a> {
    Html(&'a str),
    Text(&'a str),
    Empty,
}

/// What was written for an open element, so its close edge can be handled.
enum Frame<'a> {
    /// Open tag written; close it with this name.
    Element(&'a str),
    /// Anchor written; close it and leave anchor context.
    Anchor,
    /// Nothing written (void element or unwrapped element).
    Transparent,
    /// Inside a forbidden subtree.
    Dropped,
}

/// Turns untrusted message bodies into HTML that is safe to display.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    policy: Policy,
}

impl Renderer {
    /// Creates a renderer with the given policy.
    #[must_use]
    pub const fn new(policy: Policy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Renders a message body.
    ///
    /// HTML is preferred; a blank or missing HTML body falls back to the
    /// plain text body, which is shown preformatted and never interpreted as
    /// markup. Returns an empty string when there is no body at all, or when
    /// nothing but whitespace survives sanitizing.
    #[must_use]
    pub fn render(&self, input: &RenderInput) -> String {
        match input.source() {
            Source::Html(html) => {
                let out = self.sanitize(html);
                if out.trim().is_empty() { String::new() } else { out }
            }
            Source::Text(text) => render_plain_text(text),
            Source::Empty => String::new(),
        }
    }

    /// Sanitizes an HTML fragment.
    ///
    /// The result is a fixed point: sanitizing it again returns it unchanged.
    #[must_use]
    pub fn sanitize(&self, html: &str) -> String {
        let mut current = self.sanitize_once(html);
        for _ in 1..MAX_PASSES {
            let next = self.sanitize_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn sanitize_once(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let mut out = String::with_capacity(html.len());
        let mut stack: Vec<Frame<'_>> = Vec::new();
        let mut dropped = 0usize;
        let mut anchors = 0usize;

        // The fragment parser wraps its content in a synthetic <html> element.
        for child in fragment.root_element().children() {
            for edge in child.traverse() {
                match edge {
                    Edge::Open(node) => match node.value() {
                        Node::Text(text) if dropped == 0 => escape_text(text, &mut out),
                        Node::Element(element) => {
                            let frame = if dropped > 0 || Policy::is_forbidden(element.name()) {
                                dropped += 1;
                                Frame::Dropped
                            } else {
                                self.open_element(node, element, anchors, &mut out)
                            };
                            if matches!(frame, Frame::Anchor) {
                                anchors += 1;
                            }
                            stack.push(frame);
                        }
                        _ => {}
                    },
                    Edge::Close(node) => {
                        if !node.value().is_element() {
                            continue;
                        }
                        match stack.pop() {
                            Some(Frame::Element(name)) => {
                                out.push_str("</");
                                out.push_str(name);
                                out.push('>');
                            }
                            Some(Frame::Anchor) => {
                                anchors -= 1;
                                out.push_str("</a>");
                            }
                            Some(Frame::Dropped) => dropped -= 1,
                            Some(Frame::Transparent) | None => {}
                        }
                    }
                }
            }
        }
        out
    }

    fn open_element<'a>(
        &self,
        node: NodeRef<'a, Node>,
        element: &'a Element,
        anchors: usize,
        out: &mut String,
    ) -> Frame<'a> {
        let name = element.name();
        if !self.policy.allows_tag(name) {
            return Frame::Transparent;
        }

        let attributes = self.filter_attributes(name, element);
        match name {
            "a" => {
                out.push_str("<a");
                write_attributes(&attributes, out);
                write_link_hardening(out);
                out.push('>');
                Frame::Anchor
            }
            "img" => {
                let wrap_href = attributes
                    .iter()
                    .find(|(attr, _)| *attr == "src")
                    .map(|(_, src)| *src)
                    .filter(|src| anchors == 0 && self.policy.allows_tag("a") && is_safe_link(src));
                if let Some(href) = wrap_href {
                    out.push_str("<a");
                    write_attributes(&[("href", href)], out);
                    write_link_hardening(out);
                    out.push('>');
                }
                out.push_str("<img");
                write_attributes(&attributes, out);
                out.push('>');
                if wrap_href.is_some() {
                    out.push_str("</a>");
                }
                Frame::Transparent
            }
            _ => {
                out.push('<');
                out.push_str(name);
                write_attributes(&attributes, out);
                out.push('>');
                if VOID_TAGS.contains(&name) {
                    return Frame::Transparent;
                }
                // The parser eats one newline right after <pre>; write an extra
                // one so leading blank lines survive another parse.
                if name == "pre" && starts_with_newline(node) {
                    out.push('\n');
                }
                Frame::Element(name)
            }
        }
    }

    fn filter_attributes<'a>(&self, tag: &str, element: &'a Element) -> Vec<(&'a str, &'a str)> {
        let mut attributes: Vec<(&str, &str)> = element
            .attrs()
            .filter(|(name, value)| {
                if !self.policy.allows_attribute(name) || name.starts_with("on") {
                    return false;
                }
                match *name {
                    "href" => tag == "a" && is_safe_link(value),
                    "src" => tag == "img" && is_safe_image(value),
                    "style" => is_safe_style(value),
                    "target" | "rel" => tag != "a",
                    _ => true,
                }
            })
            .collect();
        attributes.sort_unstable_by(|a, b| a.0.cmp(b.0));
        attributes
    }
}

/// Renders a plain text body as preformatted, escaped text.
fn render_plain_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n").replace('\0', "");
    let mut out = String::with_capacity(text.len() + 12);
    out.push_str("<pre>");
    if text.starts_with('\n') {
        out.push('\n');
    }
    escape_text(&text, &mut out);
    out.push_str("</pre>");
    out
}

fn starts_with_newline(node: NodeRef<'_, Node>) -> bool {
    node.first_child()
        .and_then(|child| child.value().as_text().map(|text| text.starts_with('\n')))
        .unwrap_or(false)
}

fn write_attributes(attributes: &[(&str, &str)], out: &mut String) {
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
}

fn write_link_hardening(out: &mut String) {
    out.push_str(" target=\"");
    out.push_str(LINK_TARGET);
    out.push_str("\" rel=\"");
    out.push_str(LINK_REL);
    out.push('"');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sanitize(html: &str) -> String {
        Renderer::default().sanitize(html)
    }

    #[test]
    fn test_script_removed() {
        let out = sanitize("<script>alert(1)</script><p>hi</p>");
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_style_element_removed_with_content() {
        let out = sanitize("<style>p { color: red }</style><p>x</p>");
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn test_event_handlers_removed() {
        let out = sanitize(r#"<p onclick="steal()" class="intro">hello</p>"#);
        assert_eq!(out, r#"<p class="intro">hello</p>"#);
    }

    #[test]
    fn test_unknown_element_unwrapped() {
        let out = sanitize("<p><font color=red>warm <b>words</b></font></p>");
        assert_eq!(out, "<p>warm <b>words</b></p>");
    }

    #[test]
    fn test_comments_removed() {
        let out = sanitize("<p>a<!-- secret -->b</p>");
        assert_eq!(out, "<p>ab</p>");
    }

    #[test]
    fn test_javascript_href_removed() {
        let out = sanitize(r#"<a href="javascript:alert(1)">click</a>"#);
        assert_eq!(
            out,
            r#"<a target="_blank" rel="noopener noreferrer">click</a>"#
        );
    }

    #[test]
    fn test_links_hardened() {
        let out = sanitize(r#"<a href="https://example.com" target="_self" rel="opener">x</a>"#);
        assert_eq!(
            out,
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn test_image_wrapped_in_link() {
        let out = sanitize(r#"<img src="x.png" alt="logo">"#);
        assert_eq!(
            out,
            r#"<a href="x.png" target="_blank" rel="noopener noreferrer"><img alt="logo" src="x.png"></a>"#
        );
        assert_eq!(out.matches("<a ").count(), 1);
    }

    #[test]
    fn test_image_inside_link_not_wrapped_again() {
        let out = sanitize(r#"<a href="https://example.com"><span><img src="x.png"></span></a>"#);
        assert_eq!(out.matches("<a ").count(), 1);
        assert!(out.contains(r#"<a href="https://example.com""#));
    }

    #[test]
    fn test_data_image_kept_but_not_linked() {
        let out = sanitize(r#"<img src="data:image/png;base64,AAAA">"#);
        assert_eq!(out, r#"<img src="data:image/png;base64,AAAA">"#);
    }

    #[test]
    fn test_unsafe_image_source_dropped() {
        let out = sanitize(r#"<img src="javascript:alert(1)" alt="x">"#);
        assert_eq!(out, r#"<img alt="x">"#);
    }

    #[test]
    fn test_style_attribute_checked() {
        let out = sanitize(r#"<span style="color: red">a</span><span style="width: expression(x)">b</span>"#);
        assert_eq!(out, r#"<span style="color: red">a</span><span>b</span>"#);
    }

    #[test]
    fn test_text_escaped() {
        let out = sanitize("<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>");
        assert_eq!(out, "<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>");
    }

    #[test]
    fn test_forbidden_subtree_nested() {
        let out = sanitize("<div>a<svg><a href='x'><text>b</text></a></svg>c</div>");
        assert_eq!(out, "<div>ac</div>");
    }

    #[test]
    fn test_table_structure_kept() {
        let out = sanitize("<table><tr><td>1</td><th>2</th></tr></table>");
        assert_eq!(
            out,
            "<table><tbody><tr><td>1</td><th>2</th></tr></tbody></table>"
        );
    }

    #[test]
    fn test_pre_leading_newline_survives() {
        let once = sanitize("<pre>\n\nindented</pre>");
        assert_eq!(sanitize(&once), once);
        assert!(once.contains("indented"));
    }

    #[test]
    fn test_sanitize_is_idempotent_on_malformed_input() {
        let inputs = [
            "<b><p>x</b>y</p>",
            "<table>stray<tr><td>cell</table>",
            "<p><center><p>deep</p></center>",
            "<ul><li>one<li>two</ul><img src=a.png><a href=/b>b",
            "<a href=1><table><tr><td><img src=x.png></td></tr></table></a>",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_render_prefers_html() {
        let input = RenderInput::new(Some("<p>html</p>".into()), Some("text".into()));
        assert_eq!(Renderer::default().render(&input), "<p>html</p>");
    }

    #[test]
    fn test_render_blank_html_falls_back_to_text() {
        let input = RenderInput::new(Some("   \n".into()), Some("hello".into()));
        assert_eq!(Renderer::default().render(&input), "<pre>hello</pre>");
    }

    #[test]
    fn test_render_plain_text_is_not_interpreted() {
        let input = RenderInput::text("<b>not bold</b> & co");
        assert_eq!(
            Renderer::default().render(&input),
            "<pre>&lt;b&gt;not bold&lt;/b&gt; &amp; co</pre>"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(Renderer::default().render(&RenderInput::default()), "");
        assert_eq!(
            Renderer::default().render(&RenderInput::new(None, Some(String::new()))),
            ""
        );
    }

    #[test]
    fn test_policy_without_anchors_does_not_wrap_images() {
        let renderer = Renderer::new(Policy::default().deny_tag("a"));
        let out = renderer.sanitize(r#"<a href="y">link</a><img src="x.png">"#);
        assert_eq!(out, r#"link<img src="x.png">"#);
    }
}
