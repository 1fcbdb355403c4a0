//! # tempbox-render
//!
//! Safe rendering of untrusted email bodies.
//!
//! ## Features
//!
//! - **Sanitization**: fixed allow-list of structural and formatting elements;
//!   scripts, event handlers and dangerous URLs disappear from the output
//! - **Clickable images**: images outside links are wrapped in a link to
//!   their own source
//! - **Link hardening**: every link opens in a new browsing context without
//!   a reference back to the page
//! - **Plain text**: text-only bodies are shown preformatted, never parsed
//!
//! ## Quick Start
//!
//! ```
//! use tempbox_render::{RenderInput, render};
//!
//! let html = render(&RenderInput::html("<script>alert(1)</script><p>hi</p>"));
//! assert_eq!(html, "<p>hi</p>");
//!
//! let text = render(&RenderInput::text("hello"));
//! assert_eq!(text, "<pre>hello</pre>");
//! ```
//!
//! Rendering is pure and idempotent: feeding the output back in as HTML
//! returns the same string.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod policy;
mod renderer;
pub mod url;

pub use policy::Policy;
pub use renderer::{RenderInput, Renderer};

/// Renders a message body with the default policy.
#[must_use]
pub fn render(input: &RenderInput) -> String {
    Renderer::default().render(input)
}

/// Sanitizes an HTML fragment with the default policy.
#[must_use]
pub fn sanitize(html: &str) -> String {
    Renderer::default().sanitize(html)
}
