//! render::markdown
//!
//! Markdown to sanitized HTML.
//!
//! Documents come straight out of a repository anyone with push access can
//! write to, so rendered HTML always goes through `ammonia` before it is
//! cached.

use pulldown_cmark::{html, Options, Parser};

/// Converts raw document bytes into sanitized HTML.
///
/// Implementations must be pure: the same input always yields the same
/// output, and rendering never touches shared state.
pub trait Renderer: Send + Sync {
    /// Render one document. Invalid UTF-8 is replaced, never rejected.
    fn render(&self, source: &[u8]) -> String;
}

/// CommonMark renderer with the common extensions (tables, footnotes,
/// strikethrough, task lists).
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a renderer.
    pub fn new() -> Self {
        Self
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, source: &[u8]) -> String {
        let text = String::from_utf8_lossy(source);
        let parser = Parser::new_ext(&text, Self::options());

        let mut unsafe_html = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut unsafe_html, parser);

        ammonia::clean(&unsafe_html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        MarkdownRenderer::new().render(source.as_bytes())
    }

    #[test]
    fn headings_and_paragraphs() {
        let html = render("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn tables_enabled() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn scripts_are_stripped() {
        let html = render("hello <script>alert(1)</script> world");
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert(1)"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn event_handlers_are_stripped() {
        let html = render("<img src=\"x.png\" onerror=\"alert(1)\">");
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let html = MarkdownRenderer::new().render(b"ok \xff\xfe bytes");
        assert!(html.contains("ok"));
        assert!(html.contains('\u{FFFD}'));
    }

    #[test]
    fn rendering_is_deterministic() {
        let source = "# A\n\n- one\n- two\n\n[link](http://example.com)";
        assert_eq!(render(source), render(source));
    }
}
