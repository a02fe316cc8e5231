//! Report Markup
//!
//! Converts the markdown report to HTML for the content region. Rendering is
//! delegated to an external renderer when one is available; otherwise the
//! text is wrapped in `<pre>` according to a [`FallbackPolicy`].

use serde::Deserialize;

use crate::view::{Document, DOCUMENT_UNAVAILABLE_TEXT};

/// Markup shown in place of a report that failed to load
pub const DOCUMENT_UNAVAILABLE_HTML: &str = "<p>分析内容加载失败</p>";

/// An external markdown to HTML converter
pub trait MarkdownRenderer {
    /// `None` when the renderer is unavailable or failed
    fn render(&self, markdown: &str) -> Option<String>;
}

/// How the `<pre>` fallback treats HTML-significant characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Escape `& < > " '`
    #[default]
    Escape,
    /// Insert the text as-is. The report can inject markup.
    Verbatim,
}

impl FallbackPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "escape" => Some(FallbackPolicy::Escape),
            "verbatim" => Some(FallbackPolicy::Verbatim),
            _ => None,
        }
    }
}

/// Convert a markdown report to HTML
pub fn markdown_to_html(
    markdown: &str,
    renderer: Option<&dyn MarkdownRenderer>,
    policy: FallbackPolicy,
) -> String {
    if let Some(html) = renderer.and_then(|r| r.render(markdown)) {
        return html;
    }

    match policy {
        FallbackPolicy::Escape => format!("<pre>{}</pre>", escape_html(markdown)),
        FallbackPolicy::Verbatim => format!("<pre>{}</pre>", markdown),
    }
}

/// Markup for the content region
pub fn document_html(
    document: &Document,
    renderer: Option<&dyn MarkdownRenderer>,
    policy: FallbackPolicy,
) -> String {
    match document {
        Document::Loaded(markdown) => markdown_to_html(markdown, renderer, policy),
        Document::Unavailable => DOCUMENT_UNAVAILABLE_HTML.to_string(),
    }
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl MarkdownRenderer for Upper {
        fn render(&self, markdown: &str) -> Option<String> {
            Some(format!("<p>{}</p>", markdown.to_uppercase()))
        }
    }

    struct Broken;

    impl MarkdownRenderer for Broken {
        fn render(&self, _markdown: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_renderer_is_preferred() {
        let html = markdown_to_html("buy", Some(&Upper), FallbackPolicy::Escape);
        assert_eq!(html, "<p>BUY</p>");
    }

    #[test]
    fn test_escape_fallback() {
        let md = "# 结论\n<script>alert('x')</script> & more";
        let html = markdown_to_html(md, None, FallbackPolicy::Escape);
        assert_eq!(
            html,
            "<pre># 结论\n&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more</pre>"
        );
        assert!(!html[5..html.len() - 6].contains('<'));
    }

    #[test]
    fn test_verbatim_fallback() {
        let html = markdown_to_html("<b>x</b>", Some(&Broken), FallbackPolicy::Verbatim);
        assert_eq!(html, "<pre><b>x</b></pre>");
    }

    #[test]
    fn test_unavailable_document() {
        let html = document_html(&Document::Unavailable, Some(&Upper), FallbackPolicy::Escape);
        assert_eq!(html, DOCUMENT_UNAVAILABLE_HTML);
        assert!(html.contains(DOCUMENT_UNAVAILABLE_TEXT));
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(FallbackPolicy::from_name("Escape"), Some(FallbackPolicy::Escape));
        assert_eq!(FallbackPolicy::from_name("verbatim"), Some(FallbackPolicy::Verbatim));
        assert_eq!(FallbackPolicy::from_name("raw"), None);
        assert_eq!(FallbackPolicy::default(), FallbackPolicy::Escape);
    }
}
