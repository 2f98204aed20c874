//! Generic (fallback) site adapter.
//!
//! Always matches. Its selectors cover the common markup of the supported
//! platforms plus plain `article` elements, so unknown mirrors and saved
//! pages still convert.

use once_cell::sync::Lazy;

use super::SiteAdapter;
use crate::node::NodeRef;
use crate::selector::Selector;

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#".sr-only, .visually-hidden, [role="toolbar"]"#)
        .expect("hardcoded selector is valid")
});

/// Generic adapter that works on arbitrary chat pages.
/// Always matches as the lowest-priority fallback.
pub struct GenericAdapter;

impl SiteAdapter for GenericAdapter {
    fn name(&self) -> &str {
        "generic"
    }

    fn matches_host(&self, _host: &str) -> bool {
        true
    }

    fn message_selector(&self) -> &str {
        r#"[data-message-author-role="assistant"], model-response, [data-is-streaming], .ds-message, article"#
    }

    fn message_content_selector(&self) -> &str {
        ".markdown, .ds-markdown, .font-claude-message, .prose"
    }

    fn copy_button_selector(&self) -> &str {
        r#"button[aria-label="Copy"], button[data-testid*="copy"]"#
    }

    fn is_noise_node(&self, node: &NodeRef<'_, '_>) -> bool {
        NOISE.matches(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::MarkdownConverter;

    #[test]
    fn test_article_fallback() {
        let page = crate::html::parse_html(
            r#"<article><div role="toolbar">Share</div><h3>Note</h3><p>Body</p></article>"#,
        );
        let converter = MarkdownConverter::new();
        let message = converter.messages(&page).unwrap()[0];
        // no content root: the whole article is converted
        assert_eq!(converter.convert_message(message).unwrap(), "### Note\n\nBody");
    }
}
