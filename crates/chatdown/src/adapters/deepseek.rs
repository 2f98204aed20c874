//! Deepseek (chat.deepseek.com) adapter.

use once_cell::sync::Lazy;

use super::{host_matches, SiteAdapter};
use crate::node::{Node, NodeRef};
use crate::normalize::{label_language, wrap_bare_code_blocks};
use crate::selector::Selector;

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        ".ds-think-content, .md-code-block-banner-wrap, .md-code-block-banner, \
         .md-code-block-action, .ds-message-feedback-container",
    )
    .expect("hardcoded selector is valid")
});

/// Extracts answers from Deepseek conversations.
pub struct DeepseekAdapter;

impl SiteAdapter for DeepseekAdapter {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn matches_host(&self, host: &str) -> bool {
        host_matches(host, "deepseek.com")
    }

    fn message_selector(&self) -> &str {
        ".ds-message"
    }

    fn message_content_selector(&self) -> &str {
        ".ds-message > .ds-markdown"
    }

    fn copy_button_selector(&self) -> &str {
        ".ds-icon-button"
    }

    fn is_noise_node(&self, node: &NodeRef<'_, '_>) -> bool {
        NOISE.matches(node)
    }

    fn normalize_dom(&self, element: &mut Node) {
        wrap_bare_code_blocks(
            element,
            |n| n.has_class("md-code-block-banner-wrap") || n.has_class("md-code-block-banner"),
            label_language,
        );
    }

    /// User turns carry no `.ds-markdown`; they convert to nothing.
    fn extract_message_html(&self, _element: &Node) -> String {
        String::new()
    }
}
