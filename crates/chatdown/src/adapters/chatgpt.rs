//! ChatGPT (chatgpt.com) adapter.

use once_cell::sync::Lazy;

use super::{host_matches, SiteAdapter};
use crate::node::{Node, NodeRef};
use crate::normalize::{label_language, wrap_bare_code_blocks};
use crate::selector::Selector;

/// Header bar of a code block: language label plus copy button
static CODE_HEADER: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.items-center.justify-between").expect("hardcoded selector is valid")
});

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".sr-only, pre div.sticky, pre div.items-center.justify-between")
        .expect("hardcoded selector is valid")
});

/// Extracts assistant turns from ChatGPT conversations.
pub struct ChatGptAdapter;

impl SiteAdapter for ChatGptAdapter {
    fn name(&self) -> &str {
        "chatgpt"
    }

    fn matches_host(&self, host: &str) -> bool {
        host_matches(host, "chatgpt.com") || host_matches(host, "chat.openai.com")
    }

    fn message_selector(&self) -> &str {
        r#"[data-message-author-role="assistant"]"#
    }

    fn message_content_selector(&self) -> &str {
        ".markdown"
    }

    fn copy_button_selector(&self) -> &str {
        r#"button[data-testid="copy-turn-action-button"]"#
    }

    fn is_noise_node(&self, node: &NodeRef<'_, '_>) -> bool {
        NOISE.matches(node)
    }

    fn normalize_dom(&self, element: &mut Node) {
        wrap_bare_code_blocks(element, |n| CODE_HEADER.matches_node(n), label_language);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{MarkdownConverter, Options};

    #[test]
    fn test_code_block_header_supplies_language() {
        let html = r#"<div data-message-author-role="assistant"><div class="markdown prose">
            <pre class="!overflow-visible"><div class="contain-inline-size rounded-md">
              <div class="flex items-center text-xs justify-between">python</div>
              <div class="sticky top-9"><div><button aria-label="Copy">Copy code</button></div></div>
              <div class="overflow-y-auto p-4"><code class="!whitespace-pre hljs">print("hi")</code></div>
            </div></pre></div></div>"#;
        let page = crate::html::parse_html(html);
        let converter = MarkdownConverter::for_adapter(Arc::new(ChatGptAdapter), Options::default());
        let message = converter.messages(&page).unwrap()[0];
        assert_eq!(
            converter.convert_message(message).unwrap(),
            "```python\nprint(\"hi\")\n```"
        );
    }

    #[test]
    fn test_copy_button_selector() {
        let page = crate::html::parse_html(
            r#"<button data-testid="copy-turn-action-button"></button><button data-testid="other"></button>"#,
        );
        let selector = Selector::parse(ChatGptAdapter.copy_button_selector()).unwrap();
        assert_eq!(page.select(&selector).len(), 1);
    }
}
