//! Claude (claude.ai) adapter.

use once_cell::sync::Lazy;

use super::{host_matches, SiteAdapter};
use crate::node::{Node, NodeRef};
use crate::normalize::{label_language, wrap_bare_code_blocks};
use crate::selector::Selector;

/// Language label rendered above code blocks
static CODE_LABEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.text-text-500.text-xs, div.text-text-300.text-xs")
        .expect("hardcoded selector is valid")
});

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        ".sr-only, div.text-text-500.text-xs, div.text-text-300.text-xs, \
         [data-testid=\"action-bar-copy\"]",
    )
    .expect("hardcoded selector is valid")
});

/// Extracts assistant turns from Claude conversations.
pub struct ClaudeAdapter;

impl SiteAdapter for ClaudeAdapter {
    fn name(&self) -> &str {
        "claude"
    }

    fn matches_host(&self, host: &str) -> bool {
        host_matches(host, "claude.ai")
    }

    fn message_selector(&self) -> &str {
        "[data-is-streaming]"
    }

    fn message_content_selector(&self) -> &str {
        ".font-claude-message, .font-claude-response"
    }

    fn copy_button_selector(&self) -> &str {
        r#"button[data-testid="action-bar-copy"]"#
    }

    fn is_noise_node(&self, node: &NodeRef<'_, '_>) -> bool {
        NOISE.matches(node)
    }

    fn normalize_dom(&self, element: &mut Node) {
        wrap_bare_code_blocks(element, |n| CODE_LABEL.matches_node(n), label_language);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{MarkdownConverter, Options};

    #[test]
    fn test_code_label_is_not_content() {
        let html = r#"<div data-is-streaming="false"><div class="font-claude-message">
            <p>Try this:</p>
            <div class="relative flex flex-col">
              <div class="text-text-500 text-xs p-3.5">bash</div>
              <div><pre class="code-block__code"><code>ls -la</code></pre></div>
            </div></div></div>"#;
        let page = crate::html::parse_html(html);
        let converter = MarkdownConverter::for_adapter(Arc::new(ClaudeAdapter), Options::default());

        // converted in place, the label is noise
        assert_eq!(
            converter.parse(&page).unwrap(),
            "Try this:\n\n```\nls -la\n```"
        );

        // as a message, normalization moves it onto the code block
        let message = converter.messages(&page).unwrap()[0];
        assert_eq!(
            converter.convert_message(message).unwrap(),
            "Try this:\n\n```bash\nls -la\n```"
        );
    }
}
