//! Gemini (gemini.google.com) adapter.

use once_cell::sync::Lazy;

use super::{host_matches, SiteAdapter};
use crate::node::{Node, NodeRef};
use crate::normalize::{label_language, wrap_bare_code_blocks};
use crate::rules::{Filter, Rule, Traversal};
use crate::selector::Selector;

static NOISE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        ".code-block-decoration, model-thoughts, .thoughts-container, mat-icon, \
         sources-carousel-inline, .export-sheets-button-container, .table-footer",
    )
    .expect("hardcoded selector is valid")
});

/// Extracts model responses from Gemini conversations.
pub struct GeminiAdapter;

impl SiteAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    fn matches_host(&self, host: &str) -> bool {
        host_matches(host, "gemini.google.com") || host_matches(host, "bard.google.com")
    }

    fn message_selector(&self) -> &str {
        "model-response"
    }

    fn message_content_selector(&self) -> &str {
        "message-content .markdown"
    }

    fn copy_button_selector(&self) -> &str {
        r#"copy-button button, button[data-test-id="copy-button"]"#
    }

    fn is_noise_node(&self, node: &NodeRef<'_, '_>) -> bool {
        NOISE.matches(node)
    }

    fn normalize_dom(&self, element: &mut Node) {
        wrap_bare_code_blocks(
            element,
            |n| n.has_class("code-block-decoration"),
            label_language,
        );
    }

    fn rules(&self) -> Vec<Rule> {
        vec![source_citation_rule()]
    }
}

/// Inline source citations (`<sup data-turn-source-index="2">`) become `[2]`
fn source_citation_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.is_tag("sup") && node.has_attr("data-turn-source-index")),
        Traversal::Replace,
        |node, _, _| match node.attr("data-turn-source-index").map(str::trim) {
            Some(index) if !index.is_empty() => format!("[{}]", index),
            _ => String::new(),
        },
    )
}
