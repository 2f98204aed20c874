//! Noise classification.
//!
//! Page chrome (buttons, scripts, icons, hidden elements) and site-specific
//! furniture (copy toolbars, code banners, "thinking" panels) must never
//! reach the Markdown output. The converter asks the filter before rule
//! matching, and a noisy element is dropped together with its subtree.

use std::sync::Arc;

use crate::adapters::SiteAdapter;
use crate::node::{Node, NodeRef};
use crate::utilities::is_chrome;

/// Intrinsic noise plus the adapter's own classification
#[derive(Clone)]
pub struct NoiseFilter {
    adapter: Arc<dyn SiteAdapter>,
}

impl NoiseFilter {
    pub fn new(adapter: Arc<dyn SiteAdapter>) -> Self {
        Self { adapter }
    }

    /// Should this element and its subtree be excluded?
    pub fn is_noise(&self, node: &NodeRef<'_, '_>) -> bool {
        node.is_element() && (is_intrinsic_noise(node.node) || self.adapter.is_noise_node(node))
    }
}

impl std::fmt::Debug for NoiseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseFilter")
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Elements that are noise on every site
pub fn is_intrinsic_noise(node: &Node) -> bool {
    node.is_element() && (is_chrome(&node.tag_name()) || node.has_attr("hidden"))
}
