//! Site adapters: the per-platform knowledge the converter and the
//! streaming detector need.
//!
//! An adapter names the selectors for assistant messages, their Markdown
//! content root and the copy button, classifies site-specific noise, and can
//! normalize a detached message before conversion.

mod chatgpt;
mod claude;
mod deepseek;
mod gemini;
mod generic;

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::node::{Node, NodeRef};
use crate::rules::Rule;

pub use chatgpt::ChatGptAdapter;
pub use claude::ClaudeAdapter;
pub use deepseek::DeepseekAdapter;
pub use gemini::GeminiAdapter;
pub use generic::GenericAdapter;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Per-site capabilities.
///
/// Adapters are tried in priority order; `GenericAdapter` is the always-last
/// fallback.
pub trait SiteAdapter: Send + Sync {
    /// Short lowercase name, also used in configuration
    fn name(&self) -> &str;

    /// Does this adapter handle pages served from `host`?
    fn matches_host(&self, host: &str) -> bool;

    /// CSS selector of assistant message containers
    fn message_selector(&self) -> &str;

    /// CSS selector of the Markdown-bearing root inside a message
    fn message_content_selector(&self) -> &str;

    /// CSS selector of the per-message copy button. A new one appears when
    /// an answer has finished streaming.
    fn copy_button_selector(&self) -> &str;

    /// Site-specific noise (toolbars, banners, reasoning panels)
    fn is_noise_node(&self, _node: &NodeRef<'_, '_>) -> bool {
        false
    }

    /// Rewrite a detached message before conversion
    fn normalize_dom(&self, _element: &mut Node) {}

    /// Fallback HTML when the content selector finds nothing
    fn extract_message_html(&self, element: &Node) -> String {
        element.inner_html()
    }

    /// Extra rules, consulted before the built-in ones
    fn rules(&self) -> Vec<Rule> {
        Vec::new()
    }
}

/// Does `host` equal `domain` or sit below it?
pub(crate) fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered adapters in priority order.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
}

impl AdapterRegistry {
    /// Create a registry with all built-in adapters (platform-specific first, generic last).
    pub fn new() -> Self {
        Self {
            adapters: vec![
                Arc::new(ChatGptAdapter),
                Arc::new(GeminiAdapter),
                Arc::new(ClaudeAdapter),
                Arc::new(DeepseekAdapter),
                Arc::new(GenericAdapter),
            ],
        }
    }

    /// Register an adapter ahead of the built-in ones
    pub fn register(&mut self, adapter: Arc<dyn SiteAdapter>) {
        self.adapters.insert(0, adapter);
    }

    /// Detect the adapter for a page URL.
    /// Always returns an adapter (the generic one is the fallback).
    pub fn detect(&self, url: &Url) -> Arc<dyn SiteAdapter> {
        let host = url.host_str().unwrap_or("");
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.matches_host(host))
            .cloned()
            .unwrap_or_else(|| self.fallback());
        debug!(host, adapter = adapter.name(), "detected site adapter");
        adapter
    }

    /// Look an adapter up by name (case-insensitive)
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn SiteAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(name.trim()))
            .cloned()
    }

    /// The lowest-priority adapter
    pub fn fallback(&self) -> Arc<dyn SiteAdapter> {
        self.adapters
            .last()
            .cloned()
            .unwrap_or_else(|| Arc::new(GenericAdapter))
    }

    /// Names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
