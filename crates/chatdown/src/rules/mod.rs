//! Rule system for HTML to Markdown conversion.

mod builtin;
mod rule;

pub use builtin::builtin_rules;
pub use rule::{Filter, PredicateFn, ReplacementFn, Rule, Traversal};

use indexmap::IndexMap;

use crate::context::ConversionContext;
use crate::node::NodeRef;

/// Ordered rule table of a converter
pub struct Rules {
    /// Custom rules added by the user (checked first)
    custom_rules: IndexMap<String, Rule>,
    /// Rules contributed by the site adapter
    site_rules: Vec<Rule>,
    /// Remove rules (drop the element and its subtree)
    remove_rules: Vec<Filter>,
    /// Built-in rules
    builtin_rules: Vec<Rule>,
}

impl Rules {
    /// Create a new Rules instance with only the built-in rules
    pub fn new() -> Self {
        Self::with_site_rules(Vec::new())
    }

    /// Built-in rules preceded by the rules of a site adapter
    pub fn with_site_rules(site_rules: Vec<Rule>) -> Self {
        Self {
            custom_rules: IndexMap::new(),
            site_rules,
            remove_rules: Vec::new(),
            builtin_rules: builtin_rules(),
        }
    }

    /// Add a custom rule. A rule with the same key is replaced in place.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Add a remove filter
    pub fn remove(&mut self, filter: Filter) {
        self.remove_rules.push(filter);
    }

    /// Find the first rule matching a node: custom, then site, then built-in
    pub fn for_node<'r>(
        &'r self,
        node: &NodeRef<'_, '_>,
        ctx: &ConversionContext<'_>,
    ) -> Option<&'r Rule> {
        self.custom_rules
            .values()
            .chain(&self.site_rules)
            .chain(&self.builtin_rules)
            .find(|rule| rule.filter.matches(node, ctx))
    }

    /// Check if a node matches a remove filter
    pub fn should_remove(&self, node: &NodeRef<'_, '_>, ctx: &ConversionContext<'_>) -> bool {
        self.remove_rules.iter().any(|f| f.matches(node, ctx))
    }

    /// Total number of rules consulted for each element
    pub fn len(&self) -> usize {
        self.custom_rules.len() + self.site_rules.len() + self.builtin_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rules")
            .field("custom", &self.custom_rules.keys().collect::<Vec<_>>())
            .field("site", &self.site_rules.len())
            .field("remove", &self.remove_rules.len())
            .field("builtin", &self.builtin_rules.len())
            .finish()
    }
}
