//! Rule and Filter types for HTML conversion.

use crate::context::ConversionContext;
use crate::node::NodeRef;

/// Type alias for replacement functions
pub type ReplacementFn =
    Box<dyn Fn(&NodeRef<'_, '_>, &str, &mut ConversionContext<'_>) -> String + Send + Sync>;

/// Type alias for filter predicates
pub type PredicateFn = Box<dyn Fn(&NodeRef<'_, '_>, &ConversionContext<'_>) -> bool + Send + Sync>;

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match elements carrying any of these classes
    Classes(Vec<String>),
    /// Match using a predicate function
    Predicate(PredicateFn),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter for elements with any of the given classes
    pub fn classes(names: &[&str]) -> Self {
        Filter::Classes(names.iter().map(|s| s.to_string()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&NodeRef<'_, '_>, &ConversionContext<'_>) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches an element
    pub fn matches(&self, node: &NodeRef<'_, '_>, ctx: &ConversionContext<'_>) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Filter::TagName(t) => node.is_tag(t),
            Filter::TagNames(tags) => tags.iter().any(|t| node.is_tag(t)),
            Filter::Classes(classes) => classes.iter().any(|c| node.has_class(c)),
            Filter::Predicate(f) => f(node, ctx),
        }
    }
}

/// What the converter does with a matched element's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Convert the children first and pass their Markdown to the replacement.
    RecurseIntoChildren,
    /// Do not descend. The replacement receives the element's raw text with
    /// noise removed, unescaped (code blocks, inline code).
    SkipChildren,
    /// Do not descend. The replacement receives no content and produces the
    /// final text itself (images, math, tables).
    Replace,
}

/// A rule defines how to convert a matched HTML element to Markdown
pub struct Rule {
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// How children are handled before the replacement runs
    pub traversal: Traversal,
    /// Replacement function that generates Markdown
    replacement: ReplacementFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, traversal: Traversal, replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_, '_>, &str, &mut ConversionContext<'_>) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            traversal,
            replacement: Box::new(replacement),
        }
    }

    /// Create a recursing rule that matches a single tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_, '_>, &str, &mut ConversionContext<'_>) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), Traversal::RecurseIntoChildren, replacement)
    }

    /// Create a recursing rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_, '_>, &str, &mut ConversionContext<'_>) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), Traversal::RecurseIntoChildren, replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(
        &self,
        node: &NodeRef<'_, '_>,
        content: &str,
        ctx: &mut ConversionContext<'_>,
    ) -> String {
        (self.replacement)(node, content, ctx)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("traversal", &self.traversal)
            .finish_non_exhaustive()
    }
}
