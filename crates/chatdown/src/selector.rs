//! CSS selectors over [`Node`] trees.
//!
//! Site adapters describe message containers, copy buttons and chrome with CSS
//! selectors. Parsing and matching go through the `selectors` crate with
//! scraper's selector implementation; [`NodeRef`] supplies the element view
//! (ancestry and siblings) the matcher walks.
//!
//! `:has()` is not accepted: a `NodeRef` only knows its ancestors, so
//! descendants cannot be matched relative to it.

use scraper::error::SelectorErrorKind;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    self, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, QuirksMode, SelectorCaches,
};
use selectors::parser::{self, ParseRelative, SelectorImpl, SelectorList, SelectorParseErrorKind};
use selectors::{Element, OpaqueElement};

use crate::node::{Node, NodeRef, NodeType};
use crate::{ChatdownError, Result};

/// A parsed selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    selectors: SelectorList<Simple>,
}

/// Selector grammar accepted by adapters: scraper's, minus `:has()`
#[derive(Debug, Clone, Copy)]
struct SelectorParser;

impl<'i> parser::Parser<'i> for SelectorParser {
    type Impl = Simple;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_is_and_where(&self) -> bool {
        true
    }
}

impl Selector {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self> {
        let mut input = cssparser::ParserInput::new(source);
        let mut css = cssparser::Parser::new(&mut input);
        let selectors = SelectorList::parse(&SelectorParser, &mut css, ParseRelative::No)
            .map_err(|e| ChatdownError::InvalidSelector {
                selector: source.to_string(),
                reason: SelectorErrorKind::from(e).to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            selectors,
        })
    }

    /// The selector text this was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does the element satisfy any alternative of this selector list?
    pub fn matches(&self, node: &NodeRef<'_, '_>) -> bool {
        if !node.is_element() {
            return false;
        }

        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        self.selectors
            .slice()
            .iter()
            .any(|s| matching::matches_selector(s, 0, None, node, &mut context))
    }

    /// Match against a bare node, ignoring ancestry. Selectors with
    /// combinators never match here.
    pub fn matches_node(&self, node: &Node) -> bool {
        self.matches(&NodeRef::new(node))
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = ChatdownError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl<'a, 'p> NodeRef<'a, 'p> {
    /// Sibling element at the first index yielded by `indices`
    fn sibling_element(&self, mut indices: impl Iterator<Item = usize>) -> Option<Self> {
        let parent = self.parent()?;
        let siblings: Vec<&'a Node> = parent.node.children().collect();
        indices
            .find(|&i| siblings.get(i).is_some_and(|n| n.is_element()))
            .map(|i| NodeRef::with_parent(siblings[i], Some(parent), i))
    }
}

/// Note: never matches non-tree-structural pseudo-classes.
impl Element for NodeRef<'_, '_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.node)
    }

    fn parent_element(&self) -> Option<Self> {
        self.parent().filter(|p| p.is_element()).copied()
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element((0..self.index()).rev())
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(self.index() + 1..)
    }

    // Only reached through `:has()`, which the parser rejects.
    fn first_element_child(&self) -> Option<Self> {
        self.node
            .children()
            .enumerate()
            .find(|(_, c)| c.is_element())
            .map(|(i, c)| NodeRef::with_parent(c, None, i))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.node.tag_name() == *name.0
    }

    fn has_namespace(&self, _ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        false
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.node.tag_name() == other.node.tag_name()
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if matches!(*ns, NamespaceConstraint::Specific(url) if !url.is_empty()) {
            return false;
        }
        self.node
            .attr(&local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.node.is_tag("a") && self.node.has_attr("href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.node
            .attr("id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.node.attr("class").is_some_and(|classes| {
            classes
                .split_ascii_whitespace()
                .any(|c| case_sensitivity.eq(name.0.as_bytes(), c.as_bytes()))
        })
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.node.children().any(|c| {
            c.is_element() || (c.is_text() && c.node_value.as_deref().is_some_and(|t| !t.is_empty()))
        })
    }

    fn is_root(&self) -> bool {
        self.parent()
            .is_some_and(|p| p.node.node_type == NodeType::Document)
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}
