//! CDP-style DOM Node structure for HTML to Markdown conversion.
//!
//! The tree mirrors the Chrome DevTools Protocol `DOM.Node` shape so a content
//! script bridge, a CDP session or an HTML parser can all hand the converter
//! the same structure. The converter only ever borrows a tree; normalization
//! is the one pass that mutates it.

use crate::selector::Selector;

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Comment node (nodeType = 8)
    Comment = 8,
    /// Document node (nodeType = 9)
    Document = 9,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

/// A DOM node following the CDP DOM.Node structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node type (1 = Element, 3 = Text, etc.)
    pub node_type: NodeType,

    /// Node name (uppercase for elements, e.g., "DIV", "#text" for text nodes)
    pub node_name: String,

    /// Text content for text and comment nodes
    pub node_value: Option<String>,

    /// Attributes as flat array [name, value, name, value, ...] (CDP style)
    /// Only present for element nodes
    pub attributes: Option<Vec<String>>,

    /// Child nodes
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: tag_name.to_uppercase(),
            node_value: None,
            attributes: Some(Vec::new()),
            children: Some(Vec::new()),
        }
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let flat_attrs: Vec<String> = attrs
            .into_iter()
            .flat_map(|(k, v)| [k.to_string(), v.to_string()])
            .collect();

        Self {
            attributes: Some(flat_attrs),
            ..Self::element(tag_name)
        }
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: "#text".to_string(),
            node_value: Some(content.to_string()),
            attributes: None,
            children: None,
        }
    }

    /// Create a new comment node
    pub fn comment(content: &str) -> Self {
        Self {
            node_type: NodeType::Comment,
            node_name: "#comment".to_string(),
            node_value: Some(content.to_string()),
            attributes: None,
            children: None,
        }
    }

    /// Create a document node
    pub fn document() -> Self {
        Self {
            node_type: NodeType::Document,
            node_name: "#document".to_string(),
            node_value: None,
            attributes: None,
            children: Some(Vec::new()),
        }
    }

    /// Create a document fragment node
    pub fn document_fragment() -> Self {
        Self {
            node_type: NodeType::DocumentFragment,
            node_name: "#document-fragment".to_string(),
            node_value: None,
            attributes: None,
            children: Some(Vec::new()),
        }
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Node) -> Self {
        self.add_child(child);
        self
    }

    /// Builder-style text child append
    pub fn with_text(self, content: &str) -> Self {
        self.with_child(Node::text(content))
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Check if this is a comment node
    pub fn is_comment(&self) -> bool {
        self.node_type == NodeType::Comment
    }

    /// Get the tag name (lowercase)
    pub fn tag_name(&self) -> String {
        self.node_name.to_lowercase()
    }

    /// Case-insensitive tag comparison for element nodes
    pub fn is_tag(&self, name: &str) -> bool {
        self.is_element() && self.node_name.eq_ignore_ascii_case(name)
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        let attrs = self.attributes.as_ref()?;

        // CDP stores attributes as flat array: [name, value, name, value, ...]
        attrs
            .chunks_exact(2)
            .find(|pair| pair[0].eq_ignore_ascii_case(name))
            .map(|pair| pair[1].as_str())
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Whitespace-separated class names
    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Check for a class name
    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    /// Add a class name if missing
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attr("class", &classes);
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().flat_map(|c| c.iter())
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|n| n.is_element())
    }

    /// Mutable child list, created on demand
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        self.children.get_or_insert_with(Vec::new)
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children_mut().push(child);
    }

    /// Detach and return all children
    pub fn take_children(&mut self) -> Vec<Node> {
        self.children.take().unwrap_or_default()
    }

    /// Detach the child at `index`, if any
    pub fn remove_child(&mut self, index: usize) -> Option<Node> {
        let children = self.children.as_mut()?;
        (index < children.len()).then(|| children.remove(index))
    }

    /// Set an attribute
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let attrs = self.attributes.get_or_insert_with(Vec::new);

        for pair in attrs.chunks_exact_mut(2) {
            if pair[0].eq_ignore_ascii_case(name) {
                pair[1] = value.to_string();
                return;
            }
        }
        attrs.push(name.to_string());
        attrs.push(value.to_string());
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.node_type {
            NodeType::Text => out.push_str(self.node_value.as_deref().unwrap_or("")),
            NodeType::Comment => {}
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Does this node or any descendant satisfy the predicate?
    pub fn contains(&self, predicate: &dyn Fn(&Node) -> bool) -> bool {
        predicate(self) || self.children().any(|c| c.contains(predicate))
    }

    /// Number of nodes in this subtree, including this one
    pub fn subtree_size(&self) -> usize {
        1 + self.children().map(Node::subtree_size).sum::<usize>()
    }

    /// All elements in this subtree (excluding this node) matching the selector,
    /// in document order.
    pub fn select(&self, selector: &Selector) -> Vec<&Node> {
        let mut found = Vec::new();
        NodeRef::new(self).select_into(selector, &mut found);
        found
    }

    /// First element in this subtree (excluding this node) matching the selector
    pub fn select_first(&self, selector: &Selector) -> Option<&Node> {
        self.select(selector).into_iter().next()
    }

    /// Reconstruct outer HTML
    pub fn outer_html(&self) -> String {
        match self.node_type {
            NodeType::Text => escape_html_text(self.node_value.as_deref().unwrap_or("")),
            NodeType::Comment => format!("<!--{}-->", self.node_value.as_deref().unwrap_or("")),
            NodeType::Element => {
                let tag = self.tag_name();
                let attrs = self.attributes_string();
                let open = if attrs.is_empty() {
                    format!("<{}>", tag)
                } else {
                    format!("<{} {}>", tag, attrs)
                };

                if crate::utilities::is_void(&tag) {
                    open
                } else {
                    format!("{}{}</{}>", open, self.inner_html(), tag)
                }
            }
            _ => self.inner_html(),
        }
    }

    /// Reconstruct inner HTML
    pub fn inner_html(&self) -> String {
        self.children().map(Node::outer_html).collect()
    }

    /// Get attributes as a string for HTML output
    fn attributes_string(&self) -> String {
        let Some(ref attrs) = self.attributes else {
            return String::new();
        };

        attrs
            .chunks_exact(2)
            .map(|pair| {
                if pair[1].is_empty() {
                    pair[0].clone()
                } else {
                    format!("{}=\"{}\"", pair[0], escape_html_attr(&pair[1]))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Escape HTML attribute value
fn escape_html_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape HTML text content
fn escape_html_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A borrowed node together with its ancestry.
///
/// `NodeRef` links to the `NodeRef` of its parent on the traversal stack, so
/// rules and selectors can look upward and at siblings without the tree
/// storing parent pointers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a, 'p> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'p NodeRef<'a, 'p>>,
    index: usize,
}

impl<'a, 'p> NodeRef<'a, 'p> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
        }
    }

    /// Reference to `node` at position `index` below `parent`
    pub(crate) fn with_parent(
        node: &'a Node,
        parent: Option<&'p NodeRef<'a, 'p>>,
        index: usize,
    ) -> Self {
        Self {
            node,
            parent,
            index,
        }
    }

    /// Reference to the child `node`, found at position `index` of this node
    pub fn child<'q>(&'q self, node: &'a Node, index: usize) -> NodeRef<'a, 'q> {
        NodeRef {
            node,
            parent: Some(self),
            index,
        }
    }

    /// Iterate children with ancestry attached
    pub fn children<'q>(&'q self) -> impl Iterator<Item = NodeRef<'a, 'q>> + 'q {
        let this: &'q NodeRef<'a, 'q> = self;
        this.node
            .children()
            .enumerate()
            .map(move |(i, c)| this.child(c, i))
    }

    /// The parent reference, if this node was reached through traversal
    pub fn parent(&self) -> Option<&'p NodeRef<'a, 'p>> {
        self.parent
    }

    /// Get the parent tag name if known
    pub fn parent_tag(&self) -> Option<String> {
        self.parent.map(|p| p.tag_name())
    }

    /// Position among all of the parent's children
    pub fn index(&self) -> usize {
        self.index
    }

    /// Ancestors from the parent up to the traversal root
    pub fn ancestors(&self) -> impl Iterator<Item = &'p NodeRef<'a, 'p>> {
        std::iter::successors(self.parent, |p| p.parent)
    }

    /// Does any ancestor satisfy the predicate?
    pub fn has_ancestor(&self, predicate: impl Fn(&Node) -> bool) -> bool {
        self.ancestors().any(|a| predicate(a.node))
    }

    /// Siblings that come before this node
    pub fn preceding_siblings(&self) -> impl Iterator<Item = &'a Node> {
        let parent = self.parent.map(|p| p.node);
        let index = self.index;
        parent
            .into_iter()
            .flat_map(move |p| p.children().take(index))
    }

    /// The sibling directly before this node
    pub fn previous_sibling(&self) -> Option<&'a Node> {
        self.preceding_siblings().last()
    }

    /// The sibling directly after this node
    pub fn next_sibling(&self) -> Option<&'a Node> {
        self.parent?.node.children().nth(self.index + 1)
    }

    /// Is this the last element child of its parent?
    pub fn is_last_element_child(&self) -> bool {
        match self.parent {
            Some(p) => p
                .node
                .children()
                .skip(self.index + 1)
                .all(|n| !n.is_element()),
            None => true,
        }
    }

    fn select_into(&self, selector: &Selector, found: &mut Vec<&'a Node>) {
        for child in self.children() {
            if child.is_element() {
                if selector.matches(&child) {
                    found.push(child.node);
                }
                child.select_into(selector, found);
            }
        }
    }

    /// Delegate to Node methods
    pub fn is_element(&self) -> bool {
        self.node.is_element()
    }

    pub fn is_text(&self) -> bool {
        self.node.is_text()
    }

    pub fn tag_name(&self) -> String {
        self.node.tag_name()
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.node.is_tag(name)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.has_class(class)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.element_children()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element() {
        let node = Node::element("div");
        assert!(node.is_element());
        assert_eq!(node.tag_name(), "div");
        assert_eq!(node.node_name, "DIV");
        assert!(node.is_tag("DIV"));
    }

    #[test]
    fn test_create_text() {
        let node = Node::text("Hello World");
        assert!(node.is_text());
        assert_eq!(node.text_content(), "Hello World");
    }

    #[test]
    fn test_attributes() {
        let mut node =
            Node::element_with_attrs("a", vec![("href", "https://example.com"), ("title", "Example")]);
        assert_eq!(node.attr("href"), Some("https://example.com"));
        assert_eq!(node.attr("TITLE"), Some("Example"));
        assert_eq!(node.attr("class"), None);

        node.set_attr("title", "Changed");
        assert_eq!(node.attr("title"), Some("Changed"));
    }

    #[test]
    fn test_classes() {
        let mut node = Node::element_with_attrs("span", vec![("class", "katex  katex-display")]);
        assert!(node.has_class("katex-display"));
        assert!(!node.has_class("kat"));

        node.add_class("language-rust");
        node.add_class("language-rust");
        assert_eq!(node.attr("class"), Some("katex  katex-display language-rust"));
    }

    #[test]
    fn test_children() {
        let parent = Node::element("div")
            .with_text("Hello")
            .with_child(Node::element("span"))
            .with_child(Node::comment("note"))
            .with_text("World");

        assert_eq!(parent.children().count(), 4);
        assert_eq!(parent.element_children().count(), 1);
        assert_eq!(parent.text_content(), "HelloWorld");
        assert_eq!(parent.subtree_size(), 5);
    }

    #[test]
    fn test_remove_and_take_children() {
        let mut parent = Node::element("div").with_text("a").with_text("b");
        assert_eq!(parent.remove_child(0), Some(Node::text("a")));
        assert_eq!(parent.remove_child(5), None);
        assert_eq!(parent.take_children(), vec![Node::text("b")]);
        assert_eq!(parent.children().count(), 0);
    }

    #[test]
    fn test_outer_html() {
        let a = Node::element_with_attrs("a", vec![("href", "https://example.com?a=1&b=2")])
            .with_text("1 < 2");

        assert_eq!(
            a.outer_html(),
            "<a href=\"https://example.com?a=1&amp;b=2\">1 &lt; 2</a>"
        );
    }

    #[test]
    fn test_void_element_html() {
        let img = Node::element_with_attrs("img", vec![("src", "test.png"), ("alt", "Test")]);
        assert_eq!(img.outer_html(), "<img src=\"test.png\" alt=\"Test\">");
    }

    #[test]
    fn test_node_ref_navigation() {
        let list = Node::element("ul")
            .with_text("\n")
            .with_child(Node::element("li").with_text("A"))
            .with_child(Node::element("li").with_text("B"))
            .with_text("\n");

        let root = NodeRef::new(&list);
        let items: Vec<_> = root.children().filter(|c| c.is_element()).collect();

        assert_eq!(items[1].index(), 2);
        assert_eq!(items[1].parent_tag().as_deref(), Some("ul"));
        assert_eq!(
            items[1].preceding_siblings().filter(|n| n.is_tag("li")).count(),
            1
        );
        assert!(items[1].is_last_element_child());
        assert!(!items[0].is_last_element_child());
        assert!(items[0].has_ancestor(|n| n.is_tag("ul")));
        assert_eq!(items[0].next_sibling().map(|n| n.tag_name()).as_deref(), Some("li"));
    }
}
