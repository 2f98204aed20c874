//! HTML parsing support.
//!
//! Converts HTML strings into the CDP-style Node structure. Used for
//! adapter fallbacks that hand back serialized HTML, and for fixtures.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a Node tree rooted at an `html` element.
///
/// # Example
///
/// ```rust
/// use chatdown::{parse_html, MarkdownConverter};
///
/// let node = parse_html("<h1>Hello <em>World</em></h1>");
/// let markdown = MarkdownConverter::new().parse(&node).unwrap();
/// assert_eq!(markdown, "# Hello *World*");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    scraper_to_node(document.root_element())
}

/// Parse a complete HTML document into a document node.
pub fn parse_document(html: &str) -> Node {
    let document = Html::parse_document(html);
    let mut root = Node::document();
    root.add_child(scraper_to_node(document.root_element()));
    root
}

/// Convert a scraper ElementRef to our Node structure
fn scraper_to_node(element: ElementRef) -> Node {
    let tag = element.value().name();

    // Collect attributes
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    let mut node = Node::element_with_attrs(tag, attrs);

    // Process children
    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                node.add_child(Node::text(&text.text));
            }
            ScraperNode::Comment(comment) => {
                node.add_child(Node::comment(&comment.comment));
            }
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    node.add_child(scraper_to_node(child_element));
                }
            }
            _ => {}
        }
    }

    node
}
