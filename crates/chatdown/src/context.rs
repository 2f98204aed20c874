//! Per-conversion state handed to rule replacements.

use chatdown_core::Options;

use crate::adapters::SiteAdapter;
use crate::converter::MarkdownConverter;
use crate::math;
use crate::node::{NodeRef, NodeType};

/// Traversal state for one `parse` call.
///
/// Rules read the options and adapter through it and call back into the
/// converter with [`convert_children`](Self::convert_children) when they
/// build their output from selected children (tables).
pub struct ConversionContext<'a> {
    converter: &'a MarkdownConverter,
    /// Number of enclosing `ul`/`ol` elements
    pub list_depth: usize,
    /// Number of enclosing `blockquote` elements
    pub blockquote_depth: usize,
    /// Text is emitted verbatim while set
    pub in_code_block: bool,
    /// Inside a table cell: line breaks become spaces
    pub in_table: bool,
}

/// Saved traversal state, restored when an element has been converted
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    list_depth: usize,
    blockquote_depth: usize,
    in_code_block: bool,
    in_table: bool,
}

impl<'a> ConversionContext<'a> {
    pub(crate) fn new(converter: &'a MarkdownConverter) -> Self {
        Self {
            converter,
            list_depth: 0,
            blockquote_depth: 0,
            in_code_block: false,
            in_table: false,
        }
    }

    pub fn options(&self) -> &'a Options {
        self.converter.options()
    }

    pub fn adapter(&self) -> &'a dyn SiteAdapter {
        self.converter.adapter().as_ref()
    }

    /// Is this element excluded from the output?
    pub fn is_noise(&self, node: &NodeRef<'_, '_>) -> bool {
        self.converter.is_noise(node, self)
    }

    /// Convert the children of `node` to Markdown with the current state.
    pub fn convert_children(&mut self, node: &NodeRef<'_, '_>) -> String {
        let converter = self.converter;
        converter.convert_children(node, self)
    }

    /// The text a reader sees: text descendants outside noise subtrees, with
    /// `<br>` as a newline. Nothing is escaped.
    pub fn visible_text(&self, node: &NodeRef<'_, '_>) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: &NodeRef<'_, '_>, out: &mut String) {
        for child in node.children() {
            match child.node.node_type {
                NodeType::Text => out.push_str(child.node.node_value.as_deref().unwrap_or("")),
                NodeType::Element if child.is_tag("br") => out.push('\n'),
                NodeType::Element if !self.is_noise(&child) => self.collect_text(&child, out),
                _ => {}
            }
        }
    }

    /// LaTeX source of a rendered formula, honouring the fallback threshold
    pub fn latex(&self, node: &NodeRef<'_, '_>) -> Option<String> {
        math::extract_latex(node.node, self.options().math_fallback_max_chars)
    }

    /// Enter `node`, updating the traversal state for its children.
    pub(crate) fn enter(&mut self, node: &NodeRef<'_, '_>) -> Frame {
        let frame = Frame {
            list_depth: self.list_depth,
            blockquote_depth: self.blockquote_depth,
            in_code_block: self.in_code_block,
            in_table: self.in_table,
        };

        if node.is_element() {
            match node.tag_name().as_str() {
                "ul" | "ol" => self.list_depth += 1,
                "blockquote" => self.blockquote_depth += 1,
                "pre" | "code" => self.in_code_block = true,
                "table" => self.in_table = true,
                _ => {}
            }
        }
        frame
    }

    pub(crate) fn leave(&mut self, frame: Frame) {
        self.list_depth = frame.list_depth;
        self.blockquote_depth = frame.blockquote_depth;
        self.in_code_block = frame.in_code_block;
        self.in_table = frame.in_table;
    }
}
