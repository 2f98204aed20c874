//! LaTeX recovery from rendered math.
//!
//! Chat pages render formulas with KaTeX (or MathJax-like wrappers that keep
//! the source in `data-math`). The rendering itself is unusable as Markdown,
//! so the source is recovered from the markup, in order of reliability:
//!
//! 1. the TeX annotation of the hidden MathML copy
//! 2. a `data-math` attribute
//! 3. the raw text of a failed rendering (`katex-error`), when short enough
//! 4. the visible text of the rendering

use crate::node::{Node, NodeType};

const TEX_ENCODING: &str = "application/x-tex";

/// Extract the LaTeX source of a math rendering.
///
/// Returns `None` when nothing usable is found, or when a failed rendering
/// is longer than `max_fallback_chars` characters.
pub fn extract_latex(node: &Node, max_fallback_chars: usize) -> Option<String> {
    if let Some(tex) = find_annotation(node) {
        return Some(tex);
    }

    if let Some(tex) = node.attr("data-math").map(str::trim).filter(|t| !t.is_empty()) {
        return Some(tex.to_string());
    }

    if let Some(error) = find_error(node) {
        let raw = error.text_content();
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().count() >= max_fallback_chars {
            return None;
        }
        return Some(raw.to_string());
    }

    let mut visible = String::new();
    collect_visible(node, &mut visible);
    let visible = visible.trim();
    (!visible.is_empty()).then(|| visible.to_string())
}

/// Text of `annotation[encoding="application/x-tex"]` below `node`
fn find_annotation(node: &Node) -> Option<String> {
    if node.is_tag("annotation")
        && node
            .attr("encoding")
            .is_some_and(|e| e.eq_ignore_ascii_case(TEX_ENCODING))
    {
        let tex = node.text_content();
        let tex = tex.trim();
        return (!tex.is_empty()).then(|| tex.to_string());
    }
    node.children().find_map(find_annotation)
}

/// The failed-rendering marker: the node itself or a descendant
fn find_error(node: &Node) -> Option<&Node> {
    if node.has_class("katex-error") {
        return Some(node);
    }
    node.element_children().find_map(find_error)
}

/// Visible text, skipping the MathML copy KaTeX keeps for screen readers
fn collect_visible(node: &Node, out: &mut String) {
    for child in node.children() {
        match child.node_type {
            NodeType::Text => out.push_str(child.node_value.as_deref().unwrap_or("")),
            NodeType::Element if !child.has_class("katex-mathml") && !child.is_tag("math") => {
                collect_visible(child, out)
            }
            _ => {}
        }
    }
}
