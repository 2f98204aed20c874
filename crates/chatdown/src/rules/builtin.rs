//! Built-in rules: CommonMark, GFM tables and strikethrough, math.
//!
//! Order matters. The first matching rule wins, so the most specific
//! filters (math renderings, code) come before the generic ones.

use chatdown_core::{
    escape_table_cell, fenced_code_block, heading, indent_continuation, inline_code, list_marker,
    quote_block, render_table, wrap_inline,
};
use tracing::debug;

use super::{Filter, Rule, Traversal};
use crate::context::ConversionContext;
use crate::node::{Node, NodeRef};
use crate::utilities::{clean_attribute, is_block, language_from_class, normalize_language};

/// Classes of display math renderings
const DISPLAY_MATH: &[&str] = &["katex-display", "math-block"];

/// Classes of inline math renderings (and failed renderings)
const INLINE_MATH: &[&str] = &["katex", "math-inline", "katex-error"];

/// Upper bound for `colspan`, which comes straight from the page
const MAX_COLSPAN: usize = 64;

/// Create all built-in rules, in matching order
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        math_block_rule(),
        math_inline_rule(),
        code_block_rule(),
        inline_code_rule(),
        table_rule(),
        heading_rule(),
        paragraph_rule(),
        blockquote_rule(),
        list_rule(),
        list_item_rule(),
        line_break_rule(),
        horizontal_rule(),
        strong_rule(),
        emphasis_rule(),
        strikethrough_rule(),
        link_rule(),
        image_rule(),
        block_rule(),
    ]
}

fn math_block_rule() -> Rule {
    Rule::new(Filter::classes(DISPLAY_MATH), Traversal::Replace, |node, _, ctx| {
        match ctx.latex(node) {
            Some(tex) => format!("\n\n$${}$$\n\n", tex),
            None => {
                debug!("dropping display math without recoverable source");
                String::new()
            }
        }
    })
}

fn math_inline_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| {
            INLINE_MATH.iter().any(|c| node.has_class(c))
                && !node.has_ancestor(|a| DISPLAY_MATH.iter().any(|c| a.has_class(c)))
        }),
        Traversal::Replace,
        |node, _, ctx| match ctx.latex(node) {
            Some(tex) => format!("${}$", tex),
            None => {
                debug!("dropping inline math without recoverable source");
                String::new()
            }
        },
    )
}

fn code_block_rule() -> Rule {
    Rule::new(Filter::tag("pre"), Traversal::SkipChildren, |node, content, ctx| {
        let (code, language) = match find_code(node, ctx) {
            Some((text, language)) => (text, language.or_else(|| element_language(node.node))),
            None => (content.to_string(), element_language(node.node)),
        };

        if code.trim().is_empty() {
            return String::new();
        }
        fenced_code_block(&code, language.as_deref(), &ctx.options().fence)
    })
}

/// Text and language of the first `code` element below a `pre`
fn find_code(
    node: &NodeRef<'_, '_>,
    ctx: &ConversionContext<'_>,
) -> Option<(String, Option<String>)> {
    for child in node.children() {
        if !child.is_element() || ctx.is_noise(&child) {
            continue;
        }
        if child.is_tag("code") {
            return Some((ctx.visible_text(&child), element_language(child.node)));
        }
        if let Some(found) = find_code(&child, ctx) {
            return Some(found);
        }
    }
    None
}

/// Language declared on a code element: `language-X`/`lang-X` class or
/// `data-language`
fn element_language(node: &Node) -> Option<String> {
    node.attr("class")
        .and_then(language_from_class)
        .or_else(|| node.attr("data-language").and_then(normalize_language))
}

fn inline_code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.is_tag("code") && !node.has_ancestor(|a| a.is_tag("pre"))),
        Traversal::SkipChildren,
        |_, content, _| inline_code(content),
    )
}

fn table_rule() -> Rule {
    Rule::new(Filter::tag("table"), Traversal::Replace, |node, _, ctx| {
        let was_in_table = std::mem::replace(&mut ctx.in_table, true);
        let mut rows = Vec::new();
        collect_rows(node, false, ctx, &mut rows);
        ctx.in_table = was_in_table;

        // Header rows first; the sort is stable so body order is kept
        rows.sort_by_key(|(in_head, _)| !*in_head);
        let rows: Vec<Vec<String>> = rows.into_iter().map(|(_, cells)| cells).collect();
        render_table(&rows)
    })
}

fn collect_rows(
    node: &NodeRef<'_, '_>,
    in_head: bool,
    ctx: &mut ConversionContext<'_>,
    rows: &mut Vec<(bool, Vec<String>)>,
) {
    for child in node.children() {
        if !child.is_element() || ctx.is_noise(&child) {
            continue;
        }
        match child.tag_name().as_str() {
            "thead" => collect_rows(&child, true, ctx, rows),
            "tbody" | "tfoot" => collect_rows(&child, in_head, ctx, rows),
            "tr" => rows.push((in_head, table_row(&child, ctx))),
            _ => {}
        }
    }
}

fn table_row(row: &NodeRef<'_, '_>, ctx: &mut ConversionContext<'_>) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in row.children() {
        if !(cell.is_tag("td") || cell.is_tag("th")) || ctx.is_noise(&cell) {
            continue;
        }
        let content = ctx.convert_children(&cell);
        cells.push(escape_table_cell(&content));

        let span = cell
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN);
        cells.extend(std::iter::repeat(String::new()).take(span - 1));
    }
    cells
}

fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |node, content, ctx| {
        let level: u8 = node.tag_name()[1..].parse().unwrap_or(1);
        heading(level, content, ctx.options().heading_style)
    })
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, ctx| {
        let text = content.trim();
        if text.is_empty() {
            String::new()
        } else if ctx.in_table {
            format!(" {} ", text)
        } else {
            format!("\n\n{}\n\n", text)
        }
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| quote_block(content))
}

fn list_rule() -> Rule {
    Rule::for_tags(&["ul", "ol"], |node, content, _| {
        let content = content.trim_matches('\n');
        if content.trim().is_empty() {
            return String::new();
        }

        let nested = node.parent().is_some_and(|p| p.is_tag("li"));
        if nested && is_trailing_child(node) {
            format!("\n{}", content)
        } else {
            format!("\n\n{}\n\n", content)
        }
    })
}

/// Nothing but whitespace and comments follows this node in its parent
fn is_trailing_child(node: &NodeRef<'_, '_>) -> bool {
    match node.parent() {
        Some(parent) => parent
            .node
            .children()
            .skip(node.index() + 1)
            .all(|n| !n.is_element() && n.text_content().trim().is_empty()),
        None => true,
    }
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |node, content, ctx| {
        let parent = node.parent();
        let ordered = parent.is_some_and(|p| p.is_tag("ol"));
        let number = if ordered {
            let start = parent
                .and_then(|p| p.attr("start"))
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            let preceding = node.preceding_siblings().filter(|s| s.is_tag("li")).count();
            start.saturating_add(preceding as u64)
        } else {
            0
        };

        let marker = list_marker(ordered, number, ctx.options().bullet_list_marker);
        let task = match task_state(node.node) {
            Some(true) => "[x] ",
            Some(false) => "[ ] ",
            None => "",
        };

        let body = indent_continuation(content.trim(), marker.chars().count());
        let has_next = parent.is_some_and(|p| {
            p.node
                .children()
                .skip(node.index() + 1)
                .any(|n| n.is_tag("li"))
        });

        format!("{}{}{}{}", marker, task, body, if has_next { "\n" } else { "" })
    })
}

/// Checkbox state of a task list item: a checkbox as the first element of
/// the item (or of its first paragraph or label).
fn task_state(li: &Node) -> Option<bool> {
    let first = li.element_children().next()?;
    let input = if first.is_tag("p") || first.is_tag("label") {
        first.element_children().next()?
    } else {
        first
    };

    let is_checkbox = input.is_tag("input")
        && input
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
    is_checkbox.then(|| input.has_attr("checked"))
}

fn line_break_rule() -> Rule {
    Rule::new(Filter::tag("br"), Traversal::Replace, |_, _, ctx| {
        let separator = if ctx.in_table { " " } else { "\n" };
        separator.to_string()
    })
}

fn horizontal_rule() -> Rule {
    Rule::new(Filter::tag("hr"), Traversal::Replace, |_, _, ctx| {
        format!("\n\n{}\n\n", ctx.options().hr)
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |_, content, ctx| {
        wrap_inline(content, &ctx.options().strong_delimiter)
    })
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |_, content, ctx| {
        let delimiter = ctx.options().em_delimiter.to_string();
        wrap_inline(content, &delimiter)
    })
}

fn strikethrough_rule() -> Rule {
    Rule::for_tags(&["del", "s", "strike"], |_, content, _| wrap_inline(content, "~~"))
}

fn link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.is_tag("a") && node.has_attr("href")),
        Traversal::RecurseIntoChildren,
        |node, content, _| {
            let text = content.trim();
            if text.is_empty() {
                return String::new();
            }

            let href = clean_attribute(node.attr("href"));
            if href.is_empty() || href.to_ascii_lowercase().starts_with("javascript:") {
                return text.to_string();
            }

            format!(
                "[{}]({}{})",
                text,
                href.replace(' ', "%20"),
                title_part(node)
            )
        },
    )
}

fn image_rule() -> Rule {
    Rule::new(Filter::tag("img"), Traversal::Replace, |node, _, _| {
        let src = clean_attribute(node.attr("src"));
        if src.is_empty() {
            return String::new();
        }

        let alt = clean_attribute(node.attr("alt"))
            .replace('[', "\\[")
            .replace(']', "\\]");
        format!("![{}]({}{})", alt, src.replace(' ', "%20"), title_part(node))
    })
}

/// ` "title"` for links and images, empty without a title
fn title_part(node: &NodeRef<'_, '_>) -> String {
    let title = clean_attribute(node.attr("title"));
    if title.is_empty() {
        String::new()
    } else {
        format!(" \"{}\"", title.replace('"', "\\\""))
    }
}

fn block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| is_block(&node.tag_name())),
        Traversal::RecurseIntoChildren,
        |_, content, _| {
            let content = content.trim();
            if content.is_empty() {
                String::new()
            } else {
                format!("\n\n{}\n\n", content)
            }
        },
    )
}
