//! MarkdownConverter - the main entry point for HTML to Markdown conversion.

use std::sync::Arc;

use chatdown_core::{collapse_whitespace, escape_text, finish, MarkdownBuffer, Options};
use tracing::{debug, instrument, trace};

use crate::adapters::{AdapterRegistry, GenericAdapter, SiteAdapter};
use crate::config::ChatdownConfig;
use crate::context::ConversionContext;
use crate::node::{Node, NodeRef, NodeType};
use crate::noise::NoiseFilter;
use crate::rules::{Filter, Rule, Rules, Traversal};
use crate::selector::Selector;
use crate::utilities::is_block;
use crate::{ChatdownError, Result};

/// Converts DOM trees to Markdown with a rule table, a noise filter and a
/// site adapter.
pub struct MarkdownConverter {
    options: Options,
    adapter: Arc<dyn SiteAdapter>,
    rules: Rules,
    noise: NoiseFilter,
}

impl MarkdownConverter {
    /// Create a converter with default options and the generic adapter
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// Create a converter with custom options and the generic adapter
    pub fn with_options(options: Options) -> Self {
        Self::for_adapter(Arc::new(GenericAdapter), options)
    }

    /// Create a converter for a site. The adapter's rules are consulted
    /// before the built-in ones.
    pub fn for_adapter(adapter: Arc<dyn SiteAdapter>, options: Options) -> Self {
        Self {
            options,
            rules: Rules::with_site_rules(adapter.rules()),
            noise: NoiseFilter::new(adapter.clone()),
            adapter,
        }
    }

    /// Create a converter from configuration. The adapter is looked up by
    /// the configured site name, falling back to the generic adapter.
    pub fn from_config(config: &ChatdownConfig, registry: &AdapterRegistry) -> Result<Self> {
        let adapter = match config.site.as_deref() {
            Some(name) => registry
                .by_name(name)
                .ok_or_else(|| ChatdownError::Config(format!("unknown site adapter `{name}`")))?,
            None => registry.fallback(),
        };
        Ok(Self::for_adapter(adapter, config.markdown.clone()))
    }

    /// Add a custom rule, consulted before site and built-in rules
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Remove elements matching the filter
    pub fn remove(&mut self, filter: Filter) -> &mut Self {
        self.rules.remove(filter);
        self
    }

    /// Escape markdown special characters in a string
    pub fn escape(&self, text: &str) -> String {
        escape_text(text, true)
    }

    /// Get the current options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// The site adapter in use
    pub fn adapter(&self) -> &Arc<dyn SiteAdapter> {
        &self.adapter
    }

    /// Convert a DOM tree to Markdown.
    ///
    /// The tree is only borrowed. Converting the same tree twice gives the
    /// same output. Passing a comment node as the root is an error; any
    /// other unexpected markup degrades to its text.
    pub fn parse(&self, root: &Node) -> Result<String> {
        if root.is_comment() {
            return Err(ChatdownError::InvalidInput(
                "cannot convert a comment node".to_string(),
            ));
        }

        let mut ctx = ConversionContext::new(self);
        let root = NodeRef::new(root);
        let output = match root.node.node_type {
            NodeType::Text => escape_text(
                collapse_whitespace(root.node.node_value.as_deref().unwrap_or("")).trim(),
                true,
            ),
            NodeType::Element => self.process_node(&root, &mut ctx),
            _ => self.convert_children(&root, &mut ctx),
        };

        Ok(finish(&output))
    }

    /// Parse an HTML string and convert it to Markdown
    pub fn parse_html(&self, html: &str) -> Result<String> {
        let node = crate::html::parse_html(html);
        self.parse(&node)
    }

    /// Assistant messages of a page, in document order
    pub fn messages<'d>(&self, document: &'d Node) -> Result<Vec<&'d Node>> {
        let selector = Selector::parse(self.adapter.message_selector())?;
        Ok(document.select(&selector))
    }

    /// Convert one chat message element.
    ///
    /// Works on a detached copy: the adapter normalizes it, the content
    /// root is located with the adapter's content selector, and the
    /// adapter's HTML extraction is the fallback when no content root is
    /// found.
    #[instrument(skip_all, fields(adapter = self.adapter.name()))]
    pub fn convert_message(&self, message: &Node) -> Result<String> {
        let mut message = message.clone();
        self.adapter.normalize_dom(&mut message);

        let content_selector = Selector::parse(self.adapter.message_content_selector())?;
        if content_selector.matches_node(&message) {
            return self.parse(&message);
        }
        if let Some(content) = message.select_first(&content_selector) {
            return self.parse(content);
        }

        debug!(
            selector = content_selector.as_str(),
            "no content root, using extracted message html"
        );
        self.parse_extracted(&message)
    }

    fn parse_extracted(&self, message: &Node) -> Result<String> {
        let html = self.adapter.extract_message_html(message);
        if html.trim().is_empty() {
            return Ok(String::new());
        }
        self.parse_html(&html)
    }

    pub(crate) fn is_noise(&self, node: &NodeRef<'_, '_>, ctx: &ConversionContext<'_>) -> bool {
        self.noise.is_noise(node) || self.rules.should_remove(node, ctx)
    }

    /// Process a single element
    fn process_node(&self, node: &NodeRef<'_, '_>, ctx: &mut ConversionContext<'_>) -> String {
        if self.is_noise(node, ctx) {
            trace!(tag = %node.tag_name(), "skipping noise");
            return String::new();
        }

        let Some(rule) = self.rules.for_node(node, ctx) else {
            // Default: return content as-is
            let frame = ctx.enter(node);
            let content = self.convert_children(node, ctx);
            ctx.leave(frame);
            return content;
        };

        trace!(tag = %node.tag_name(), traversal = ?rule.traversal, "rule matched");
        let content = match rule.traversal {
            Traversal::RecurseIntoChildren => {
                let frame = ctx.enter(node);
                let content = self.convert_children(node, ctx);
                ctx.leave(frame);
                content
            }
            Traversal::SkipChildren => ctx.visible_text(node),
            Traversal::Replace => String::new(),
        };
        rule.replace(node, &content, ctx)
    }

    /// Convert the children of a node and join them
    pub(crate) fn convert_children(
        &self,
        node: &NodeRef<'_, '_>,
        ctx: &mut ConversionContext<'_>,
    ) -> String {
        let mut buf = MarkdownBuffer::new();
        let children: Vec<NodeRef<'_, '_>> = node.children().collect();

        for (i, child) in children.iter().enumerate() {
            match child.node.node_type {
                NodeType::Text => {
                    let raw = child.node.node_value.as_deref().unwrap_or("");
                    if ctx.in_code_block {
                        buf.push_verbatim(raw);
                        continue;
                    }

                    let prev = i.checked_sub(1).map(|j| children[j].node);
                    let next = children.get(i + 1).map(|c| c.node);
                    let text = text_fragment(raw, node.node, prev, next, &buf);
                    buf.push(&text);
                }
                NodeType::Element => {
                    let converted = self.process_node(child, ctx);
                    buf.push(&converted);
                }
                _ => {}
            }
        }

        buf.into_string()
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MarkdownConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownConverter")
            .field("options", &self.options)
            .field("adapter", &self.adapter.name())
            .field("rules", &self.rules)
            .finish()
    }
}

/// Elements and containers whose edges swallow whitespace
fn is_block_node(node: &Node) -> bool {
    match node.node_type {
        NodeType::Element => is_block(&node.tag_name()),
        NodeType::Document | NodeType::DocumentFragment => true,
        _ => false,
    }
}

/// Collapse and escape one text node.
///
/// Whitespace-only text disappears next to block siblings, at the edges of
/// a block parent and at the start of a line. Leading spaces are dropped at
/// line start, trailing spaces before a block sibling.
fn text_fragment(
    raw: &str,
    parent: &Node,
    prev: Option<&Node>,
    next: Option<&Node>,
    buf: &MarkdownBuffer,
) -> String {
    let collapsed = collapse_whitespace(raw);
    let at_line_start = if buf.is_empty() {
        is_block_node(parent)
    } else {
        buf.at_line_start()
    };
    let prev_is_block = prev.map_or(is_block_node(parent), is_block_node);
    let next_is_block = next.map_or(is_block_node(parent), is_block_node);

    if collapsed.trim().is_empty() {
        if collapsed.is_empty() || prev_is_block || next_is_block || at_line_start {
            return String::new();
        }
        return " ".to_string();
    }

    let mut text = collapsed.as_str();
    if at_line_start || prev_is_block {
        text = text.trim_start();
    }
    if next_is_block {
        text = text.trim_end();
    }
    escape_text(text, at_line_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChatGptAdapter, DeepseekAdapter, GeminiAdapter};

    fn convert(html: &str) -> String {
        MarkdownConverter::new().parse_html(html).unwrap()
    }

    #[test]
    fn test_simple_paragraph() {
        assert_eq!(convert("<p>Hello World</p>"), "Hello World");
    }

    #[test]
    fn test_paragraphs_separated_by_blank_line() {
        assert_eq!(convert("<p>One</p>\n  <p>Two</p>"), "One\n\nTwo");
        assert_eq!(convert("<p>   </p><p>Two</p>"), "Two");
    }

    #[test]
    fn test_heading_atx_default() {
        assert_eq!(convert("<h2>Title</h2><p>Body</p>"), "## Title\n\nBody");
    }

    #[test]
    fn test_heading_setext() {
        let options = Options {
            heading_style: chatdown_core::HeadingStyle::Setext,
            ..Default::default()
        };
        let converter = MarkdownConverter::with_options(options);
        assert_eq!(converter.parse_html("<h1>Title</h1>").unwrap(), "Title\n=====");
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            convert("<p>a <strong>bold</strong>, <em>it</em> and <del>gone</del></p>"),
            "a **bold**, *it* and ~~gone~~"
        );
        assert_eq!(convert("<p>a<strong> spaced </strong>b</p>"), "a **spaced** b");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(convert("<p>2 * 3 = [x]</p>"), "2 \\* 3 = \\[x\\]");
        assert_eq!(convert("<p># not a heading</p>"), "\\# not a heading");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            convert("<p>Run <code>a_b *c*</code> now</p>"),
            "Run `a_b *c*` now"
        );
    }

    #[test]
    fn test_fenced_code_block_verbatim() {
        let html = "<pre><code class=\"language-python\">def f():\n    return 1\n\n\n\nprint(f())\n</code></pre>";
        assert_eq!(
            convert(html),
            "```python\ndef f():\n    return 1\n\n\n\nprint(f())\n```"
        );
    }

    #[test]
    fn test_code_block_without_language_is_unlabeled() {
        assert_eq!(convert("<pre>x = 1</pre>"), "```\nx = 1\n```");
    }

    #[test]
    fn test_code_block_fence_grows() {
        let html = "<pre><code>```\ninner\n```</code></pre>";
        assert_eq!(convert(html), "````\n```\ninner\n```\n````");
    }

    #[test]
    fn test_code_block_skips_noise() {
        let html = "<pre><div>python<button>Copy code</button></div><code class=\"language-py\">x</code></pre>";
        assert_eq!(convert(html), "```py\nx\n```");
    }

    #[test]
    fn test_table() {
        let html = "<table><thead><tr><th>Name</th><th>Age</th></tr></thead>\
                    <tbody><tr><td>Alice</td><td>30</td></tr></tbody></table>";
        assert_eq!(convert(html), "| Name | Age |\n| --- | --- |\n| Alice | 30 |");
    }

    #[test]
    fn test_table_ragged_rows_and_pipes() {
        let html = "<table><tr><td>a|b</td></tr><tr><td colspan=\"2\">wide</td><td>c<br>d</td></tr></table>";
        assert_eq!(
            convert(html),
            "| a\\|b |  |  |\n| --- | --- | --- |\n| wide |  | c d |"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            convert("<ul><li>A<ul><li>B</li></ul></li></ul>"),
            "- A\n  - B"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(
            convert("<ol start=\"3\">\n<li>Three</li>\n<li>Four</li>\n</ol>"),
            "3. Three\n4. Four"
        );
    }

    #[test]
    fn test_ordered_list_start_near_integer_limits() {
        assert_eq!(
            convert("<ol start=\"4294967295\"><li>a</li><li>b</li></ol>"),
            "4294967295. a\n4294967296. b"
        );
        assert_eq!(
            convert("<ol start=\"18446744073709551615\"><li>a</li><li>b</li></ol>"),
            "18446744073709551615. a\n18446744073709551615. b"
        );
    }

    #[test]
    fn test_task_list() {
        let html = "<ul><li><input type=\"checkbox\" checked> done</li><li><input type=\"checkbox\"> todo</li></ul>";
        assert_eq!(convert(html), "- [x] done\n- [ ] todo");
    }

    #[test]
    fn test_list_item_with_code_block() {
        let html = "<ol><li><p>Install:</p><pre><code class=\"language-sh\">cargo add x</code></pre></li></ol>";
        assert_eq!(convert(html), "1. Install:\n\n   ```sh\n   cargo add x\n   ```");
    }

    #[test]
    fn test_blockquote_nested() {
        assert_eq!(
            convert("<blockquote><p>outer</p><blockquote><p>inner</p></blockquote></blockquote>"),
            "> outer\n>\n> > inner"
        );
    }

    #[test]
    fn test_line_break_and_rule() {
        assert_eq!(convert("<p>a<br>b</p><hr><p>c</p>"), "a\nb\n\n---\n\nc");
    }

    #[test]
    fn test_link_url_not_escaped() {
        assert_eq!(
            convert("<p><a href=\"https://example.com/a_b*c\" title=\"T\">the_link</a></p>"),
            "[the\\_link](https://example.com/a_b*c \"T\")"
        );
    }

    #[test]
    fn test_link_edge_cases() {
        assert_eq!(convert("<p>x<a href=\"/y\"> </a>z</p>"), "xz");
        assert_eq!(
            convert("<p><a href=\"javascript:void(0)\">click</a></p>"),
            "click"
        );
    }

    #[test]
    fn test_image() {
        assert_eq!(
            convert("<img src=\"test.png\" alt=\"Alt\" title=\"T\">"),
            "![Alt](test.png \"T\")"
        );
        assert_eq!(convert("<img alt=\"no source\">"), "");
    }

    #[test]
    fn test_math() {
        let html = "<p>Energy: <span class=\"katex\"><span class=\"katex-mathml\"><math><semantics>\
                    <mrow><mi>E</mi></mrow><annotation encoding=\"application/x-tex\">E=mc^2</annotation>\
                    </semantics></math></span><span class=\"katex-html\" aria-hidden=\"true\">E=mc2</span></span></p>";
        assert_eq!(convert(html), "Energy: $E=mc^2$");

        let html = "<span class=\"katex-display\"><span class=\"katex\"><span class=\"katex-mathml\">\
                    <math><semantics><annotation encoding=\"application/x-tex\">E=mc^2</annotation>\
                    </semantics></math></span></span></span>";
        assert_eq!(convert(html), "$$E=mc^2$$");
    }

    #[test]
    fn test_failed_math_dropped_when_long() {
        let long = "\\x".repeat(120);
        let html = format!("<p>a<span class=\"katex-error\">{long}</span>b</p>");
        assert_eq!(convert(&html), "ab");
    }

    #[test]
    fn test_noise_excluded() {
        let html = "<div><p>Keep</p><script>var x = 1;</script><button>Copy</button>\
                    <div hidden>secret</div><svg><text>icon</text></svg></div>";
        assert_eq!(convert(html), "Keep");
    }

    #[test]
    fn test_adapter_noise_excluded() {
        let converter = MarkdownConverter::for_adapter(Arc::new(ChatGptAdapter), Options::default());
        let html = "<p>Answer<span class=\"sr-only\">Copy</span></p>";
        assert_eq!(converter.parse_html(html).unwrap(), "Answer");
    }

    #[test]
    fn test_idempotent() {
        let node = crate::html::parse_html(
            "<h1>T</h1><ul><li>a<ul><li>b</li></ul></li></ul><pre><code>x</code></pre>",
        );
        let before = node.clone();
        let converter = MarkdownConverter::new();
        let first = converter.parse(&node).unwrap();
        let second = converter.parse(&node).unwrap();
        assert_eq!(first, second);
        assert_eq!(node, before);
    }

    #[test]
    fn test_comment_root_is_error() {
        let result = MarkdownConverter::new().parse(&Node::comment("x"));
        assert!(matches!(result, Err(ChatdownError::InvalidInput(_))));
    }

    #[test]
    fn test_text_root() {
        let out = MarkdownConverter::new().parse(&Node::text("  *hi*  ")).unwrap();
        assert_eq!(out, "\\*hi\\*");
    }

    #[test]
    fn test_custom_rule_wins() {
        let mut converter = MarkdownConverter::new();
        converter.add_rule(
            "mark",
            Rule::for_tag("mark", |_, content, _| format!("=={}==", content)),
        );
        converter.add_rule(
            "strong",
            Rule::for_tags(&["strong", "b"], |_, content, _| format!("__{}__", content)),
        );
        assert_eq!(
            converter
                .parse_html("<p><mark>hi</mark> <b>x</b></p>")
                .unwrap(),
            "==hi== __x__"
        );
    }

    #[test]
    fn test_rule_from_boxed_closures() {
        let is_note: crate::PredicateFn = Box::new(|node, _| node.attr("data-role") == Some("note"));
        let mut converter = MarkdownConverter::new();
        converter.add_rule(
            "note",
            Rule::new(Filter::Predicate(is_note), Traversal::RecurseIntoChildren, |_, content, _| {
                format!("\n\n> **Note:** {}\n\n", content.trim())
            }),
        );
        assert_eq!(
            converter
                .parse_html("<p>Intro</p><div data-role=\"note\">Read <em>this</em></div>")
                .unwrap(),
            "Intro\n\n> **Note:** Read *this*"
        );
    }

    #[test]
    fn test_remove_filter() {
        let mut converter = MarkdownConverter::new();
        converter.remove(Filter::classes(&["ad"]));
        assert_eq!(
            converter
                .parse_html("<p>text</p><div class=\"ad\">buy</div>")
                .unwrap(),
            "text"
        );
    }

    #[test]
    fn test_convert_message_uses_content_root() {
        let page = crate::html::parse_html(
            "<div data-message-author-role=\"assistant\"><div class=\"toolbar\">4o</div>\
             <div class=\"markdown prose\"><p>Hi <b>there</b></p></div></div>",
        );
        let converter = MarkdownConverter::for_adapter(Arc::new(ChatGptAdapter), Options::default());
        let messages = converter.messages(&page).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            converter.convert_message(messages[0]).unwrap(),
            "Hi **there**"
        );
    }

    #[test]
    fn test_convert_message_normalizes_banner_code() {
        let html = "<div class=\"ds-message\"><div class=\"ds-markdown\">\
                    <div class=\"md-code-block\"><div class=\"md-code-block-banner-wrap\">\
                    <div class=\"md-code-block-banner\"><span class=\"d813de27\">python</span>\
                    <div class=\"md-code-block-action\"><div class=\"ds-button\">Copy</div></div></div></div>\
                    <pre>print(1)</pre></div></div></div>";
        let page = crate::html::parse_html(html);
        let converter = MarkdownConverter::for_adapter(Arc::new(DeepseekAdapter), Options::default());
        let message = converter.messages(&page).unwrap()[0];
        assert_eq!(
            converter.convert_message(message).unwrap(),
            "```python\nprint(1)\n```"
        );
        // the page itself is untouched
        assert!(page
            .select_first(&Selector::parse(".md-code-block-banner-wrap").unwrap())
            .is_some());
    }

    #[test]
    fn test_gemini_math_and_citations() {
        let html = "<model-response><message-content><div class=\"markdown\">\
                    <p>Area <span class=\"math-inline\" data-math=\"\\pi r^2\">πr2</span>\
                    <sup data-turn-source-index=\"2\">2</sup></p></div></message-content></model-response>";
        let page = crate::html::parse_html(html);
        let converter = MarkdownConverter::for_adapter(Arc::new(GeminiAdapter), Options::default());
        let message = converter.messages(&page).unwrap()[0];
        assert_eq!(
            converter.convert_message(message).unwrap(),
            "Area $\\pi r^2$[2]"
        );
    }

    #[test]
    fn test_from_config() {
        let config = ChatdownConfig::from_toml_str(
            r#"
            site = "claude"
            [markdown]
            bullet_list_marker = "*"
            "#,
        )
        .unwrap();
        let converter =
            MarkdownConverter::from_config(&config, &AdapterRegistry::new()).unwrap();
        assert_eq!(converter.adapter().name(), "claude");
        assert_eq!(converter.parse_html("<ul><li>x</li></ul>").unwrap(), "* x");

        let bad = ChatdownConfig::from_toml_str("site = \"nope\"").unwrap();
        assert!(matches!(
            MarkdownConverter::from_config(&bad, &AdapterRegistry::new()),
            Err(ChatdownError::Config(_))
        ));
    }
}
