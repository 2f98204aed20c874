//! Markdown serialization primitives
//!
//! Small, DOM-independent building blocks the converter's rules use to emit
//! Markdown: the newline-merging output buffer, escaping, fences, quoting,
//! list continuation and GFM tables.

use crate::options::HeadingStyle;

/// Output buffer that joins fragments the way block elements expect.
///
/// When a fragment is pushed, trailing newlines of the buffer and leading
/// newlines of the fragment are merged into a single separator of at most
/// two newlines. Newlines inside a fragment are never touched, so code block
/// bodies survive verbatim.
#[derive(Debug, Default, Clone)]
pub struct MarkdownBuffer {
    out: String,
}

impl MarkdownBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment, merging the newline separator at the boundary.
    pub fn push(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }

        let head = fragment.trim_start_matches('\n');
        let leading = fragment.len() - head.len();
        let kept = self.out.trim_end_matches('\n').len();
        let trailing = self.out.len() - kept;
        let newlines = leading.max(trailing).min(2);

        self.out.truncate(kept);
        if newlines > 0 {
            let without_spaces = self.out.trim_end_matches([' ', '\t']).len();
            self.out.truncate(without_spaces);
            for _ in 0..newlines {
                self.out.push('\n');
            }
        }
        self.out.push_str(head);
    }

    /// Append text exactly as given, without separator merging.
    pub fn push_verbatim(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// True when the next character would start a new line.
    pub fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

/// Final cleanup of a complete conversion: no blank lines or stray spaces
/// around the document.
pub fn finish(output: &str) -> String {
    output.trim().to_string()
}

/// Collapse every run of whitespace into a single space
pub fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_whitespace = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result
}

/// Escape Markdown-significant characters in plain text.
///
/// Backslashes, `*`, `_`, backticks and brackets are always escaped. `#` is
/// only escaped when it would open a line (`at_line_start` and nothing but
/// whitespace before it).
pub fn escape_text(text: &str, at_line_start: bool) -> String {
    let mut result = String::with_capacity(text.len() + 8);
    let mut line_start = at_line_start;

    for c in text.chars() {
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' => {
                result.push('\\');
                result.push(c);
            }
            '#' if line_start => {
                result.push_str("\\#");
            }
            _ => result.push(c),
        }
        if !c.is_whitespace() {
            line_start = false;
        }
    }

    result
}

/// Prepare converted cell content for a GFM table: single line, pipes escaped.
pub fn escape_table_cell(content: &str) -> String {
    let flat = collapse_whitespace(content);
    let mut result = String::with_capacity(flat.len());
    let mut escaped = false;

    for c in flat.trim().chars() {
        if c == '|' && !escaped {
            result.push('\\');
        }
        escaped = c == '\\' && !escaped;
        result.push(c);
    }

    result
}

/// Longest run of `ch` anywhere in `s`
fn longest_run(s: &str, ch: char) -> usize {
    s.chars()
        .fold((0, 0), |(max, current), c| {
            if c == ch {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0
}

/// Pick a fence long enough that the code body cannot close it early.
pub fn code_fence(code: &str, min_fence: &str) -> String {
    let fence_char = min_fence.chars().next().unwrap_or('`');
    let min_len = min_fence.chars().count().max(3);
    let needed = longest_run(code, fence_char) + 1;
    std::iter::repeat(fence_char).take(min_len.max(needed)).collect()
}

/// Fenced code block, surrounded by blank lines
pub fn fenced_code_block(code: &str, language: Option<&str>, min_fence: &str) -> String {
    let code = code.trim_end_matches('\n');
    let fence = code_fence(code, min_fence);
    format!(
        "\n\n{}{}\n{}\n{}\n\n",
        fence,
        language.unwrap_or(""),
        code,
        fence
    )
}

/// Inline code span with a delimiter longer than any backtick run inside
pub fn inline_code(code: &str) -> String {
    let code = code.replace(['\r', '\n'], " ");
    if code.is_empty() {
        return String::new();
    }

    let backticks = "`".repeat(longest_run(&code, '`') + 1);
    let needs_space = code.starts_with('`') || code.ends_with('`');

    if needs_space {
        format!("{} {} {}", backticks, code, backticks)
    } else {
        format!("{}{}{}", backticks, code, backticks)
    }
}

/// Wrap inline content in a delimiter, keeping flanking whitespace outside.
pub fn wrap_inline(content: &str, delimiter: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{delimiter}{trimmed}{delimiter}{trail}")
}

/// Heading block. Newlines in the text are flattened to spaces.
pub fn heading(level: u8, text: &str, style: HeadingStyle) -> String {
    let text = collapse_whitespace(text);
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    match style {
        HeadingStyle::Setext if level <= 2 => {
            let underline = if level == 1 { "=" } else { "-" };
            format!(
                "\n\n{}\n{}\n\n",
                text,
                underline.repeat(text.chars().count())
            )
        }
        _ => format!("\n\n{} {}\n\n", "#".repeat(level.clamp(1, 6) as usize), text),
    }
}

/// Prefix every line with `> ` (bare `>` for blank lines).
pub fn quote_block(content: &str) -> String {
    let content = content.trim_matches('\n');
    if content.trim().is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(content.len() + 16);
    out.push_str("\n\n");
    for (i, line) in content.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push('>');
        if !line.is_empty() {
            out.push(' ');
            out.push_str(line);
        }
    }
    out.push_str("\n\n");
    out
}

/// List item marker: `- ` or `N. `
pub fn list_marker(ordered: bool, number: u64, bullet: char) -> String {
    if ordered {
        format!("{}. ", number)
    } else {
        format!("{} ", bullet)
    }
}

/// Indent every non-empty line after the first by `width` spaces.
pub fn indent_continuation(content: &str, width: usize) -> String {
    let indent = " ".repeat(width);
    let mut out = String::with_capacity(content.len() + 16);

    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&indent);
            }
        }
        out.push_str(line);
    }

    out
}

/// Render a GFM table. The first row is the header; every row is padded to
/// the widest row so the separator always matches the header column count.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let col_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    let render_row = |row: &[String]| -> String {
        let mut line = String::from("|");
        for i in 0..col_count {
            line.push(' ');
            line.push_str(row.get(i).map(String::as_str).unwrap_or(""));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::from("\n\n");
    out.push_str(&render_row(&rows[0]));
    out.push('\n');

    out.push('|');
    for _ in 0..col_count {
        out.push_str(" --- |");
    }

    for row in &rows[1..] {
        out.push('\n');
        out.push_str(&render_row(row));
    }
    out.push_str("\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_merges_block_separators() {
        let mut buf = MarkdownBuffer::new();
        buf.push("\n\nFirst\n\n");
        buf.push("\n\nSecond\n\n");
        assert_eq!(finish(buf.as_str()), "First\n\nSecond");
    }

    #[test]
    fn test_buffer_keeps_inner_blank_lines() {
        let mut buf = MarkdownBuffer::new();
        buf.push("intro");
        buf.push("\n\n```\na\n\n\n\nb\n```\n\n");
        assert_eq!(finish(buf.as_str()), "intro\n\n```\na\n\n\n\nb\n```");
    }

    #[test]
    fn test_buffer_single_newline() {
        let mut buf = MarkdownBuffer::new();
        buf.push("a ");
        buf.push("\n");
        buf.push("b");
        assert_eq!(buf.as_str(), "a\nb");
        assert!(!buf.at_line_start());
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("*test*", false), "\\*test\\*");
        assert_eq!(escape_text("_a_ [b] `c`", false), "\\_a\\_ \\[b\\] \\`c\\`");
        assert_eq!(escape_text("C:\\dir", false), "C:\\\\dir");
        assert_eq!(escape_text("normal", true), "normal");
    }

    #[test]
    fn test_escape_hash_only_at_line_start() {
        assert_eq!(escape_text("# not a heading", true), "\\# not a heading");
        assert_eq!(escape_text("issue #42", true), "issue #42");
        assert_eq!(escape_text("#tag", false), "#tag");
    }

    #[test]
    fn test_escape_table_cell() {
        assert_eq!(escape_table_cell("a|b"), "a\\|b");
        assert_eq!(escape_table_cell("a\\|b"), "a\\|b");
        assert_eq!(escape_table_cell(" one\ntwo "), "one two");
    }

    #[test]
    fn test_code_fence_grows_past_inner_fence() {
        assert_eq!(code_fence("plain", "```"), "```");
        assert_eq!(code_fence("```\nnested\n```", "```"), "````");
    }

    #[test]
    fn test_fenced_code_block() {
        assert_eq!(
            fenced_code_block("let x = 1;\n", Some("rust"), "```"),
            "\n\n```rust\nlet x = 1;\n```\n\n"
        );
        assert_eq!(
            fenced_code_block("x", None, "```"),
            "\n\n```\nx\n```\n\n"
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(inline_code("code"), "`code`");
        assert_eq!(inline_code("a ` b"), "``a ` b``");
        assert_eq!(inline_code("`tick"), "`` `tick ``");
        assert_eq!(inline_code(""), "");
    }

    #[test]
    fn test_wrap_inline() {
        assert_eq!(wrap_inline("bold", "**"), "**bold**");
        assert_eq!(wrap_inline(" bold ", "**"), " **bold** ");
        assert_eq!(wrap_inline("  ", "*"), "");
    }

    #[test]
    fn test_heading() {
        assert_eq!(heading(3, "Section", HeadingStyle::Atx), "\n\n### Section\n\n");
        assert_eq!(heading(1, "Title", HeadingStyle::Setext), "\n\nTitle\n=====\n\n");
        assert_eq!(heading(4, "Deep", HeadingStyle::Setext), "\n\n#### Deep\n\n");
        assert_eq!(heading(2, "  ", HeadingStyle::Atx), "");
    }

    #[test]
    fn test_quote_block() {
        assert_eq!(quote_block("a\n\nb"), "\n\n> a\n>\n> b\n\n");
        assert_eq!(quote_block("\n\n"), "");
    }

    #[test]
    fn test_indent_continuation() {
        assert_eq!(indent_continuation("A\n- B\n\nC", 2), "A\n  - B\n\n  C");
    }

    #[test]
    fn test_render_table() {
        let rows = vec![
            vec!["Name".to_string(), "Age".to_string()],
            vec!["Alice".to_string(), "30".to_string()],
        ];
        assert_eq!(
            finish(&render_table(&rows)),
            "| Name | Age |\n| --- | --- |\n| Alice | 30 |"
        );
    }

    #[test]
    fn test_render_table_pads_short_rows() {
        let rows = vec![
            vec!["A".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ];
        assert_eq!(
            finish(&render_table(&rows)),
            "| A |  |\n| --- | --- |\n| 1 | 2 |"
        );
    }
}
