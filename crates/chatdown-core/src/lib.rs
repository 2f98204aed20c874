//! chatdown-core - Markdown writing primitives
//!
//! This crate holds the parts of Markdown generation that do not depend on
//! any DOM representation: output options and the small serialization
//! helpers (buffer joining, escaping, fences, quoting, tables) that the
//! `chatdown` rule table composes.
//!
//! # Example
//!
//! ```rust
//! use chatdown_core::{finish, MarkdownBuffer, heading, HeadingStyle};
//!
//! let mut buf = MarkdownBuffer::new();
//! buf.push(&heading(2, "Hello World", HeadingStyle::Atx));
//! buf.push("\n\nSome text.\n\n");
//!
//! assert_eq!(finish(buf.as_str()), "## Hello World\n\nSome text.");
//! ```

mod options;
mod serialize;

pub use options::{HeadingStyle, Options};
pub use serialize::{
    code_fence, collapse_whitespace, escape_table_cell, escape_text, fenced_code_block, finish,
    heading, indent_continuation, inline_code, list_marker, quote_block, render_table,
    wrap_inline, MarkdownBuffer,
};
