//! # chatdown
//!
//! Convert AI chat pages to clean Markdown.
//!
//! A rule-based HTML to Markdown transducer in the spirit of
//! [turndown](https://github.com/mixmark-io/turndown), with site adapters for
//! ChatGPT, Gemini, Claude and Deepseek, noise filtering for page chrome,
//! LaTeX recovery from rendered math, and a detector that tells when a
//! streamed answer is complete.
//!
//! ## Design
//!
//! The converter works on a CDP-style DOM [`Node`] tree. This allows:
//!
//! - **No parsing when the DOM already exists** (CDP, a live document)
//! - **Parser agnostic input**: any HTML parser can produce a `Node` tree
//! - **HTML strings** parsed with scraper, whose selector engine also
//!   matches adapter selectors against `Node` trees
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use chatdown::{MarkdownConverter, Node};
//!
//! let converter = MarkdownConverter::new();
//!
//! let h1 = Node::element("h1").with_text("Hello World");
//!
//! let markdown = converter.parse(&h1).unwrap();
//! assert_eq!(markdown, "# Hello World");
//! ```
//!
//! ## Example (HTML string)
//!
//! ```rust
//! use chatdown::MarkdownConverter;
//!
//! let converter = MarkdownConverter::new();
//! let markdown = converter
//!     .parse_html("<p>Use <code>cargo</code> and <strong>relax</strong>.</p>")
//!     .unwrap();
//! assert_eq!(markdown, "Use `cargo` and **relax**.");
//! ```

use std::path::PathBuf;

pub mod adapters;
pub mod config;
mod context;
mod converter;
pub mod html;
pub mod math;
pub mod node;
pub mod noise;
pub mod normalize;
mod rules;
pub mod selector;
pub mod streaming;
mod utilities;
pub mod words;

pub use adapters::{
    AdapterRegistry, ChatGptAdapter, ClaudeAdapter, DeepseekAdapter, GeminiAdapter,
    GenericAdapter, SiteAdapter,
};
pub use chatdown_core::{HeadingStyle, Options};
pub use config::{ChatdownConfig, StreamingConfig};
pub use context::ConversionContext;
pub use converter::MarkdownConverter;
pub use html::{parse_document, parse_html};
pub use node::{Node, NodeRef, NodeType};
pub use noise::NoiseFilter;
pub use rules::{Filter, PredicateFn, ReplacementFn, Rule, Rules, Traversal};
pub use selector::Selector;
pub use streaming::{
    ChangeSource, LiveDocument, MutationBatch, StreamingDetector, WatchHandle, WatchSession,
    WatchState,
};
pub use utilities::*;
pub use words::{count_words, WordCount};

/// Error type for chatdown operations
#[derive(Debug, thiserror::Error)]
pub enum ChatdownError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ChatdownError>;
