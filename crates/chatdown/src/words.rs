//! Word counting over converted Markdown.
//!
//! Chinese and Japanese text has no spaces between words, so each Han,
//! Hiragana or Katakana character counts as one word. Everything else is
//! split into runs of letters and digits (apostrophes inside a word keep it
//! together). Markdown punctuation never counts.

use once_cell::sync::Lazy;
use regex::Regex;

static CJK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}]").expect("hardcoded regex is valid")
});

static WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[[\p{L}\p{N}]--[\p{Han}\p{Hiragana}\p{Katakana}]]+(?:['’][[\p{L}\p{N}]--[\p{Han}\p{Hiragana}\p{Katakana}]]+)*",
    )
    .expect("hardcoded regex is valid")
});

/// Word statistics of a text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordCount {
    /// Space-separated words
    pub words: usize,
    /// CJK characters, one word each
    pub cjk_chars: usize,
}

impl WordCount {
    pub fn total(&self) -> usize {
        self.words + self.cjk_chars
    }
}

/// Count the words of a text
pub fn count_words(text: &str) -> WordCount {
    WordCount {
        words: WORD.find_iter(text).count(),
        cjk_chars: CJK.find_iter(text).count(),
    }
}
