//! Utility functions and constants for HTML processing.

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas",
    "center", "dd", "details", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frameset", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "html", "isindex", "li",
    "main", "menu", "nav", "noframes", "noscript", "ol", "output", "p", "pre",
    "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements that never carry message content
pub const CHROME_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "button", "svg", "input",
    "select", "textarea",
];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.iter().any(|b| b.eq_ignore_ascii_case(tag))
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Check if a tag is page chrome rather than content
pub fn is_chrome(tag: &str) -> bool {
    CHROME_ELEMENTS.iter().any(|c| c.eq_ignore_ascii_case(tag))
}

/// Clean an attribute value (trim and handle empty)
pub fn clean_attribute(value: Option<&str>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Normalize a language label ("Python 3", " TS ") into a fence info string.
///
/// Takes the first token, lowercases it and keeps only characters that are
/// valid in common fence languages. Returns `None` when nothing is left.
pub fn normalize_language(label: &str) -> Option<String> {
    let token = label.split_whitespace().next()?;
    let lang: String = token
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '+' | '#' | '-' | '_' | '.'))
        .flat_map(char::to_lowercase)
        .collect();
    (!lang.is_empty()).then_some(lang)
}

/// Language from a `language-X` / `lang-X` class
pub fn language_from_class(class: &str) -> Option<String> {
    class
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
        .and_then(normalize_language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_block() {
        assert!(is_block("div"));
        assert!(is_block("p"));
        assert!(is_block("DIV"));
        assert!(!is_block("span"));
        assert!(!is_block("a"));
    }

    #[test]
    fn test_is_void() {
        assert!(is_void("br"));
        assert!(is_void("img"));
        assert!(is_void("HR"));
        assert!(!is_void("div"));
    }

    #[test]
    fn test_is_chrome() {
        assert!(is_chrome("button"));
        assert!(is_chrome("SVG"));
        assert!(!is_chrome("code"));
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language(" Python 3 "), Some("python".to_string()));
        assert_eq!(normalize_language("C++"), Some("c++".to_string()));
        assert_eq!(normalize_language("c#"), Some("c#".to_string()));
        assert_eq!(normalize_language("   "), None);
        assert_eq!(normalize_language("()"), None);
    }

    #[test]
    fn test_language_from_class() {
        assert_eq!(
            language_from_class("hljs language-typescript"),
            Some("typescript".to_string())
        );
        assert_eq!(language_from_class("lang-go"), Some("go".to_string()));
        assert_eq!(language_from_class("code-container"), None);
    }
}
