//! DOM normalization helpers for site adapters.
//!
//! Some platforms render a code block as a banner (language label, copy
//! button) followed by a bare `<pre>` with no language class. Before
//! conversion the banner's language is moved onto a `code.language-X`
//! element so the code block rule can label the fence, and the banner is
//! detached.

use tracing::debug;

use crate::node::Node;
use crate::utilities::{is_chrome, language_from_class, normalize_language};

/// Pair code banners with the code block that follows them.
///
/// For every element accepted by `is_banner`, the next sibling subtree
/// containing a `pre` (or a `code`) before the next banner is rewritten:
///
/// - a bare `pre` gets its children wrapped in `<code class="language-X">`
/// - an unlabeled `code` gets the `language-X` class
/// - a `code` that already has a language is left alone
///
/// The banner is removed either way. Returns the number of banners handled;
/// a second run finds none and changes nothing.
pub fn wrap_bare_code_blocks<B, L>(root: &mut Node, is_banner: B, banner_language: L) -> usize
where
    B: Fn(&Node) -> bool,
    L: Fn(&Node) -> Option<String>,
{
    let count = visit(root, &is_banner, &banner_language);
    if count > 0 {
        debug!(count, "normalized code banners");
    }
    count
}

fn visit(
    node: &mut Node,
    is_banner: &dyn Fn(&Node) -> bool,
    banner_language: &dyn Fn(&Node) -> Option<String>,
) -> usize {
    let Some(children) = node.children.as_mut() else {
        return 0;
    };

    let mut count = 0;
    let mut i = 0;
    while i < children.len() {
        let banner = &children[i];
        if banner.is_element() && is_banner(banner) && !banner.contains(&is_code_carrier) {
            let target = (i + 1..children.len())
                .take_while(|&j| !(children[j].is_element() && is_banner(&children[j])))
                .find(|&j| children[j].contains(&is_code_carrier));

            if let Some(j) = target {
                let language = banner_language(&children[i]);
                label_code(&mut children[j], language.as_deref());
                children.remove(i);
                count += 1;
                continue;
            }
        }
        i += 1;
    }

    for child in children.iter_mut() {
        count += visit(child, is_banner, banner_language);
    }
    count
}

fn is_code_carrier(node: &Node) -> bool {
    node.is_tag("pre") || node.is_tag("code")
}

/// Put `language` on the first code block in `node`
fn label_code(node: &mut Node, language: Option<&str>) {
    if let Some(pre) = find_first_mut(node, "pre") {
        match find_first_mut(pre, "code") {
            Some(code) => tag_code(code, language),
            None => {
                let mut code = Node::element("code");
                if let Some(language) = language {
                    code.set_attr("class", &format!("language-{}", language));
                }
                for child in pre.take_children() {
                    code.add_child(child);
                }
                pre.add_child(code);
            }
        }
    } else if let Some(code) = find_first_mut(node, "code") {
        tag_code(code, language);
    }
}

fn tag_code(code: &mut Node, language: Option<&str>) {
    let labeled = code.attr("class").and_then(language_from_class).is_some();
    if let (false, Some(language)) = (labeled, language) {
        code.add_class(&format!("language-{}", language));
    }
}

fn find_first_mut<'n>(node: &'n mut Node, tag: &str) -> Option<&'n mut Node> {
    if node.is_tag(tag) {
        return Some(node);
    }
    node.children
        .as_mut()?
        .iter_mut()
        .find_map(|c| find_first_mut(c, tag))
}

/// Language label of a banner: its first non-blank text outside buttons and
/// icons, normalized to a fence info string.
pub fn label_language(banner: &Node) -> Option<String> {
    first_label_text(banner).and_then(|text| normalize_language(&text))
}

fn first_label_text(node: &Node) -> Option<String> {
    node.children().find_map(|child| {
        if child.is_text() {
            let text = child.node_value.as_deref().unwrap_or("").trim();
            (!text.is_empty()).then(|| text.to_string())
        } else if child.is_element() && !is_chrome(&child.tag_name()) && !child.is_tag("mat-icon") {
            first_label_text(child)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;

    fn banner(label: &str) -> Node {
        Node::element_with_attrs("div", vec![("class", "banner")])
            .with_child(Node::element("button").with_text("Copy"))
            .with_child(Node::element("span").with_text(label))
    }

    fn is_banner(node: &Node) -> bool {
        node.has_class("banner")
    }

    fn block(label: &str, code: Node) -> Node {
        Node::element("div")
            .with_child(banner(label))
            .with_child(Node::element("div").with_child(code))
    }

    #[test]
    fn test_wraps_bare_pre() {
        let mut root = block("Python 3", Node::element("pre").with_text("print(1)"));
        assert_eq!(wrap_bare_code_blocks(&mut root, is_banner, label_language), 1);

        let code = root
            .select_first(&Selector::parse("pre > code").unwrap())
            .unwrap();
        assert_eq!(code.attr("class"), Some("language-python"));
        assert_eq!(code.text_content(), "print(1)");
        assert!(root.select_first(&Selector::parse(".banner").unwrap()).is_none());
    }

    #[test]
    fn test_tags_unlabeled_code() {
        let pre = Node::element("pre").with_child(Node::element("code").with_text("x"));
        let mut root = block("rust", pre);
        wrap_bare_code_blocks(&mut root, is_banner, label_language);

        let code = root.select_first(&Selector::parse("code").unwrap()).unwrap();
        assert_eq!(code.attr("class"), Some("language-rust"));
    }

    #[test]
    fn test_existing_language_kept() {
        let pre = Node::element("pre").with_child(
            Node::element_with_attrs("code", vec![("class", "language-go")]).with_text("x"),
        );
        let mut root = block("rust", pre);
        wrap_bare_code_blocks(&mut root, is_banner, label_language);

        let code = root.select_first(&Selector::parse("code").unwrap()).unwrap();
        assert_eq!(code.attr("class"), Some("language-go"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut root = block("js", Node::element("pre").with_text("f()"));
        assert_eq!(wrap_bare_code_blocks(&mut root, is_banner, label_language), 1);
        let once = root.clone();
        assert_eq!(wrap_bare_code_blocks(&mut root, is_banner, label_language), 0);
        assert_eq!(root, once);
    }

    #[test]
    fn test_banner_without_code_stays() {
        let mut root = Node::element("div")
            .with_child(banner("note"))
            .with_child(Node::element("p").with_text("no code here"));
        assert_eq!(wrap_bare_code_blocks(&mut root, is_banner, label_language), 0);
        assert!(root.select_first(&Selector::parse(".banner").unwrap()).is_some());
    }

    #[test]
    fn test_banner_pairs_with_its_own_block() {
        let mut root = Node::element("div")
            .with_child(banner("python"))
            .with_child(banner("bash"))
            .with_child(Node::element("pre").with_text("ls"));
        assert_eq!(wrap_bare_code_blocks(&mut root, is_banner, label_language), 1);

        let code = root.select_first(&Selector::parse("code").unwrap()).unwrap();
        assert_eq!(code.attr("class"), Some("language-bash"));
        // the python banner had no code before the next banner
        assert_eq!(root.select(&Selector::parse(".banner").unwrap()).len(), 1);
    }

    #[test]
    fn test_label_language_skips_buttons() {
        assert_eq!(label_language(&banner("TypeScript")), Some("typescript".to_string()));
        assert_eq!(label_language(&Node::element("div")), None);
    }
}
