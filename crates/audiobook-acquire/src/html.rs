use crate::normalize;
use scraper::{ElementRef, Html, Node, Selector};
use std::ops::Deref;

/// A fetched catalog page: parsed document plus the URL it came from.
pub struct CatalogPage {
    pub document: Html,
    pub url: String,
}

impl CatalogPage {
    pub fn parse(html: &str, url: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            url: url.to_string(),
        }
    }

    /// Every element matching `css`, in document order.
    pub fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        self.document.select(&selector(css)).collect()
    }

    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        self.document.select(&selector(css)).next()
    }

    /// Text of the first element matching `css`, if it has any.
    pub fn first_text(&self, css: &str) -> Option<String> {
        self.select_first(css).and_then(element_text)
    }

    /// Non-empty `content` (or legacy `value`) of the first `<meta attr="name">`.
    pub fn meta(&self, attr: &str, name: &str) -> Option<String> {
        let tag = self.select_first(&format!(r#"meta[{attr}="{name}"]"#))?;
        let non_empty = |attr: &str| {
            tag.value()
                .attr(attr)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        non_empty("content").or_else(|| non_empty("value"))
    }
}

/// Compile a selector literal. Every selector in this crate is a constant
/// or built from one, so a parse failure is a programming error.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Trimmed, whitespace-collapsed text of an element, `None` when empty.
///
/// Each text fragment is trimmed and fragments are joined with a single
/// space, so inline markup (`<b>`, `<a>`) does not glue words together.
pub fn element_text(element: ElementRef) -> Option<String> {
    let mut fragments = Vec::new();
    collect_fragments(element.id(), element.tree(), &mut fragments);
    let text = normalize::normalize_text(&fragments.join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Collect all non-blank text fragments under a node, recursively.
fn collect_fragments(
    node_id: ego_tree::NodeId,
    tree: &ego_tree::Tree<Node>,
    fragments: &mut Vec<String>,
) {
    let Some(node) = tree.get(node_id) else {
        return;
    };

    for child in node.children() {
        match child.value() {
            Node::Text(t) => {
                let trimmed = t.deref().trim();
                if !trimmed.is_empty() {
                    fragments.push(trimmed.to_string());
                }
            }
            Node::Element(elem) => {
                if matches!(elem.name(), "script" | "style") {
                    continue;
                }
                collect_fragments(child.id(), tree, fragments);
            }
            _ => {}
        }
    }
}

/// The next sibling element of `element` with the given tag name.
pub fn next_sibling_named<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == name)
}
