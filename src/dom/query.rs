//! Read-only tree search helpers.

use crate::dom::tree::{Document, ElementData, NodeData, NodeId};

/// First element named `name` under `root` (pre-order, `root` included).
pub fn find_element_by_name(doc: &Document, name: &str, root: NodeId) -> Option<NodeId> {
    find_element_by_name_where(doc, name, root, |_| true)
}

/// First element named `name` under `root` that satisfies `predicate`.
pub fn find_element_by_name_where<F>(
    doc: &Document,
    name: &str,
    root: NodeId,
    predicate: F,
) -> Option<NodeId>
where
    F: Fn(&ElementData) -> bool,
{
    doc.descendants(root).find(|&node| {
        doc.element(node)
            .is_some_and(|e| e.tag() == name && predicate(e))
    })
}

/// First element under `root` whose `id` attribute equals `id`.
pub fn find_element_by_id(doc: &Document, id: &str, root: NodeId) -> Option<NodeId> {
    doc.descendants(root)
        .find(|&node| doc.element(node).and_then(|e| e.attr("id")) == Some(id))
}

/// Concatenated text of every descendant text node, in document order.
pub fn collect_text(doc: &Document, node: NodeId) -> String {
    let mut text = String::new();
    for n in doc.descendants(node) {
        if let NodeData::Text(t) = doc.data(n) {
            text.push_str(t);
        }
    }
    text
}

/// The document's `<head>` element.
pub fn head(doc: &Document) -> Option<NodeId> {
    find_element_by_name(doc, "head", doc.root())
}

/// The document's `<body>` element.
pub fn body(doc: &Document) -> Option<NodeId> {
    find_element_by_name(doc, "body", doc.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_document;

    fn parse(html: &str) -> Document {
        parse_document(&mut html.as_bytes()).unwrap()
    }

    #[test]
    fn test_find_first_in_preorder() {
        let doc = parse(r#"<div id="outer"><div id="inner"></div></div><div id="last"></div>"#);
        let found = find_element_by_name(&doc, "div", doc.root()).unwrap();
        assert_eq!(doc.element(found).unwrap().attr("id"), Some("outer"));
    }

    #[test]
    fn test_find_with_predicate() {
        let doc = parse(r#"<script src="a.js"></script><script type="importmap">{}</script>"#);
        let found = find_element_by_name_where(&doc, "script", doc.root(), |e| {
            e.attr("type") == Some("importmap")
        });
        assert!(found.is_some());

        let missing = find_element_by_name_where(&doc, "script", doc.root(), |e| {
            e.attr("type") == Some("module")
        });
        assert_eq!(missing, None);
    }

    #[test]
    fn test_find_by_id() {
        let doc = parse(r#"<section><main id="content"></main></section>"#);
        let found = find_element_by_id(&doc, "content", doc.root()).unwrap();
        assert!(doc.is_element(found, "main"));
        assert_eq!(find_element_by_id(&doc, "nope", doc.root()), None);
    }

    #[test]
    fn test_collect_text_document_order() {
        let doc = parse("<p>Hello, <b>World</b>!</p>");
        let p = find_element_by_name(&doc, "p", doc.root()).unwrap();
        assert_eq!(collect_text(&doc, p), "Hello, World!");
    }

    #[test]
    fn test_head_and_body() {
        let doc = parse("<p>x</p>");
        assert!(head(&doc).is_some());
        assert!(body(&doc).is_some());
    }
}
