//! HTML parsing into the arena document.
//!
//! html5ever drives the tree construction; [`Sink`] records its decisions
//! directly in a [`Document`].

use std::borrow::Cow;
use std::io::Read;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeBuilderOpts, TreeSink};
use html5ever::{Attribute, ExpandedName, LocalName, Namespace, ParseOpts, QualName};

use crate::dom::tree::{Document, ElementData, NodeData, NodeId, HTML_NAMESPACE};

/// Scripting flag shared by the parser and the serializer. It decides
/// whether `<noscript>` content is raw text.
pub(crate) const SCRIPTING_ENABLED: bool = true;

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: SCRIPTING_ENABLED,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Parse a complete HTML document.
pub fn parse_document<R: Read>(input: &mut R) -> std::io::Result<Document> {
    html5ever::parse_document(Sink::default(), parse_opts())
        .from_utf8()
        .read_from(input)
}

/// Parse `html` as the children of an element named `context`.
///
/// Returns the scratch document and the ids of the top-level fragment
/// nodes, in order.
pub fn parse_fragment(html: &str, context: &str) -> (Document, Vec<NodeId>) {
    let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(context));
    let doc = html5ever::parse_fragment(Sink::default(), parse_opts(), context, Vec::new())
        .one(StrTendril::from(html));

    // The fragment algorithm wraps the result in a synthetic <html> root.
    let nodes = doc
        .children(doc.root())
        .find(|&n| doc.is_element(n, "html"))
        .map(|html| doc.children(html).collect())
        .unwrap_or_default();
    (doc, nodes)
}

/// Tree builder target for html5ever.
#[derive(Default)]
pub struct Sink {
    doc: Document,
}

impl Sink {
    fn append_node(&mut self, parent: NodeId, child: NodeOrText<NodeId>) {
        match child {
            NodeOrText::AppendNode(node) => self.doc.append_child(parent, node),
            NodeOrText::AppendText(text) => self.doc.append_text(parent, &text),
        }
    }
}

impl TreeSink for Sink {
    type Handle = NodeId;
    type Output = Document;

    fn finish(self) -> Document {
        self.doc
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        tracing::trace!(error = %msg, "HTML parse error (recovered)");
    }

    fn get_document(&mut self) -> NodeId {
        self.doc.root()
    }

    fn elem_name<'a>(&'a self, target: &'a NodeId) -> ExpandedName<'a> {
        match self.doc.data(*target) {
            NodeData::Element(element) => element.name.expanded(),
            _ => unreachable!("html5ever asked for the name of a non-element"),
        }
    }

    fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> NodeId {
        let template_contents = flags
            .template
            .then(|| self.doc.create_node(NodeData::Document));
        self.doc.create_node(NodeData::Element(ElementData {
            name,
            attrs,
            template_contents,
        }))
    }

    fn create_comment(&mut self, text: StrTendril) -> NodeId {
        self.doc.create_node(NodeData::Comment(text.to_string()))
    }

    fn create_pi(&mut self, target: StrTendril, data: StrTendril) -> NodeId {
        self.doc.create_node(NodeData::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        })
    }

    fn append(&mut self, parent: &NodeId, child: NodeOrText<NodeId>) {
        self.append_node(*parent, child);
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &NodeId,
        prev_element: &NodeId,
        child: NodeOrText<NodeId>,
    ) {
        if self.doc.parent(*element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append_node(*prev_element, child);
        }
    }

    fn append_doctype_to_document(&mut self, name: StrTendril, public_id: StrTendril, system_id: StrTendril) {
        let doctype = self.doc.create_node(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
        let root = self.doc.root();
        self.doc.append_child(root, doctype);
    }

    fn get_template_contents(&mut self, target: &NodeId) -> NodeId {
        match self.doc.element(*target).and_then(|e| e.template_contents) {
            Some(contents) => contents,
            None => unreachable!("html5ever asked for the contents of a non-template"),
        }
    }

    fn same_node(&self, x: &NodeId, y: &NodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}

    fn append_before_sibling(&mut self, sibling: &NodeId, new_node: NodeOrText<NodeId>) {
        match new_node {
            NodeOrText::AppendNode(node) => self.doc.insert_before(*sibling, node),
            NodeOrText::AppendText(text) => {
                if let Some(prev) = self.doc.prev_sibling(*sibling) {
                    if let NodeData::Text(existing) = self.doc.data_mut(prev) {
                        existing.push_str(&text);
                        return;
                    }
                }
                let node = self.doc.create_text(&text);
                self.doc.insert_before(*sibling, node);
            }
        }
    }

    fn add_attrs_if_missing(&mut self, target: &NodeId, attrs: Vec<Attribute>) {
        if let Some(element) = self.doc.element_mut(*target) {
            for attr in attrs {
                if !element.attrs.iter().any(|a| a.name == attr.name) {
                    element.attrs.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&mut self, target: &NodeId) {
        self.doc.detach(*target);
    }

    fn reparent_children(&mut self, node: &NodeId, new_parent: &NodeId) {
        self.doc.reparent_children(*node, *new_parent);
    }
}
