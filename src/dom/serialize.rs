//! HTML serialization of the arena document.
//!
//! html5ever's serializer owns the escaping, void-element and raw-text
//! rules; [`SerializableNode`] walks the arena for it.

use std::io::{self, Write};

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope};

use crate::dom::parse::SCRIPTING_ENABLED;
use crate::dom::tree::{Document, NodeData, NodeId, HTML_NAMESPACE};

/// Elements whose first newline the parser drops.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// A node of a [`Document`] as html5ever's serializer sees it.
pub struct SerializableNode<'a> {
    doc: &'a Document,
    node: NodeId,
}

impl<'a> SerializableNode<'a> {
    pub fn new(doc: &'a Document, node: NodeId) -> Self {
        Self { doc, node }
    }

    fn write_node<S: Serializer>(&self, serializer: &mut S, node: NodeId) -> io::Result<()> {
        match self.doc.data(node) {
            NodeData::Document => self.write_children(serializer, node),
            NodeData::Doctype { name, .. } => serializer.write_doctype(name),
            NodeData::Text(text) => serializer.write_text(text),
            NodeData::Comment(text) => serializer.write_comment(text),
            NodeData::ProcessingInstruction { target, data } => {
                serializer.write_processing_instruction(target, data)
            }
            NodeData::Element(element) => {
                serializer.start_elem(
                    element.name.clone(),
                    element.attrs.iter().map(|a| (&a.name, &*a.value)),
                )?;

                if &*element.name.ns == HTML_NAMESPACE
                    && LEADING_NEWLINE_ELEMENTS.contains(&element.tag())
                    && self.starts_with_newline(node)
                {
                    serializer.write_text("\n")?;
                }

                self.write_children(serializer, element.template_contents.unwrap_or(node))?;
                serializer.end_elem(element.name.clone())
            }
        }
    }

    fn write_children<S: Serializer>(&self, serializer: &mut S, node: NodeId) -> io::Result<()> {
        for child in self.doc.children(node) {
            self.write_node(serializer, child)?;
        }
        Ok(())
    }

    fn starts_with_newline(&self, node: NodeId) -> bool {
        match self.doc.first_child(node).map(|child| self.doc.data(child)) {
            Some(NodeData::Text(text)) => text.starts_with('\n'),
            _ => false,
        }
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: &mut S, scope: TraversalScope) -> io::Result<()> {
        match scope {
            TraversalScope::IncludeNode => self.write_node(serializer, self.node),
            TraversalScope::ChildrenOnly(_) => self.write_children(serializer, self.node),
        }
    }
}

fn serialize_opts(scope: TraversalScope) -> SerializeOpts {
    SerializeOpts {
        scripting_enabled: SCRIPTING_ENABLED,
        traversal_scope: scope,
        ..Default::default()
    }
}

/// Serialize the whole document.
pub fn serialize_document(doc: &Document) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let root = SerializableNode::new(doc, doc.root());
    html5ever::serialize(&mut out, &root, serialize_opts(TraversalScope::ChildrenOnly(None)))?;
    Ok(out)
}

/// Serialize `node` and its subtree.
pub fn serialize_node<W: Write>(doc: &Document, node: NodeId, out: &mut W) -> io::Result<()> {
    let node = SerializableNode::new(doc, node);
    html5ever::serialize(out, &node, serialize_opts(TraversalScope::IncludeNode))
}
