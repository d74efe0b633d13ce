//! Arena-backed document tree.
//!
//! # Responsibilities
//! - Own every node of one parsed document
//! - Link nodes through parent/child/sibling ids instead of pointers
//! - Provide the small set of mutations transformers need
//!
//! # Design Decisions
//! - Nodes are never freed; detached nodes stay in the arena until the
//!   document is dropped at the end of the response
//! - `NodeId` is only meaningful for the document that issued it

use html5ever::{Attribute, LocalName, Namespace, QualName};

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    Element(ElementData),
}

/// Element name, attributes and (for `<template>`) content fragment.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub name: QualName,
    pub attrs: Vec<Attribute>,
    pub template_contents: Option<NodeId>,
}

impl ElementData {
    /// Local tag name.
    pub fn tag(&self) -> &str {
        &self.name.local
    }

    /// Value of the attribute `name` (no namespace).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.ns.is_empty() && &*a.name.local == name)
            .map(|a| &*a.value)
    }

    /// Set `name` to `value`, replacing an existing value in place or
    /// appending a new attribute.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.ns.is_empty() && &*a.name.local == name)
        {
            Some(attr) => attr.value = value.into(),
            None => self.attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: value.into(),
            }),
        }
    }

    /// Whether the space-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    data: NodeData,
}

/// A mutable HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only its root node.
    pub fn new() -> Self {
        let mut doc = Self { nodes: Vec::new() };
        doc.push(NodeData::Document);
        doc
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        });
        id
    }

    pub(crate) fn create_node(&mut self, data: NodeData) -> NodeId {
        self.push(data)
    }

    /// Create a detached HTML element with the given attributes, in order.
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut element = ElementData {
            name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag)),
            attrs: Vec::with_capacity(attrs.len()),
            template_contents: None,
        };
        for (name, value) in attrs {
            element.set_attr(name, value);
        }
        self.push(NodeData::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    /// Element payload, if `id` is an element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.data_mut(id) {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Whether `id` is an element with local name `tag`.
    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|e| e.tag() == tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev_sibling
    }

    /// Direct children of `id`, in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// `id` and all its descendants, pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: Some(id),
        }
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Unlink `id` from its parent and siblings.
    pub fn detach(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(prev) = prev {
            self.nodes[prev.0].next_sibling = next;
        } else if let Some(parent) = parent {
            self.nodes[parent.0].first_child = next;
        }
        if let Some(next) = next {
            self.nodes[next.0].prev_sibling = prev;
        } else if let Some(parent) = parent {
            self.nodes[parent.0].last_child = prev;
        }

        let node = &mut self.nodes[id.0];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.nodes[parent.0].last_child;

        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = last;
        match last {
            Some(last) => self.nodes[last.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
        self.nodes[parent.0].last_child = Some(child);
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, child),
            None => self.append_child(parent, child),
        }
    }

    /// Insert `child` immediately before `sibling`.
    ///
    /// Does nothing if `sibling` has no parent.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        self.detach(child);
        let prev = self.nodes[sibling.0].prev_sibling;

        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = prev;
        self.nodes[child.0].next_sibling = Some(sibling);
        self.nodes[sibling.0].prev_sibling = Some(child);
        match prev {
            Some(prev) => self.nodes[prev.0].next_sibling = Some(child),
            None => self.nodes[parent.0].first_child = Some(child),
        }
    }

    /// Detach every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    /// Move every child of `from` to the end of `to`.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        while let Some(child) = self.first_child(from) {
            self.append_child(to, child);
        }
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(last) = self.last_child(parent) {
            if let NodeData::Text(existing) = self.data_mut(last) {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_text(text);
        self.append_child(parent, node);
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.remove_children(id);
        let node = self.create_text(text);
        self.append_child(id, node);
    }

    /// Deep-copy `node` from another document into this one, detached.
    pub fn import(&mut self, other: &Document, node: NodeId) -> NodeId {
        let mut data = other.data(node).clone();
        if let NodeData::Element(element) = &mut data {
            element.template_contents = element
                .template_contents
                .map(|contents| self.import(other, contents));
        }
        let copy = self.push(data);
        for child in other.children(node) {
            let child_copy = self.import(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }
}

/// Iterator over direct children.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over a subtree, root included.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;

        self.next = self.doc.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.root {
                    return None;
                }
                if let Some(sibling) = self.doc.next_sibling(node) {
                    return Some(sibling);
                }
                node = self.doc.parent(node)?;
            }
        });

        Some(current)
    }
}
