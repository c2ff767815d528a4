// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM Node types

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared node storage of one document
pub(crate) type NodeStore = Arc<RwLock<HashMap<NodeId, NodeData>>>;

/// Elements that never have an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text children are emitted verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a new unique node ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    DocumentType,
}

/// Internal node data
#[derive(Debug)]
pub struct NodeData {
    pub node_type: NodeType,
    /// Tag name for elements, doctype name for doctypes
    pub tag_name: Option<String>,
    /// Text content (for text/comment nodes)
    pub text_content: Option<String>,
    /// Attributes in source order
    pub attributes: Vec<(String, String)>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    fn with_type(node_type: NodeType) -> Self {
        Self {
            node_type,
            tag_name: None,
            text_content: None,
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a new element node data
    pub fn element(tag_name: impl Into<String>) -> Self {
        let mut data = Self::with_type(NodeType::Element);
        data.tag_name = Some(tag_name.into());
        data
    }

    /// Create a new text node data
    pub fn text(content: impl Into<String>) -> Self {
        let mut data = Self::with_type(NodeType::Text);
        data.text_content = Some(content.into());
        data
    }

    /// Create a new comment node data
    pub fn comment(content: impl Into<String>) -> Self {
        let mut data = Self::with_type(NodeType::Comment);
        data.text_content = Some(content.into());
        data
    }

    /// Create a doctype node; `text_content` holds the public/system id suffix
    pub fn doctype(name: impl Into<String>, ids: Option<String>) -> Self {
        let mut data = Self::with_type(NodeType::DocumentType);
        data.tag_name = Some(name.into());
        data.text_content = ids;
        data
    }

    /// Create a new document node data
    pub fn document() -> Self {
        Self::with_type(NodeType::Document)
    }

    fn attribute(&self, name: &str) -> Option<&String> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

/// A reference to a node in the DOM tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Node ID
    pub id: NodeId,
    nodes: NodeStore,
}

impl Node {
    pub(crate) fn new(id: NodeId, nodes: NodeStore) -> Self {
        Self { id, nodes }
    }

    /// Get the node type
    pub fn node_type(&self) -> NodeType {
        self.nodes
            .read()
            .get(&self.id)
            .map(|n| n.node_type)
            .unwrap_or(NodeType::Element)
    }

    /// Get the tag name as parsed (lowercase for HTML elements)
    pub fn local_name(&self) -> Option<String> {
        let nodes = self.nodes.read();
        nodes
            .get(&self.id)
            .filter(|n| n.node_type == NodeType::Element)
            .and_then(|n| n.tag_name.clone())
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    /// Get text content
    pub fn text_content(&self) -> String {
        let nodes = self.nodes.read();
        collect_text(&nodes, self.id)
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.nodes
            .read()
            .get(&self.id)
            .and_then(|n| n.attribute(name).cloned())
    }

    /// Set an attribute value, keeping its position if it already exists
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        if let Some(node) = self.nodes.write().get_mut(&self.id) {
            match node.attributes.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => node.attributes.push((name, value)),
            }
        }
    }

    /// Check if has an attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.nodes
            .read()
            .get(&self.id)
            .map(|n| n.attribute(name).is_some())
            .unwrap_or(false)
    }

    /// Get all attributes in source order
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.nodes
            .read()
            .get(&self.id)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    /// Get parent node
    pub fn parent(&self) -> Option<Node> {
        self.nodes
            .read()
            .get(&self.id)
            .and_then(|n| n.parent)
            .map(|id| Node::new(id, self.nodes.clone()))
    }

    /// Get child nodes
    pub fn children(&self) -> Vec<Node> {
        self.nodes
            .read()
            .get(&self.id)
            .map(|n| {
                n.children
                    .iter()
                    .map(|&id| Node::new(id, self.nodes.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append a child node
    pub fn append_child(&self, child: &Node) {
        self.insert_child_at(child, None);
    }

    /// Insert a child node before all existing children
    pub fn prepend_child(&self, child: &Node) {
        self.insert_child_at(child, Some(0));
    }

    fn insert_child_at(&self, child: &Node, index: Option<usize>) {
        let mut nodes = self.nodes.write();

        let old_parent = nodes.get(&child.id).and_then(|d| d.parent);
        if let Some(old_pid) = old_parent {
            if let Some(old) = nodes.get_mut(&old_pid) {
                old.children.retain(|&id| id != child.id);
            }
        }

        if let Some(child_data) = nodes.get_mut(&child.id) {
            child_data.parent = Some(self.id);
        }

        if let Some(parent) = nodes.get_mut(&self.id) {
            match index {
                Some(i) => parent.children.insert(i.min(parent.children.len()), child.id),
                None => parent.children.push(child.id),
            }
        }
    }

    /// Get inner HTML
    pub fn inner_html(&self) -> String {
        let nodes = self.nodes.read();
        let mut out = String::new();
        if let Some(node) = nodes.get(&self.id) {
            let raw = is_raw_text_parent(node);
            for &id in &node.children {
                serialize_node(&nodes, id, raw, &mut out);
            }
        }
        out
    }

    /// Get outer HTML
    pub fn outer_html(&self) -> String {
        let nodes = self.nodes.read();
        let mut out = String::new();
        serialize_node(&nodes, self.id, false, &mut out);
        out
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn collect_text(nodes: &HashMap<NodeId, NodeData>, node_id: NodeId) -> String {
    match nodes.get(&node_id) {
        Some(node) => match node.node_type {
            NodeType::Text => node.text_content.clone().unwrap_or_default(),
            NodeType::Element | NodeType::Document => node
                .children
                .iter()
                .map(|&child| collect_text(nodes, child))
                .collect(),
            _ => String::new(),
        },
        None => String::new(),
    }
}

fn is_raw_text_parent(node: &NodeData) -> bool {
    node.node_type == NodeType::Element
        && node
            .tag_name
            .as_deref()
            .map(|t| RAW_TEXT_ELEMENTS.contains(&t))
            .unwrap_or(false)
}

/// Serialize a node following the HTML fragment serialization rules
fn serialize_node(
    nodes: &HashMap<NodeId, NodeData>,
    node_id: NodeId,
    raw_text: bool,
    out: &mut String,
) {
    let Some(node) = nodes.get(&node_id) else {
        return;
    };

    match node.node_type {
        NodeType::Text => {
            let text = node.text_content.as_deref().unwrap_or("");
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeType::Comment => {
            out.push_str("<!--");
            out.push_str(node.text_content.as_deref().unwrap_or(""));
            out.push_str("-->");
        }
        NodeType::DocumentType => {
            out.push_str("<!DOCTYPE ");
            out.push_str(node.tag_name.as_deref().unwrap_or("html"));
            if let Some(ref ids) = node.text_content {
                out.push_str(ids);
            }
            out.push('>');
        }
        NodeType::Element => {
            let tag = node.tag_name.as_deref().unwrap_or("div");
            out.push('<');
            out.push_str(tag);
            for (name, value) in &node.attributes {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            let raw = is_raw_text_parent(node);
            for &child in &node.children {
                serialize_node(nodes, child, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeType::Document => {
            for &child in &node.children {
                serialize_node(nodes, child, false, out);
            }
        }
    }
}

/// Escape an attribute value
fn escape_attribute(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

/// Escape text content
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> NodeStore {
        Arc::new(RwLock::new(HashMap::new()))
    }

    fn insert(store: &NodeStore, data: NodeData) -> Node {
        let id = NodeId::new();
        store.write().insert(id, data);
        Node::new(id, store.clone())
    }

    #[test]
    fn test_node_id() {
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn test_attribute_order_is_kept() {
        let store = store();
        let link = insert(&store, NodeData::element("link"));
        link.set_attribute("rel", "stylesheet");
        link.set_attribute("href", "/a.css");
        link.set_attribute("REL", "preload");

        assert_eq!(
            link.attributes(),
            vec![
                ("rel".to_string(), "preload".to_string()),
                ("href".to_string(), "/a.css".to_string())
            ]
        );
        assert_eq!(link.outer_html(), r#"<link rel="preload" href="/a.css">"#);
    }

    #[test]
    fn test_prepend_and_append() {
        let store = store();
        let head = insert(&store, NodeData::element("head"));
        let a = insert(&store, NodeData::element("meta"));
        let b = insert(&store, NodeData::element("link"));
        head.append_child(&a);
        head.prepend_child(&b);

        assert_eq!(head.inner_html(), "<link><meta>");
        assert_eq!(b.parent(), Some(head.clone()));
    }

    #[test]
    fn test_escaping() {
        let store = store();
        let p = insert(&store, NodeData::element("p"));
        p.set_attribute("title", "a \"b\" & c");
        let text = insert(&store, NodeData::text("1 < 2 & 3"));
        p.append_child(&text);
        assert_eq!(
            p.outer_html(),
            r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3</p>"#
        );

        let script = insert(&store, NodeData::element("script"));
        let code = insert(&store, NodeData::text("if (a < b && c) {}"));
        script.append_child(&code);
        assert_eq!(script.outer_html(), "<script>if (a < b && c) {}</script>");
    }
}
