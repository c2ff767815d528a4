// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Document representation

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::element::Element;
use super::node::{Node, NodeData, NodeId, NodeStore};
use super::selector::Selector;
use crate::error::Result;

/// HTML Document representation
#[derive(Debug, Clone)]
pub struct Document {
    /// Root node ID
    root_id: NodeId,
    /// Node storage
    pub(crate) nodes: NodeStore,
    /// Document element (<html>) ID
    document_element_id: Option<NodeId>,
    /// Head element ID
    head_id: Option<NodeId>,
    /// Body element ID
    body_id: Option<NodeId>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        let root_id = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root_id, NodeData::document());

        Self {
            root_id,
            nodes: Arc::new(RwLock::new(nodes)),
            document_element_id: None,
            head_id: None,
            body_id: None,
        }
    }

    /// Get the document element (<html>)
    pub fn document_element(&self) -> Option<Element> {
        self.document_element_id
            .and_then(|id| Element::from_id(id, self.nodes.clone()))
    }

    /// Get the <head> element
    pub fn head(&self) -> Option<Element> {
        self.head_id
            .and_then(|id| Element::from_id(id, self.nodes.clone()))
    }

    /// Get the <head> element, creating it as the first child of <html>
    /// (or of the document) when absent
    pub fn ensure_head(&mut self) -> Element {
        if let Some(head) = self.head() {
            return head;
        }

        let head = self.create_element("head");
        match self.document_element() {
            Some(html) => html.prepend_child(&head),
            None => self.root().append_child(&head.node),
        }
        self.head_id = Some(head.node.id);
        head
    }

    /// Get the <body> element
    pub fn body(&self) -> Option<Element> {
        self.body_id
            .and_then(|id| Element::from_id(id, self.nodes.clone()))
    }

    /// Set document element IDs (called during parsing)
    pub(crate) fn set_elements(
        &mut self,
        document_element: Option<NodeId>,
        head: Option<NodeId>,
        body: Option<NodeId>,
    ) {
        self.document_element_id = document_element;
        self.head_id = head;
        self.body_id = body;
    }

    /// Get the root node
    pub fn root(&self) -> Node {
        Node::new(self.root_id, self.nodes.clone())
    }

    /// Find all elements matching `selector` in document order
    pub fn select(&self, selector: &str) -> Result<Vec<Element>> {
        let sel = Selector::parse(selector)?;
        let mut results = Vec::new();
        for child in self.root().children().into_iter().filter_map(Element::new) {
            child.collect_matching(&sel, &mut results);
        }
        Ok(results)
    }

    /// Query selector - find first matching element
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        self.select(selector).ok()?.into_iter().next()
    }

    /// Query selector all - invalid selectors match nothing
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        self.select(selector).unwrap_or_default()
    }

    /// Create a new detached element
    pub fn create_element(&self, tag: &str) -> Element {
        let id = NodeId::new();
        self.nodes
            .write()
            .insert(id, NodeData::element(tag.to_ascii_lowercase()));
        Element {
            node: Node::new(id, self.nodes.clone()),
        }
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        self.root().inner_html()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_create_element() {
        let doc = Document::new();
        let link = doc.create_element("LINK");
        assert_eq!(link.local_name(), "link");
        assert!(link.parent_element().is_none());
    }

    #[test]
    fn test_ensure_head_on_empty_document() {
        let mut doc = Document::new();
        assert!(doc.head().is_none());
        let head = doc.ensure_head();
        assert_eq!(doc.head(), Some(head));
        assert_eq!(doc.to_html(), "<head></head>");
    }

    #[test]
    fn test_select_reports_invalid_selector() {
        let doc = parse_html("<p id='x'>hi</p>").unwrap();
        assert!(doc.select("p >").is_err());
        assert!(doc.query_selector_all("p >").is_empty());
        assert_eq!(doc.query_selector("#x").unwrap().text_content(), "hi");
    }
}
