// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Element-specific DOM operations

use super::node::{Node, NodeId, NodeStore, NodeType};
use super::selector::Selector;

/// Element node with extended operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Inner node reference
    pub node: Node,
}

impl Element {
    /// Create a new element from a node
    pub fn new(node: Node) -> Option<Self> {
        if node.node_type() == NodeType::Element {
            Some(Self { node })
        } else {
            None
        }
    }

    pub(crate) fn from_id(id: NodeId, nodes: NodeStore) -> Option<Self> {
        Self::new(Node::new(id, nodes))
    }

    /// Get local name (lowercase)
    pub fn local_name(&self) -> String {
        self.node.local_name().unwrap_or_default()
    }

    /// Get element ID
    pub fn id(&self) -> Option<String> {
        self.node.get_attribute("id")
    }

    /// Get an attribute
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.node.get_attribute(name)
    }

    /// Set an attribute
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.node.set_attribute(name, value);
    }

    /// Check if has attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.node.has_attribute(name)
    }

    /// Whitespace-separated tokens of an attribute, lowercased (`rel`, `class`)
    pub fn attribute_tokens(&self, name: &str) -> Vec<String> {
        self.node
            .get_attribute(name)
            .map(|v| v.split_whitespace().map(|t| t.to_ascii_lowercase()).collect())
            .unwrap_or_default()
    }

    /// Get parent element
    pub fn parent_element(&self) -> Option<Element> {
        self.node.parent().and_then(Element::new)
    }

    /// Get child elements (only element nodes)
    pub fn children(&self) -> Vec<Element> {
        self.node
            .children()
            .into_iter()
            .filter_map(Element::new)
            .collect()
    }

    /// Append a child element
    pub fn append_child(&self, child: &Element) {
        self.node.append_child(&child.node);
    }

    /// Insert a child element before all existing children
    pub fn prepend_child(&self, child: &Element) {
        self.node.prepend_child(&child.node);
    }

    /// Query selector all - matching descendants in document order
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        match Selector::parse(selector) {
            Ok(sel) => {
                let mut results = Vec::new();
                for child in self.children() {
                    child.collect_matching(&sel, &mut results);
                }
                results
            }
            Err(_) => Vec::new(),
        }
    }

    pub(crate) fn collect_matching(&self, selector: &Selector, results: &mut Vec<Element>) {
        if selector.matches(&self.node) {
            results.push(self.clone());
        }
        for child in self.children() {
            child.collect_matching(selector, results);
        }
    }

    /// Check if element matches a selector
    pub fn matches(&self, selector: &str) -> bool {
        Selector::parse(selector)
            .map(|sel| sel.matches(&self.node))
            .unwrap_or(false)
    }
}

impl std::ops::Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::parse_html;

    #[test]
    fn test_attribute_tokens() {
        let doc = parse_html(r#"<link rel="Preload  stylesheet" href="/a.css">"#).unwrap();
        let link = doc.query_selector("link").unwrap();
        assert_eq!(link.attribute_tokens("rel"), vec!["preload", "stylesheet"]);
        assert!(link.attribute_tokens("class").is_empty());
        assert!(link.matches("link[rel~=stylesheet]"));
    }

    #[test]
    fn test_scoped_query() {
        let doc = parse_html(
            "<head><script src=/a.js></script></head><body><script src=/b.js></script></body>",
        )
        .unwrap();
        let body = doc.body().unwrap();
        let scripts = body.query_selector_all("script[src]");
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].get_attribute("src").as_deref(), Some("/b.js"));
    }
}
