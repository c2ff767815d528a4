// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML parser using html5ever

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use super::document::Document;
use super::node::{NodeData, NodeId};
use crate::error::{Error, Result};

/// Parse HTML string into a Document
///
/// Whitespace text, comments and the doctype are preserved so that
/// serializing an untouched document reproduces its content.
pub fn parse_html(html: &str) -> Result<Document> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| Error::html(format!("failed to read document: {}", e)))?;

    let mut doc = Document::new();
    DomConverter::new(&mut doc).convert(&dom.document);
    Ok(doc)
}

/// Converts html5ever DOM to our DOM
struct DomConverter<'a> {
    doc: &'a mut Document,
}

impl<'a> DomConverter<'a> {
    fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    fn convert(self, handle: &Handle) {
        let root_id = self.doc.root().id;

        let mut html_id = None;
        for child in handle.children.borrow().iter() {
            if let Some(id) = self.convert_node(child, root_id) {
                if self.tag_of(id).as_deref() == Some("html") {
                    html_id = Some(id);
                }
            }
        }

        let mut head_id = None;
        let mut body_id = None;
        if let Some(html) = html_id {
            let children = self
                .doc
                .nodes
                .read()
                .get(&html)
                .map(|d| d.children.clone())
                .unwrap_or_default();
            for child_id in children {
                match self.tag_of(child_id).as_deref() {
                    Some("head") if head_id.is_none() => head_id = Some(child_id),
                    Some("body") | Some("frameset") if body_id.is_none() => {
                        body_id = Some(child_id)
                    }
                    _ => {}
                }
            }
        }

        self.doc.set_elements(html_id, head_id, body_id);
    }

    fn tag_of(&self, id: NodeId) -> Option<String> {
        self.doc
            .nodes
            .read()
            .get(&id)
            .and_then(|d| d.tag_name.clone())
    }

    fn convert_node(&self, handle: &Handle, parent_id: NodeId) -> Option<NodeId> {
        let mut data = match handle.data {
            RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => return None,
            RcNodeData::Doctype {
                ref name,
                ref public_id,
                ref system_id,
            } => NodeData::doctype(name.to_string(), doctype_ids(public_id, system_id)),
            RcNodeData::Text { ref contents } => NodeData::text(contents.borrow().to_string()),
            RcNodeData::Comment { ref contents } => NodeData::comment(contents.to_string()),
            RcNodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let mut data = NodeData::element(name.local.to_string());
                data.attributes = attrs
                    .borrow()
                    .iter()
                    .map(|attr| (qualified_name(&attr.name), attr.value.to_string()))
                    .collect();
                data
            }
        };
        data.parent = Some(parent_id);

        let node_id = NodeId::new();
        {
            let mut nodes = self.doc.nodes.write();
            nodes.insert(node_id, data);
            if let Some(parent) = nodes.get_mut(&parent_id) {
                parent.children.push(node_id);
            }
        }

        // <template> content lives in a separate fragment
        if let RcNodeData::Element {
            ref template_contents,
            ..
        } = handle.data
        {
            if let Some(ref fragment) = *template_contents.borrow() {
                for child in fragment.children.borrow().iter() {
                    self.convert_node(child, node_id);
                }
            }
        }

        for child in handle.children.borrow().iter() {
            self.convert_node(child, node_id);
        }

        Some(node_id)
    }
}

fn qualified_name(name: &QualName) -> String {
    match name.prefix {
        Some(ref prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

fn doctype_ids(public_id: &str, system_id: &str) -> Option<String> {
    match (public_id.is_empty(), system_id.is_empty()) {
        (true, true) => None,
        (false, true) => Some(format!(" PUBLIC \"{}\"", public_id)),
        (false, false) => Some(format!(" PUBLIC \"{}\" \"{}\"", public_id, system_id)),
        (true, false) => Some(format!(" SYSTEM \"{}\"", system_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let doc = parse_html("<html><body><p>Hello</p></body></html>").unwrap();
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
        assert_eq!(doc.query_selector("p").unwrap().text_content(), "Hello");
    }

    #[test]
    fn test_round_trip_preserves_markup() {
        let html = "<!DOCTYPE html><html lang=\"en\"><head>\n  <meta charset=\"utf-8\">\n  \
                    <script type=\"module\" src=\"/assets/main.js\"></script>\n</head>\n\
                    <body>\n  <!-- app -->\n  <div id=\"app\" data-x=\"a &amp; b\"></div>\n\
                    <script>if (a < b) {}</script>\n\n</body></html>";
        let doc = parse_html(html).unwrap();
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_attribute_order_from_source() {
        let doc = parse_html(r#"<script type="module" crossorigin src="/a.js"></script>"#).unwrap();
        let script = doc.query_selector("script").unwrap();
        let names: Vec<_> = script.attributes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["type", "crossorigin", "src"]);
        assert_eq!(
            script.outer_html(),
            r#"<script type="module" crossorigin src="/a.js"></script>"#
        );
    }

    #[test]
    fn test_template_contents_kept() {
        let doc = parse_html("<body><template><script src=/t.js></script></template></body>")
            .unwrap();
        assert_eq!(
            doc.body().unwrap().inner_html(),
            "<template><script src=\"/t.js\"></script></template>"
        );
    }

    #[test]
    fn test_legacy_doctype() {
        let html = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
                    \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\"><html><head></head><body></body></html>";
        assert_eq!(parse_html(html).unwrap().to_html(), html);
    }
}
