// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! modulepreload link construction

use crate::config::CrossOrigin;
use crate::dom::{Document, Element};

/// Public href of an emitted file under `base`
///
/// Never produces a double slash between the two parts and keeps the scheme
/// separator of absolute (`https://`) and protocol-relative (`//`) bases.
pub fn join_base(base: &str, file_name: &str) -> String {
    let file = file_name.trim_start_matches('/');
    let base = base.trim();

    if base.is_empty() || base.chars().all(|c| c == '/') {
        return format!("/{}", file);
    }

    let prefix = base.trim_end_matches('/');
    if prefix.ends_with(':') {
        // bare scheme such as `https://`
        return format!("{}//{}", prefix, file);
    }
    format!("{}/{}", prefix, file)
}

/// Existing `<link rel=modulepreload>` hrefs
pub(crate) fn existing_modulepreloads(doc: &Document) -> Vec<String> {
    doc.query_selector_all("link[href]")
        .into_iter()
        .filter(|link| link.attribute_tokens("rel").iter().any(|t| t == "modulepreload"))
        .filter_map(|link| link.get_attribute("href"))
        .collect()
}

/// Build a detached `<link rel="modulepreload">`
pub(crate) fn modulepreload_link(
    doc: &Document,
    href: &str,
    integrity: &str,
    crossorigin: Option<CrossOrigin>,
) -> Element {
    let link = doc.create_element("link");
    link.set_attribute("rel", "modulepreload");
    link.set_attribute("href", href);
    link.set_attribute("integrity", integrity);
    if let Some(cors) = crossorigin {
        link.set_attribute("crossorigin", cors.as_str());
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn test_join_base() {
        assert_eq!(join_base("/", "assets/a.js"), "/assets/a.js");
        assert_eq!(join_base("", "assets/a.js"), "/assets/a.js");
        assert_eq!(join_base("/app", "assets/a.js"), "/app/assets/a.js");
        assert_eq!(join_base("/app/", "/assets/a.js"), "/app/assets/a.js");
        assert_eq!(join_base("./", "a.js"), "./a.js");
        assert_eq!(
            join_base("https://cdn.example.com/", "a.js"),
            "https://cdn.example.com/a.js"
        );
        assert_eq!(join_base("//cdn.example.com//v2/", "a.js"), "//cdn.example.com//v2/a.js");
        assert_eq!(join_base("https://", "a.js"), "https://a.js");
    }

    #[test]
    fn test_modulepreload_link() {
        let doc = parse_html(r#"<head><link rel="modulepreload" href="/x.js"></head>"#).unwrap();
        let link = modulepreload_link(&doc, "/a.js", "sha384-abc", Some(CrossOrigin::Anonymous));
        assert_eq!(
            link.outer_html(),
            r#"<link rel="modulepreload" href="/a.js" integrity="sha384-abc" crossorigin="anonymous">"#
        );
        assert_eq!(existing_modulepreloads(&doc), vec!["/x.js"]);
    }
}
