// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Integrity attributes and modulepreload injection for emitted HTML

use futures::future::join_all;

use super::preload::{existing_modulepreloads, join_base, modulepreload_link};
use crate::bundle::{Bundle, DynamicChunkSet};
use crate::config::{ExistingIntegrity, SriConfig};
use crate::dom::{parse_html, Document, Element};
use crate::error::Result;
use crate::integrity::{compute_integrity, IntegrityMap};
use crate::locator::ResourceLocator;

/// `as` values that make `<link rel=preload>` eligible
const PRELOAD_DESTINATIONS: &[&str] = &["script", "style", "font"];

/// Candidates before the rel/as filter in [`eligible_url`]
const CANDIDATE_SELECTOR: &str = "script[src], link[href]";

/// Per-element decisions at info level when verbose, debug otherwise
macro_rules! decision {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

/// Result of augmenting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentOutcome {
    /// Serialized document
    pub html: String,
    /// Elements that received an integrity attribute
    pub elements_updated: usize,
    /// modulepreload links added to the head
    pub preloads_injected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementOutcome {
    Updated,
    Skipped,
    NotFound,
    Failed,
}

/// Adds `integrity`/`crossorigin` to script and link elements
#[derive(Clone)]
pub struct HtmlAugmenter {
    config: SriConfig,
    locator: ResourceLocator,
}

impl HtmlAugmenter {
    pub fn new(config: SriConfig, locator: ResourceLocator) -> Self {
        Self { config, locator }
    }

    pub fn config(&self) -> &SriConfig {
        &self.config
    }

    /// Augment one HTML source
    ///
    /// Per-element failures are logged and leave the element as it was; only
    /// an unreadable document is an error.
    pub async fn augment(
        &self,
        html: &str,
        bundle: &Bundle,
        map: &IntegrityMap,
        dynamic_chunks: &DynamicChunkSet,
    ) -> Result<AugmentOutcome> {
        let mut doc = parse_html(html)?;

        let candidates: Vec<(Element, String)> = doc
            .select(CANDIDATE_SELECTOR)?
            .into_iter()
            .filter_map(|el| eligible_url(&el).map(|url| (el, url)))
            .collect();

        let outcomes = join_all(
            candidates
                .iter()
                .map(|(el, url)| self.process_element(el, url, bundle)),
        )
        .await;
        let elements_updated = outcomes
            .iter()
            .filter(|o| **o == ElementOutcome::Updated)
            .count();

        let preloads_injected = if self.config.preload_dynamic_chunks {
            self.inject_preloads(&mut doc, map, dynamic_chunks)
        } else {
            0
        };

        Ok(AugmentOutcome {
            html: doc.to_html(),
            elements_updated,
            preloads_injected,
        })
    }

    async fn process_element(&self, el: &Element, url: &str, bundle: &Bundle) -> ElementOutcome {
        let verbose = self.config.verbose;
        let tag = el.local_name();

        if self
            .config
            .skip
            .is_skipped(el.id().as_deref(), Some(url))
        {
            decision!(verbose, %tag, %url, "Skipping element matched by skip pattern");
            return ElementOutcome::Skipped;
        }

        if self.config.existing_integrity == ExistingIntegrity::Preserve
            && el.has_attribute("integrity")
        {
            decision!(verbose, %tag, %url, "Preserving existing integrity");
            return ElementOutcome::Skipped;
        }

        let payload = match self.locator.load(url, bundle).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                decision!(verbose, %tag, %url, "Resource not found in bundle, leaving element unchanged");
                return ElementOutcome::NotFound;
            }
            Err(e) => {
                if verbose {
                    tracing::error!(%tag, %url, error = ?e, "Failed to load resource");
                } else {
                    tracing::error!(%tag, %url, error = %e, "Failed to load resource");
                }
                return ElementOutcome::Failed;
            }
        };

        let token = compute_integrity(&payload, self.config.algorithm);
        el.set_attribute("integrity", token.as_str());
        if let Some(cors) = self.config.crossorigin {
            el.set_attribute("crossorigin", cors.as_str());
        }
        decision!(verbose, %tag, %url, integrity = %token, "Applied integrity");
        ElementOutcome::Updated
    }

    fn inject_preloads(
        &self,
        doc: &mut Document,
        map: &IntegrityMap,
        dynamic_chunks: &DynamicChunkSet,
    ) -> usize {
        let existing = existing_modulepreloads(doc);
        let head = doc.ensure_head();
        let mut injected = 0;

        // prepending in reverse keeps the links sorted
        for file in dynamic_chunks.iter().rev() {
            let href = join_base(&self.config.base, file);
            if existing.iter().any(|h| *h == href) {
                decision!(self.config.verbose, %href, "modulepreload already present");
                continue;
            }
            let Some(token) = map.for_file(file) else {
                tracing::warn!(%file, "No integrity for dynamic chunk, skipping modulepreload");
                continue;
            };

            let link = modulepreload_link(doc, &href, token, self.config.crossorigin);
            head.prepend_child(&link);
            decision!(self.config.verbose, %href, "Injected modulepreload");
            injected += 1;
        }

        injected
    }
}

/// Resource URL of an element that should carry integrity
///
/// `<script src>`, and `<link href>` whose rel is `stylesheet` or
/// `modulepreload`, or `preload` with `as` of script, style or font.
fn eligible_url(el: &Element) -> Option<String> {
    let (attr, eligible) = match el.local_name().as_str() {
        "script" => ("src", true),
        "link" => {
            let rel = el.attribute_tokens("rel");
            let has = |t: &str| rel.iter().any(|r| r == t);
            let preload = has("preload")
                && el
                    .get_attribute("as")
                    .map(|a| PRELOAD_DESTINATIONS.contains(&a.trim().to_ascii_lowercase().as_str()))
                    .unwrap_or(false);
            ("href", has("stylesheet") || has("modulepreload") || preload)
        }
        _ => return None,
    };
    if !eligible {
        return None;
    }
    el.get_attribute(attr)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::bundle::{Asset, Chunk};
    use crate::config::CrossOrigin;
    use crate::error::Error;
    use crate::integrity::HashAlgorithm;
    use crate::locator::RemoteFetcher;

    struct StaticFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> crate::error::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("/broken.js") {
                return Err(Error::fetch(url, Some(500), "Internal Server Error"));
            }
            Ok(Bytes::from_static(b"cdn()"))
        }
    }

    fn augmenter(config: SriConfig) -> (HtmlAugmenter, Arc<StaticFetcher>) {
        let fetcher = Arc::new(StaticFetcher {
            calls: AtomicUsize::new(0),
        });
        let locator = ResourceLocator::with_fetcher(fetcher.clone(), config.locator_options());
        (HtmlAugmenter::new(config, locator), fetcher)
    }

    fn bundle() -> Bundle {
        Bundle::new()
            .with(Chunk::new("assets/main.js", "main()").entry(true))
            .with(Chunk::new("assets/lazy.js", "lazy()"))
            .with(Asset::new("assets/style.css", "body{}"))
            .with(Asset::new("assets/font.woff2", vec![0u8, 1, 2]))
    }

    fn sha(content: &str) -> String {
        compute_integrity(content, HashAlgorithm::Sha256)
    }

    fn config() -> SriConfig {
        SriConfig::new().algorithm(HashAlgorithm::Sha256)
    }

    #[tokio::test]
    async fn test_adds_integrity_to_eligible_elements() {
        let (augmenter, _) = augmenter(config().crossorigin(Some(CrossOrigin::Anonymous)));
        let html = r#"<html><head>
<script type="module" src="/assets/main.js"></script>
<link rel="stylesheet" href="/assets/style.css">
<link rel="preload" as="font" href="/assets/font.woff2">
<link rel="preload" as="image" href="/assets/style.css">
<link rel="icon" href="/assets/style.css">
<script>inline()</script>
</head><body></body></html>"#;

        let out = augmenter
            .augment(html, &bundle(), &IntegrityMap::new(), &BTreeSet::new())
            .await
            .unwrap();
        let doc = parse_html(&out.html).unwrap();

        let script = doc.query_selector("script[src]").unwrap();
        assert_eq!(script.get_attribute("integrity"), Some(sha("main()")));
        assert_eq!(script.get_attribute("crossorigin").as_deref(), Some("anonymous"));

        let css = doc.query_selector("link[rel=stylesheet]").unwrap();
        assert_eq!(css.get_attribute("integrity"), Some(sha("body{}")));

        let font = doc.query_selector("link[as=font]").unwrap();
        assert!(font.get_attribute("integrity").unwrap().starts_with("sha256-"));

        assert!(!doc.query_selector("link[as=image]").unwrap().has_attribute("integrity"));
        assert!(!doc.query_selector("link[rel=icon]").unwrap().has_attribute("integrity"));
        assert_eq!(out.elements_updated, 3);
    }

    #[tokio::test]
    async fn test_unresolvable_and_failing_elements_are_left_alone() {
        let (augmenter, fetcher) = augmenter(config());
        let html = r#"<head>
<script src="/assets/missing.js"></script>
<script src="https://cdn.example.com/broken.js"></script>
<script src="https://cdn.example.com/ok.js"></script>
</head>"#;

        let out = augmenter
            .augment(html, &bundle(), &IntegrityMap::new(), &BTreeSet::new())
            .await
            .unwrap();
        let doc = parse_html(&out.html).unwrap();

        assert!(doc
            .query_selector("script[src=\"/assets/missing.js\"]")
            .unwrap()
            .get_attribute("integrity")
            .is_none());
        assert!(doc
            .query_selector("script[src$=\"broken.js\"]")
            .unwrap()
            .get_attribute("integrity")
            .is_none());
        assert_eq!(
            doc.query_selector("script[src$=\"ok.js\"]")
                .unwrap()
                .get_attribute("integrity"),
            Some(sha("cdn()"))
        );
        assert_eq!(out.elements_updated, 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_skip_patterns_and_preserve_policy() {
        let config = config()
            .existing_integrity(ExistingIntegrity::Preserve)
            .skip_resources(["analytics", "*/style.css"])
            .unwrap();
        let (augmenter, _) = augmenter(config);
        let html = r#"<head>
<script id="analytics" src="/assets/lazy.js"></script>
<link rel="stylesheet" href="/assets/style.css">
<script src="/assets/main.js" integrity="sha256-pinned"></script>
</head>"#;

        let out = augmenter
            .augment(html, &bundle(), &IntegrityMap::new(), &BTreeSet::new())
            .await
            .unwrap();
        let doc = parse_html(&out.html).unwrap();

        assert!(!doc.query_selector("#analytics").unwrap().has_attribute("integrity"));
        assert!(!doc
            .query_selector("link[rel=stylesheet]")
            .unwrap()
            .has_attribute("integrity"));
        assert_eq!(
            doc.query_selector("script[src=\"/assets/main.js\"]")
                .unwrap()
                .get_attribute("integrity")
                .as_deref(),
            Some("sha256-pinned")
        );
        assert_eq!(out.elements_updated, 0);
    }

    #[tokio::test]
    async fn test_recompute_overwrites_stale_integrity() {
        let (augmenter, _) = augmenter(config());
        let html = r#"<script src="/assets/main.js" integrity="sha256-stale"></script>"#;

        let out = augmenter
            .augment(html, &bundle(), &IntegrityMap::new(), &BTreeSet::new())
            .await
            .unwrap();
        assert!(out.html.contains(&sha("main()")));
        assert!(!out.html.contains("sha256-stale"));
    }

    #[tokio::test]
    async fn test_preload_injection_is_sorted_and_idempotent() {
        let (augmenter, _) = augmenter(config().base("/app/"));
        let bundle = bundle()
            .with(Chunk::new("assets/a.js", "a()"))
            .with(Chunk::new("assets/b.js", "b()"));
        let map: IntegrityMap = [
            ("/assets/a.js".to_string(), sha("a()")),
            ("/assets/b.js".to_string(), sha("b()")),
        ]
        .into_iter()
        .collect();
        let dynamic: DynamicChunkSet = ["assets/b.js", "assets/a.js", "assets/gone.js"]
            .into_iter()
            .map(String::from)
            .collect();

        let html = "<!DOCTYPE html><html><head><title>x</title></head><body></body></html>";
        let first = augmenter.augment(html, &bundle, &map, &dynamic).await.unwrap();
        assert_eq!(first.preloads_injected, 2);
        assert_eq!(
            first.html,
            format!(
                "<!DOCTYPE html><html><head>\
                 <link rel=\"modulepreload\" href=\"/app/assets/a.js\" integrity=\"{}\">\
                 <link rel=\"modulepreload\" href=\"/app/assets/b.js\" integrity=\"{}\">\
                 <title>x</title></head><body></body></html>",
                sha("a()"),
                sha("b()")
            )
        );

        let second = augmenter
            .augment(&first.html, &bundle, &map, &dynamic)
            .await
            .unwrap();
        assert_eq!(second.preloads_injected, 0);
        assert_eq!(second.html, first.html);
    }

    #[tokio::test]
    async fn test_preloads_disabled() {
        let (augmenter, _) = augmenter(config().preload_dynamic_chunks(false));
        let map: IntegrityMap = [("/assets/lazy.js".to_string(), sha("lazy()"))]
            .into_iter()
            .collect();
        let dynamic: DynamicChunkSet = ["assets/lazy.js".to_string()].into_iter().collect();

        let out = augmenter
            .augment("<head></head>", &bundle(), &map, &dynamic)
            .await
            .unwrap();
        assert_eq!(out.preloads_injected, 0);
        assert!(!out.html.contains("modulepreload"));
    }
}
