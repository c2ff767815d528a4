// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Build-completion pipeline
//!
//! Hashes the bundle, injects the browser runtime into entry chunks and
//! rewrites every emitted HTML file. With the runtime enabled hashing runs in
//! two passes: the runtime embeds the tokens of non-entry artifacts, and the
//! entry chunks are hashed only after the runtime has been prepended.

mod stage;

pub use stage::{PipelineStage, PipelineSummary};

use crate::bundle::{Bundle, DynamicChunkSet, DynamicImportResolver};
use crate::config::SriConfig;
use crate::error::{Error, Result};
use crate::html::HtmlAugmenter;
use crate::integrity::{IntegrityMap, IntegrityMapBuilder, MapOptions};
use crate::locator::ResourceLocator;
use crate::runtime::RuntimePatch;

/// Orchestrates one build's integrity processing
pub struct Pipeline {
    config: SriConfig,
    locator: ResourceLocator,
    resolver: DynamicImportResolver,
    stage: PipelineStage,
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    /// Pipeline with an HTTP-backed locator
    pub fn new(config: SriConfig) -> Result<Self> {
        let locator = ResourceLocator::new(config.locator_options())?;
        Ok(Self::with_locator(config, locator))
    }

    pub fn with_locator(config: SriConfig, locator: ResourceLocator) -> Self {
        Self {
            config,
            locator,
            resolver: DynamicImportResolver::new(),
            stage: PipelineStage::Idle,
            stages: Vec::new(),
        }
    }

    /// Replace the dynamic import resolver
    pub fn with_resolver(mut self, resolver: DynamicImportResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &SriConfig {
        &self.config
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// Current state
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Run every stage over `bundle`, mutating entry chunks and HTML assets
    ///
    /// Per-element problems are logged and skipped. Anything else aborts the
    /// run and is returned as [`Error::Pipeline`] naming the stage. Remote
    /// payloads cached by a previous run are discarded first.
    pub async fn run(&mut self, bundle: &mut Bundle) -> Result<PipelineSummary> {
        self.locator.clear();
        self.stage = PipelineStage::Idle;
        self.stages = vec![PipelineStage::Idle];

        match self.execute(bundle).await {
            Ok(mut summary) => {
                self.enter(PipelineStage::Done);
                summary.stages = self.stages.clone();
                tracing::info!(
                    assets_hashed = summary.assets_hashed,
                    html_updated = summary.html_updated,
                    preloads_injected = summary.preloads_injected,
                    runtime_injected = summary.runtime_injected,
                    dynamic_chunks = summary.dynamic_chunks,
                    "SRI processing complete"
                );
                Ok(summary)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Augment a single HTML source against an already processed bundle
    pub async fn transform_html(&self, html: &str, bundle: &Bundle) -> Result<String> {
        let map = IntegrityMapBuilder::new(self.config.algorithm).build(bundle, MapOptions::all())?;
        let dynamic = self.resolver.resolve(bundle);
        let outcome = self.augmenter().augment(html, bundle, &map, &dynamic).await?;
        Ok(outcome.html)
    }

    async fn execute(&mut self, bundle: &mut Bundle) -> Result<PipelineSummary> {
        let mut summary = PipelineSummary::default();

        let map = self.hash(bundle, &mut summary)?;
        summary.assets_hashed = map.len();

        self.enter(PipelineStage::ResolvingDynamicImports);
        let dynamic = self.resolver.resolve(bundle);
        summary.dynamic_chunks = dynamic.len();

        self.enter(PipelineStage::AugmentingHtml);
        self.augment_all(bundle, &map, &dynamic, &mut summary).await?;

        Ok(summary)
    }

    fn hash(&mut self, bundle: &mut Bundle, summary: &mut PipelineSummary) -> Result<IntegrityMap> {
        let builder = IntegrityMapBuilder::new(self.config.algorithm);

        if !self.config.runtime_patch {
            self.enter(PipelineStage::HashingAll);
            return builder.build(bundle, MapOptions::all());
        }

        self.enter(PipelineStage::HashingNonEntry);
        let non_entry = builder.build(bundle, MapOptions::non_entry())?;

        self.enter(PipelineStage::InjectingRuntime);
        let runtime = RuntimePatch::from_config(non_entry.clone(), &self.config).render()?;
        for chunk in bundle.chunks_mut().filter(|c| c.is_entry) {
            chunk.code.insert_str(0, &runtime);
            summary.runtime_injected += 1;
            tracing::debug!(file = %chunk.file_name, "Injected runtime");
        }

        // entry tokens must cover the injected runtime
        self.enter(PipelineStage::HashingEntry);
        let entry = builder.build(bundle, MapOptions::entry_only())?;

        Ok(non_entry.merge(entry))
    }

    async fn augment_all(
        &self,
        bundle: &mut Bundle,
        map: &IntegrityMap,
        dynamic: &DynamicChunkSet,
        summary: &mut PipelineSummary,
    ) -> Result<()> {
        let html_files = bundle.html_files();
        if html_files.is_empty() {
            if self.config.ssr_build {
                tracing::warn!("No HTML emitted by server-rendering build, only chunks were processed");
            } else {
                tracing::debug!("No HTML emitted");
            }
            return Ok(());
        }

        let augmenter = self.augmenter();
        for file in html_files {
            let Some(source) = bundle
                .get(&file)
                .map(|a| String::from_utf8_lossy(a.content()).into_owned())
            else {
                continue;
            };

            let outcome = augmenter.augment(&source, bundle, map, dynamic).await?;
            summary.preloads_injected += outcome.preloads_injected;
            if outcome.html != source {
                bundle.set_asset_payload(&file, outcome.html);
                summary.html_updated += 1;
                tracing::debug!(%file, elements = outcome.elements_updated, "Updated HTML");
            }
        }
        Ok(())
    }

    fn augmenter(&self) -> HtmlAugmenter {
        HtmlAugmenter::new(self.config.clone(), self.locator.clone())
    }

    fn enter(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid pipeline transition {:?} -> {:?}",
            self.stage,
            next
        );
        tracing::trace!(from = %self.stage, to = %next, "Pipeline transition");
        self.stage = next;
        self.stages.push(next);
    }

    /// Record the failure and wrap it with the stage it happened in
    fn fail(&mut self, err: Error) -> Error {
        let stage = self.stage;
        if self.config.verbose {
            tracing::error!(%stage, error = ?err, "SRI pipeline failed");
        } else {
            tracing::error!(%stage, error = %err, "SRI pipeline failed");
        }
        self.enter(PipelineStage::Failed);
        Error::pipeline(stage, err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::bundle::{Asset, Chunk};
    use crate::integrity::{compute_integrity, HashAlgorithm};
    use crate::locator::RemoteFetcher;

    struct Offline;

    #[async_trait]
    impl RemoteFetcher for Offline {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            Err(Error::fetch(url, None, "offline"))
        }
    }

    /// Serves a new version of every URL on each request
    struct VersionedFetcher {
        version: AtomicUsize,
    }

    #[async_trait]
    impl RemoteFetcher for VersionedFetcher {
        async fn fetch(&self, _url: &str) -> Result<Bytes> {
            let n = self.version.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(format!("cdn v{}", n)))
        }
    }

    fn pipeline(config: SriConfig) -> Pipeline {
        let locator = ResourceLocator::with_fetcher(Arc::new(Offline), config.locator_options());
        Pipeline::with_locator(config, locator)
    }

    fn sha(content: &str) -> String {
        compute_integrity(content, HashAlgorithm::Sha256)
    }

    const INDEX: &str = "<!DOCTYPE html><html><head></head><body>\
                         <script type=\"module\" src=\"/main.js\"></script></body></html>";

    fn bundle() -> Bundle {
        Bundle::new()
            .with(
                Chunk::new("main.js", "console.log(1)")
                    .entry(true)
                    .dynamic_import("lazy.js"),
            )
            .with(Chunk::new("lazy.js", "console.log(2)"))
            .with(Asset::new("index.html", INDEX))
    }

    #[tokio::test]
    async fn test_two_pass_hashing() {
        let config = SriConfig::new().algorithm(HashAlgorithm::Sha256);
        let mut bundle = bundle();
        let mut pipeline = pipeline(config.clone());

        let summary = pipeline.run(&mut bundle).await.unwrap();

        let lazy_token = sha("console.log(2)");
        let non_entry: IntegrityMap = [("/lazy.js".to_string(), lazy_token.clone())]
            .into_iter()
            .collect();
        let runtime = RuntimePatch::from_config(non_entry, &config).render().unwrap();

        let main = bundle.chunk("main.js").unwrap();
        assert_eq!(main.code, format!("{}console.log(1)", runtime));
        assert!(main.code.contains(&format!("{{\"/lazy.js\":\"{}\"}}", lazy_token)));
        assert_eq!(bundle.chunk("lazy.js").unwrap().code, "console.log(2)");

        let main_token = sha(&main.code);
        assert_ne!(main_token, sha("console.log(1)"));

        let html = bundle.get("index.html").unwrap().content();
        let html = std::str::from_utf8(html).unwrap();
        assert!(html.contains(&format!(
            "<script type=\"module\" src=\"/main.js\" integrity=\"{}\"></script>",
            main_token
        )));
        assert!(html.contains(&format!(
            "<head><link rel=\"modulepreload\" href=\"/lazy.js\" integrity=\"{}\"></head>",
            lazy_token
        )));

        assert_eq!(
            summary,
            PipelineSummary {
                assets_hashed: 2,
                html_updated: 1,
                preloads_injected: 1,
                runtime_injected: 1,
                dynamic_chunks: 1,
                stages: vec![
                    PipelineStage::Idle,
                    PipelineStage::HashingNonEntry,
                    PipelineStage::InjectingRuntime,
                    PipelineStage::HashingEntry,
                    PipelineStage::ResolvingDynamicImports,
                    PipelineStage::AugmentingHtml,
                    PipelineStage::Done,
                ],
            }
        );
        assert_eq!(pipeline.stage(), PipelineStage::Done);
    }

    #[tokio::test]
    async fn test_single_pass_without_runtime() {
        let config = SriConfig::new()
            .algorithm(HashAlgorithm::Sha256)
            .runtime_patch(false);
        let mut bundle = bundle();

        let summary = pipeline(config).run(&mut bundle).await.unwrap();

        assert_eq!(bundle.chunk("main.js").unwrap().code, "console.log(1)");
        assert_eq!(summary.runtime_injected, 0);
        assert_eq!(
            summary.stages,
            vec![
                PipelineStage::Idle,
                PipelineStage::HashingAll,
                PipelineStage::ResolvingDynamicImports,
                PipelineStage::AugmentingHtml,
                PipelineStage::Done,
            ]
        );

        let html = String::from_utf8_lossy(bundle.get("index.html").unwrap().content()).into_owned();
        assert!(html.contains(&sha("console.log(1)")));
    }

    #[tokio::test]
    async fn test_transform_is_idempotent() {
        let mut bundle = bundle();
        let mut pipeline = pipeline(SriConfig::new().algorithm(HashAlgorithm::Sha256));
        pipeline.run(&mut bundle).await.unwrap();

        let once = String::from_utf8_lossy(bundle.get("index.html").unwrap().content()).into_owned();
        let twice = pipeline.transform_html(&once, &bundle).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_missing_resource_leaves_tag_untouched() {
        let source = "<html><head><script src=\"/missing.js\"></script></head><body></body></html>";
        let mut bundle = Bundle::new().with(Asset::new("index.html", source));

        let summary = pipeline(SriConfig::new()).run(&mut bundle).await.unwrap();

        assert_eq!(summary.html_updated, 0);
        assert_eq!(bundle.get("index.html").unwrap().content(), source.as_bytes());
    }

    #[tokio::test]
    async fn test_skip_patterns_and_unresolved_imports() {
        let config = SriConfig::new()
            .skip_resources(["/main.js"])
            .unwrap();
        let mut bundle = bundle().with(
            Chunk::new("other.js", "import('./nowhere')").dynamic_import("/src/nowhere.ts"),
        );

        let summary = pipeline(config).run(&mut bundle).await.unwrap();

        let html = String::from_utf8_lossy(bundle.get("index.html").unwrap().content()).into_owned();
        assert!(html.contains("<script type=\"module\" src=\"/main.js\"></script>"));
        assert_eq!(summary.dynamic_chunks, 1);
        assert_eq!(summary.preloads_injected, 1);
    }

    #[tokio::test]
    async fn test_ssr_build_without_html() {
        let mut bundle = Bundle::new().with(Chunk::new("server.js", "export {}").entry(true));
        let summary = pipeline(SriConfig::new().ssr_build(true))
            .run(&mut bundle)
            .await
            .unwrap();

        assert_eq!(summary.html_updated, 0);
        assert_eq!(summary.runtime_injected, 1);
        assert_eq!(summary.stages.last(), Some(&PipelineStage::Done));
    }

    #[tokio::test]
    async fn test_rebuild_refetches_remote_resources() {
        let fetcher = Arc::new(VersionedFetcher {
            version: AtomicUsize::new(0),
        });
        let config = SriConfig::new().algorithm(HashAlgorithm::Sha256);
        let locator = ResourceLocator::with_fetcher(fetcher.clone(), config.locator_options());
        let mut pipeline = Pipeline::with_locator(config, locator);

        let source = "<html><head><script src=\"https://cdn.example.com/lib.js\"></script></head><body></body></html>";
        let mut outputs = Vec::new();
        for _ in 0..2 {
            let mut bundle = Bundle::new().with(Asset::new("index.html", source));
            pipeline.run(&mut bundle).await.unwrap();
            outputs.push(String::from_utf8_lossy(bundle.get("index.html").unwrap().content()).into_owned());
        }

        assert_eq!(fetcher.version.load(Ordering::SeqCst), 2);
        assert!(outputs[0].contains(&sha("cdn v0")));
        assert!(outputs[1].contains(&sha("cdn v1")));
        assert!(!outputs[1].contains(&sha("cdn v0")));
    }

    #[test]
    fn test_failure_records_stage() {
        let mut pipeline = pipeline(SriConfig::new());
        pipeline.enter(PipelineStage::HashingNonEntry);
        pipeline.enter(PipelineStage::InjectingRuntime);

        let err = pipeline.fail(Error::other("boom"));

        assert_eq!(pipeline.stage(), PipelineStage::Failed);
        assert_eq!(err.stage(), Some(PipelineStage::InjectingRuntime));
        assert_eq!(
            err.to_string(),
            "SRI pipeline failed while injecting runtime: boom"
        );
    }
}
