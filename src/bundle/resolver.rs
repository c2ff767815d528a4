// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Dynamic import resolution
//!
//! Maps the opaque dynamic-import targets declared by each chunk to emitted
//! file names. Bundler metadata is often partial, so several lookup
//! strategies are tried in order and unresolved targets are reported rather
//! than treated as fatal.

use std::collections::{BTreeSet, HashMap};

use super::artifact::Bundle;

/// File names of chunks reachable through dynamic imports
pub type DynamicChunkSet = BTreeSet<String>;

/// Module identifier to containing chunk file name
///
/// Keys are facade module ids, chunk names and contained module ids. When two
/// chunks claim the same key the later one (in file name order) wins.
#[derive(Debug, Clone, Default)]
pub struct ModuleIdIndex {
    entries: HashMap<String, String>,
}

impl ModuleIdIndex {
    /// Index every chunk in the bundle
    pub fn build(bundle: &Bundle) -> Self {
        let mut entries = HashMap::new();

        for chunk in bundle.chunks() {
            let file = &chunk.file_name;
            if let Some(ref facade) = chunk.facade_module_id {
                entries.insert(facade.clone(), file.clone());
            }
            if let Some(ref name) = chunk.name {
                entries.insert(name.clone(), file.clone());
            }
            for id in &chunk.module_ids {
                entries.insert(id.clone(), file.clone());
            }
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inputs available to a resolution strategy
pub struct ResolveContext<'a> {
    pub bundle: &'a Bundle,
    pub index: &'a ModuleIdIndex,
}

/// A single lookup strategy; returns the resolved file name
pub type ResolveStrategy = fn(&ResolveContext<'_>, &str) -> Option<String>;

/// Direct module id index lookup
fn by_module_index(ctx: &ResolveContext<'_>, target: &str) -> Option<String> {
    ctx.index.get(target).map(str::to_string)
}

/// The target is itself a chunk's file name
fn by_bundle_key(ctx: &ResolveContext<'_>, target: &str) -> Option<String> {
    ctx.bundle.chunk(target).map(|c| c.file_name.clone())
}

/// A chunk whose logical name equals the target
fn by_chunk_name(ctx: &ResolveContext<'_>, target: &str) -> Option<String> {
    ctx.bundle
        .chunks()
        .find(|c| c.name.as_deref() == Some(target))
        .map(|c| c.file_name.clone())
}

/// Strategies in the order they are tried
pub const DEFAULT_STRATEGIES: &[ResolveStrategy] = &[by_module_index, by_bundle_key, by_chunk_name];

/// A dynamic import that no strategy could map to a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    /// File name of the importing chunk
    pub importer: String,
    /// Declared target
    pub target: String,
}

/// Full resolution outcome
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub chunks: DynamicChunkSet,
    pub unresolved: Vec<UnresolvedImport>,
}

/// Resolves dynamic import targets to emitted chunk files
pub struct DynamicImportResolver {
    strategies: Vec<ResolveStrategy>,
}

impl Default for DynamicImportResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicImportResolver {
    pub fn new() -> Self {
        Self {
            strategies: DEFAULT_STRATEGIES.to_vec(),
        }
    }

    /// Use a custom strategy list
    pub fn with_strategies(strategies: Vec<ResolveStrategy>) -> Self {
        Self { strategies }
    }

    /// Resolve every dynamic import in the bundle
    pub fn resolve(&self, bundle: &Bundle) -> DynamicChunkSet {
        self.resolve_detailed(bundle).chunks
    }

    /// Resolve and report unresolved targets
    pub fn resolve_detailed(&self, bundle: &Bundle) -> Resolution {
        let index = ModuleIdIndex::build(bundle);
        let ctx = ResolveContext {
            bundle,
            index: &index,
        };
        let mut resolution = Resolution::default();

        for chunk in bundle.chunks() {
            for target in &chunk.dynamic_imports {
                match self.resolve_target(&ctx, target) {
                    Some(file) => {
                        tracing::debug!(importer = %chunk.file_name, %target, %file, "Resolved dynamic import");
                        resolution.chunks.insert(file);
                    }
                    None => {
                        tracing::warn!(
                            importer = %chunk.file_name,
                            %target,
                            "Could not resolve dynamic import to an emitted chunk"
                        );
                        resolution.unresolved.push(UnresolvedImport {
                            importer: chunk.file_name.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        resolution
    }

    fn resolve_target(&self, ctx: &ResolveContext<'_>, target: &str) -> Option<String> {
        self.strategies.iter().find_map(|strategy| strategy(ctx, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Asset, Chunk};

    fn bundle() -> Bundle {
        Bundle::new()
            .with(
                Chunk::new("assets/main-abc.js", "import('./lazy')")
                    .entry(true)
                    .facade("/src/main.ts")
                    .name("main")
                    .module("/src/main.ts")
                    .dynamic_import("/src/lazy.ts")
                    .dynamic_import("assets/direct-123.js")
                    .dynamic_import("settings"),
            )
            .with(
                Chunk::new("assets/lazy-def.js", "export default 1")
                    .facade("/src/lazy.ts")
                    .module("/src/lazy.ts")
                    .module("/src/lazy-helper.ts"),
            )
            .with(Chunk::new("assets/direct-123.js", "export const d = 1"))
            .with(Chunk::new("assets/settings-9.js", "export const s = 1").name("settings"))
            .with(Asset::new("index.html", "<html></html>"))
    }

    #[test]
    fn test_index_registers_all_keys() {
        let index = ModuleIdIndex::build(&bundle());
        assert_eq!(index.get("/src/main.ts"), Some("assets/main-abc.js"));
        assert_eq!(index.get("main"), Some("assets/main-abc.js"));
        assert_eq!(index.get("/src/lazy-helper.ts"), Some("assets/lazy-def.js"));
        assert_eq!(index.get("settings"), Some("assets/settings-9.js"));
        assert!(index.get("/src/missing.ts").is_none());
    }

    #[test]
    fn test_resolves_by_every_strategy() {
        let resolution = DynamicImportResolver::new().resolve_detailed(&bundle());

        let expected: DynamicChunkSet = [
            "assets/lazy-def.js",
            "assets/direct-123.js",
            "assets/settings-9.js",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(resolution.chunks, expected);
        assert!(resolution.unresolved.is_empty());
    }

    #[test]
    fn test_name_strategy_without_index() {
        // Only the name scan can find this chunk once the index strategy is removed
        let resolver = DynamicImportResolver::with_strategies(vec![by_bundle_key as ResolveStrategy, by_chunk_name]);
        let chunks = resolver.resolve(&bundle());
        assert!(chunks.contains("assets/settings-9.js"));
        assert!(!chunks.contains("assets/lazy-def.js"));
    }

    #[test]
    fn test_unresolved_targets_are_reported_once_each() {
        let bundle = Bundle::new()
            .with(
                Chunk::new("main.js", "")
                    .entry(true)
                    .dynamic_import("/src/gone.ts")
                    .dynamic_import("lazy.js")
                    .dynamic_import("/src/also-gone.ts"),
            )
            .with(Chunk::new("lazy.js", "x"));

        let resolution = DynamicImportResolver::new().resolve_detailed(&bundle);
        assert_eq!(resolution.chunks.len(), 1);
        assert_eq!(
            resolution.unresolved,
            vec![
                UnresolvedImport {
                    importer: "main.js".into(),
                    target: "/src/gone.ts".into()
                },
                UnresolvedImport {
                    importer: "main.js".into(),
                    target: "/src/also-gone.ts".into()
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_targets_collapse() {
        let bundle = Bundle::new()
            .with(Chunk::new("a.js", "").dynamic_import("c.js"))
            .with(Chunk::new("b.js", "").dynamic_import("c.js"))
            .with(Chunk::new("c.js", ""));

        assert_eq!(DynamicImportResolver::new().resolve(&bundle).len(), 1);
    }

    #[test]
    fn test_index_collision_last_write_wins() {
        let bundle = Bundle::new()
            .with(Chunk::new("a.js", "").name("shared"))
            .with(Chunk::new("b.js", "").name("shared"));

        assert_eq!(ModuleIdIndex::build(&bundle).get("shared"), Some("b.js"));
    }
}
