// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pathname to integrity token mapping for emitted artifacts

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::Serialize;

use super::hasher::{compute_integrity, HashAlgorithm};
use crate::bundle::{BuildArtifact, Bundle};
use crate::error::{Error, Result};

/// Extensions whose artifacts receive integrity tokens
const PROCESSABLE_EXTENSIONS: &[&str] = &[".css", ".js", ".mjs"];

/// Mapping from absolute pathname (`/assets/app.js`) to integrity token
///
/// Ordered so that the serialized form, and therefore the runtime embedding
/// it, is stable across builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntegrityMap {
    entries: BTreeMap<String, String>,
}

impl IntegrityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pathname: impl Into<String>, token: impl Into<String>) {
        self.entries.insert(pathname.into(), token.into());
    }

    pub fn get(&self, pathname: &str) -> Option<&str> {
        self.entries.get(pathname).map(String::as_str)
    }

    /// Token for an emitted file name
    pub fn for_file(&self, file_name: &str) -> Option<&str> {
        self.get(&pathname_for(file_name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// Merge `other` into `self`; entries of `other` win
    pub fn merge(mut self, other: IntegrityMap) -> Self {
        self.entries.extend(other.entries);
        self
    }
}

impl FromIterator<(String, String)> for IntegrityMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// `/` + file name
pub fn pathname_for(file_name: &str) -> String {
    format!("/{}", file_name.trim_start_matches('/'))
}

/// `.css`, `.js` or `.mjs`, optionally followed by a query string
pub fn is_processable(file_name: &str) -> bool {
    let path = file_name.split('?').next().unwrap_or(file_name);
    let lower = path.to_ascii_lowercase();
    PROCESSABLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Which artifacts one hashing pass covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapOptions {
    pub exclude_entry_chunks: bool,
    pub only_entry_chunks: bool,
}

impl MapOptions {
    /// Every processable artifact
    pub fn all() -> Self {
        Self::default()
    }

    /// Everything except entry chunks
    pub fn non_entry() -> Self {
        Self {
            exclude_entry_chunks: true,
            only_entry_chunks: false,
        }
    }

    /// Entry chunks only
    pub fn entry_only() -> Self {
        Self {
            exclude_entry_chunks: false,
            only_entry_chunks: true,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.exclude_entry_chunks && self.only_entry_chunks {
            return Err(Error::config(
                "exclude_entry_chunks and only_entry_chunks cannot both be set",
            ));
        }
        Ok(())
    }

    fn selects(&self, artifact: &BuildArtifact) -> bool {
        let entry = artifact.is_entry_chunk();
        !((self.exclude_entry_chunks && entry) || (self.only_entry_chunks && !entry))
    }
}

/// Why an artifact got no token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Extension is not hashed
    NotProcessable,
    /// Filtered out by [`MapOptions`]
    OutsidePass,
    /// Code or payload is empty
    Empty,
}

/// Result of one hashing pass
#[derive(Debug, Clone, Default)]
pub struct MapReport {
    pub map: IntegrityMap,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Hashes emitted artifacts into an [`IntegrityMap`]
#[derive(Debug, Clone, Copy)]
pub struct IntegrityMapBuilder {
    algorithm: HashAlgorithm,
}

impl IntegrityMapBuilder {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash every artifact selected by `options`
    pub fn build(&self, bundle: &Bundle, options: MapOptions) -> Result<IntegrityMap> {
        self.build_report(bundle, options).map(|r| r.map)
    }

    /// Like [`build`](Self::build), also listing skipped artifacts
    pub fn build_report(&self, bundle: &Bundle, options: MapOptions) -> Result<MapReport> {
        options.validate()?;

        let mut report = MapReport::default();
        for artifact in bundle.artifacts() {
            let file = artifact.file_name();
            match self.hash_artifact(artifact, options) {
                Ok(token) => {
                    tracing::debug!(%file, %token, "Computed integrity");
                    report.map.insert(pathname_for(file), token);
                }
                Err(reason) => {
                    if reason == SkipReason::Empty {
                        tracing::warn!(%file, "Skipping integrity for empty artifact");
                    }
                    report.skipped.push((file.to_string(), reason));
                }
            }
        }

        Ok(report)
    }

    fn hash_artifact(
        &self,
        artifact: &BuildArtifact,
        options: MapOptions,
    ) -> std::result::Result<String, SkipReason> {
        if !is_processable(artifact.file_name()) {
            return Err(SkipReason::NotProcessable);
        }
        if !options.selects(artifact) {
            return Err(SkipReason::OutsidePass);
        }
        let content = artifact.content();
        if content.is_empty() {
            return Err(SkipReason::Empty);
        }
        Ok(compute_integrity(content, self.algorithm))
    }
}
