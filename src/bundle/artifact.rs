// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Build output representation

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;

/// Raw contents of an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Bytes),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Bytes(b) => b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Text view, lossy for non UTF-8 bytes
    pub fn to_text(&self) -> String {
        match self {
            Payload::Text(s) => s.clone(),
            Payload::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

/// An emitted JavaScript chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub file_name: String,
    pub code: String,
    pub is_entry: bool,
    /// Primary source module the chunk was generated from
    pub facade_module_id: Option<String>,
    /// Logical chunk name
    pub name: Option<String>,
    pub module_ids: BTreeSet<String>,
    /// Dynamic import targets, in declaration order
    pub dynamic_imports: Vec<String>,
}

impl Chunk {
    pub fn new(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn entry(mut self, is_entry: bool) -> Self {
        self.is_entry = is_entry;
        self
    }

    pub fn facade(mut self, id: impl Into<String>) -> Self {
        self.facade_module_id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn module(mut self, id: impl Into<String>) -> Self {
        self.module_ids.insert(id.into());
        self
    }

    pub fn dynamic_import(mut self, target: impl Into<String>) -> Self {
        self.dynamic_imports.push(target.into());
        self
    }
}

/// An emitted non-chunk file (stylesheet, HTML, image, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub file_name: String,
    pub payload: Payload,
}

impl Asset {
    pub fn new(file_name: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            file_name: file_name.into(),
            payload: payload.into(),
        }
    }
}

/// One emitted output unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildArtifact {
    Chunk(Chunk),
    Asset(Asset),
}

impl BuildArtifact {
    pub fn file_name(&self) -> &str {
        match self {
            BuildArtifact::Chunk(c) => &c.file_name,
            BuildArtifact::Asset(a) => &a.file_name,
        }
    }

    /// Code or payload bytes
    pub fn content(&self) -> &[u8] {
        match self {
            BuildArtifact::Chunk(c) => c.code.as_bytes(),
            BuildArtifact::Asset(a) => a.payload.as_bytes(),
        }
    }

    pub fn as_chunk(&self) -> Option<&Chunk> {
        match self {
            BuildArtifact::Chunk(c) => Some(c),
            BuildArtifact::Asset(_) => None,
        }
    }

    pub fn is_entry_chunk(&self) -> bool {
        self.as_chunk().map(|c| c.is_entry).unwrap_or(false)
    }

    pub fn is_html(&self) -> bool {
        matches!(self, BuildArtifact::Asset(_)) && is_html_file(self.file_name())
    }
}

impl From<Chunk> for BuildArtifact {
    fn from(c: Chunk) -> Self {
        BuildArtifact::Chunk(c)
    }
}

impl From<Asset> for BuildArtifact {
    fn from(a: Asset) -> Self {
        BuildArtifact::Asset(a)
    }
}

/// All artifacts of one build, keyed by file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    artifacts: BTreeMap<String, BuildArtifact>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact under its file name, replacing any previous one
    pub fn insert(&mut self, artifact: impl Into<BuildArtifact>) {
        let artifact = artifact.into();
        self.artifacts
            .insert(artifact.file_name().to_string(), artifact);
    }

    /// Builder-style insert
    pub fn with(mut self, artifact: impl Into<BuildArtifact>) -> Self {
        self.insert(artifact);
        self
    }

    pub fn get(&self, key: &str) -> Option<&BuildArtifact> {
        self.artifacts.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BuildArtifact> {
        self.artifacts.get_mut(key)
    }

    pub fn chunk(&self, key: &str) -> Option<&Chunk> {
        self.get(key).and_then(BuildArtifact::as_chunk)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, BuildArtifact> {
        self.artifacts.iter()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &BuildArtifact> {
        self.artifacts.values()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.artifacts.values().filter_map(BuildArtifact::as_chunk)
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.artifacts.values_mut().filter_map(|a| match a {
            BuildArtifact::Chunk(c) => Some(c),
            BuildArtifact::Asset(_) => None,
        })
    }

    /// File names of emitted HTML assets
    pub fn html_files(&self) -> Vec<String> {
        self.artifacts
            .values()
            .filter(|a| a.is_html())
            .map(|a| a.file_name().to_string())
            .collect()
    }

    /// Replace the payload of an asset in place
    pub fn set_asset_payload(&mut self, key: &str, payload: impl Into<Payload>) -> bool {
        match self.artifacts.get_mut(key) {
            Some(BuildArtifact::Asset(asset)) => {
                asset.payload = payload.into();
                true
            }
            _ => false,
        }
    }
}

impl FromIterator<BuildArtifact> for Bundle {
    fn from_iter<T: IntoIterator<Item = BuildArtifact>>(iter: T) -> Self {
        let mut bundle = Bundle::new();
        for artifact in iter {
            bundle.insert(artifact);
        }
        bundle
    }
}

/// `.html` / `.htm`
pub fn is_html_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_keys_by_file_name() {
        let bundle = Bundle::new()
            .with(Chunk::new("main.js", "console.log(1)").entry(true))
            .with(Asset::new("index.html", "<html></html>"))
            .with(Asset::new("style.css", b"body{}".to_vec()));

        assert_eq!(bundle.len(), 3);
        assert!(bundle.get("main.js").unwrap().is_entry_chunk());
        assert_eq!(bundle.html_files(), vec!["index.html".to_string()]);
        assert_eq!(bundle.chunks().count(), 1);
        assert_eq!(bundle.get("style.css").unwrap().content(), b"body{}");
    }

    #[test]
    fn test_set_asset_payload() {
        let mut bundle = Bundle::new()
            .with(Asset::new("index.html", "a"))
            .with(Chunk::new("main.js", "x"));

        assert!(bundle.set_asset_payload("index.html", "b"));
        assert!(!bundle.set_asset_payload("main.js", "y"));
        assert_eq!(bundle.get("index.html").unwrap().content(), b"b");
    }

    #[test]
    fn test_payload_text_lossy() {
        let p = Payload::from(vec![0x68, 0x69, 0xff]);
        assert_eq!(p.to_text(), "hi\u{fffd}");
        assert!(!p.is_empty());
    }
}
