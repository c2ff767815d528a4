// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Loading a bundle from a build output directory
//!
//! Files become chunks (`.js`, `.mjs`) or assets. Graph metadata the bundler
//! no longer exposes after the build is recovered from a Vite-format
//! `manifest.json` when one is available.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use super::artifact::{Asset, BuildArtifact, Bundle, Chunk};
use crate::error::{Error, ErrorContext, Result};

/// Where Vite writes its manifest, relative to the output directory
const MANIFEST_CANDIDATES: &[&str] = &[".vite/manifest.json", "manifest.json"];

const CHUNK_EXTENSIONS: &[&str] = &[".js", ".mjs"];

/// One entry of a Vite build manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestEntry {
    /// Emitted file, relative to the output directory
    pub file: String,
    pub name: Option<String>,
    pub src: Option<String>,
    pub is_entry: bool,
    pub is_dynamic_entry: bool,
    /// Manifest keys of statically imported chunks
    pub imports: Vec<String>,
    /// Manifest keys of dynamically imported chunks
    pub dynamic_imports: Vec<String>,
}

/// Manifest keyed by source module id
pub type Manifest = BTreeMap<String, ManifestEntry>;

/// Read `dir` into a [`Bundle`]
///
/// With `manifest` unset the default Vite locations are probed; a default
/// manifest that is not in Vite format (a web app manifest, say) is loaded
/// as a plain asset instead. An explicit manifest must parse.
pub fn load_output_dir(dir: impl AsRef<Path>, manifest: Option<&Path>) -> Result<Bundle> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::config(format!(
            "output directory not found: {}",
            dir.display()
        )));
    }

    let loaded = match manifest {
        Some(path) => Some((path.to_path_buf(), read_manifest(path)?)),
        None => discover_manifest(dir),
    };
    let manifest_file = loaded
        .as_ref()
        .and_then(|(path, _)| path.canonicalize().ok());

    let files = collect_files(dir)?;

    let mut bundle = Bundle::new();
    for path in files {
        if manifest_file.is_some() && path.canonicalize().ok() == manifest_file {
            continue;
        }
        let key = relative_key(dir, &path)?;
        let bytes = fs::read(&path).context(&format!("reading {}", path.display()))?;
        bundle.insert(artifact_for(key, bytes));
    }

    match loaded {
        Some((path, manifest)) => {
            let applied = apply_manifest(&mut bundle, &manifest);
            tracing::debug!(manifest = %path.display(), entries = manifest.len(), applied, "Applied build manifest");
        }
        None => {
            tracing::warn!(dir = %dir.display(), "No build manifest found, entry chunks and dynamic imports are unknown");
        }
    }

    tracing::debug!(dir = %dir.display(), artifacts = bundle.len(), "Loaded output directory");
    Ok(bundle)
}

/// Parse a Vite manifest file
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = fs::read_to_string(path).context(&format!("reading manifest {}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Copy manifest metadata onto matching chunks, returning how many matched
pub fn apply_manifest(bundle: &mut Bundle, manifest: &Manifest) -> usize {
    let mut applied = 0;

    for (key, entry) in manifest {
        let Some(BuildArtifact::Chunk(chunk)) = bundle.get_mut(&entry.file) else {
            // stylesheets and other assets also have manifest entries
            tracing::trace!(%key, file = %entry.file, "Manifest entry without chunk");
            continue;
        };

        chunk.is_entry |= entry.is_entry;
        if chunk.facade_module_id.is_none() {
            chunk.facade_module_id = Some(key.clone());
        }
        if chunk.name.is_none() {
            chunk.name = entry.name.clone();
        }
        chunk.module_ids.insert(key.clone());
        if let Some(ref src) = entry.src {
            chunk.module_ids.insert(src.clone());
        }
        for target in &entry.dynamic_imports {
            if !chunk.dynamic_imports.contains(target) {
                chunk.dynamic_imports.push(target.clone());
            }
        }
        applied += 1;
    }

    applied
}

fn discover_manifest(dir: &Path) -> Option<(PathBuf, Manifest)> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .filter(|path| path.is_file())
        .find_map(|path| match read_manifest(&path) {
            Ok(manifest) => Some((path, manifest)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Not a build manifest");
                None
            }
        })
}

/// Regular files under `dir`, in file name order
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `/`-separated path relative to the output directory
fn relative_key(dir: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(dir)
        .map_err(|_| Error::other(format!("{} is outside {}", path.display(), dir.display())))?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn artifact_for(key: String, bytes: Vec<u8>) -> BuildArtifact {
    let lower = key.to_ascii_lowercase();
    if CHUNK_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        match String::from_utf8(bytes) {
            Ok(code) => return Chunk::new(key, code).into(),
            Err(e) => {
                tracing::warn!(file = %key, "Chunk is not valid UTF-8, loading it as an asset");
                return Asset::new(key, e.into_bytes()).into();
            }
        }
    }

    if is_text(&lower) {
        match String::from_utf8(bytes) {
            Ok(text) => Asset::new(key, text).into(),
            Err(e) => Asset::new(key, e.into_bytes()).into(),
        }
    } else {
        Asset::new(key, bytes).into()
    }
}

fn is_text(lower: &str) -> bool {
    [".html", ".htm", ".css", ".json", ".svg", ".txt"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
