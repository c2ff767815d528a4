// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Build output model
//!
//! Artifacts as emitted by the bundler, dynamic import resolution over them
//! and loading from an output directory.

mod artifact;
mod manifest;
mod resolver;

pub use artifact::{is_html_file, Asset, BuildArtifact, Bundle, Chunk, Payload};
pub use manifest::{apply_manifest, load_output_dir, read_manifest, Manifest, ManifestEntry};
pub use resolver::{
    DynamicChunkSet, DynamicImportResolver, ModuleIdIndex, Resolution, ResolveContext,
    ResolveStrategy, UnresolvedImport, DEFAULT_STRATEGIES,
};
