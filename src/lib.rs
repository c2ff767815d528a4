// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Sriweave - Build-time Subresource Integrity
//!
//! Adds `integrity` attributes to the scripts and stylesheets of a bundled web
//! application, and injects a small browser runtime that does the same for
//! elements created after page load.
//!
//! ## Features
//!
//! - Two-pass hashing: entry chunks are hashed after the runtime is injected
//! - Dynamic import resolution from partial bundler metadata
//! - `modulepreload` links with integrity for lazily loaded chunks
//! - Remote (CDN) resources fetched once, cached and de-duplicated
//! - Skip patterns for resources that must stay unhashed
//! - Vite output directory + manifest loading
//!
//! ## Example
//!
//! ```rust,no_run
//! use sriweave::{Bundle, Chunk, Asset, HashAlgorithm, Pipeline, SriConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bundle = Bundle::new()
//!         .with(Chunk::new("main.js", "import('./lazy.js')").entry(true).dynamic_import("lazy.js"))
//!         .with(Chunk::new("lazy.js", "export default 1"))
//!         .with(Asset::new("index.html", "<script type=\"module\" src=\"/main.js\"></script>"));
//!
//!     let config = SriConfig::new().algorithm(HashAlgorithm::Sha384);
//!     let summary = Pipeline::new(config)?.run(&mut bundle).await?;
//!
//!     println!("{} HTML files updated", summary.html_updated);
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod config;
pub mod dom;
pub mod error;
pub mod html;
pub mod integrity;
pub mod locator;
pub mod pipeline;
pub mod runtime;

// Re-exports for convenience

// Build output
pub use bundle::{
    load_output_dir, Asset, BuildArtifact, Bundle, Chunk, DynamicChunkSet, DynamicImportResolver,
    Payload,
};

// Configuration
pub use config::{CrossOrigin, ExistingIntegrity, SriConfig, SriOptions};

// DOM
pub use dom::{parse_html, Document, Element, Node};

// Errors
pub use error::{Error, ErrorContext, Result};

// HTML
pub use html::{AugmentOutcome, HtmlAugmenter};

// Integrity
pub use integrity::{
    compute_integrity, HashAlgorithm, IntegrityHash, IntegrityMap, IntegrityMapBuilder,
    MapOptions, SkipList,
};

// Resource lookup
pub use locator::{HttpFetcher, LocatorOptions, RemoteFetcher, ResourceLocator};

// Pipeline
pub use pipeline::{Pipeline, PipelineStage, PipelineSummary};

// Browser runtime
pub use runtime::RuntimePatch;

/// Sriweave version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
