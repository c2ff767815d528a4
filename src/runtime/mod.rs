// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser runtime patch
//!
//! Serializes a self-installing script that is prepended to entry chunks.
//! In the page it wraps `setAttribute`, `appendChild`, `insertBefore` and
//! `append` so that scripts and stylesheets created after load receive their
//! integrity (and crossorigin) attributes before the request is made.

mod script;

use serde::Serialize;
use url::Url;

pub use script::{DOM_ADAPTER, INSTALL_FUNCTION};

use crate::config::{CrossOrigin, SriConfig};
use crate::error::Result;
use crate::integrity::IntegrityMap;
use crate::locator::{is_remote, normalize_remote};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeOptions<'a> {
    crossorigin: Option<&'static str>,
    skip_resources: &'a [String],
    base_path: Option<&'a str>,
}

/// Runtime generator for one build
#[derive(Debug, Clone, Default)]
pub struct RuntimePatch {
    map: IntegrityMap,
    crossorigin: Option<CrossOrigin>,
    skip_resources: Vec<String>,
    base_path: Option<String>,
}

impl RuntimePatch {
    pub fn new(map: IntegrityMap) -> Self {
        Self {
            map,
            ..Default::default()
        }
    }

    /// Runtime parameterized by the configured crossorigin, skip patterns and base
    pub fn from_config(map: IntegrityMap, config: &SriConfig) -> Self {
        Self::new(map)
            .crossorigin(config.crossorigin)
            .skip_resources(config.skip.sources())
            .base(&config.base)
    }

    pub fn crossorigin(mut self, crossorigin: Option<CrossOrigin>) -> Self {
        self.crossorigin = crossorigin;
        self
    }

    pub fn skip_resources(mut self, patterns: Vec<String>) -> Self {
        self.skip_resources = patterns;
        self
    }

    /// Public base; its path part is stripped from page pathnames on lookup
    pub fn base(mut self, base: &str) -> Self {
        self.base_path = base_pathname(base);
        self
    }

    pub fn map(&self) -> &IntegrityMap {
        &self.map
    }

    /// The options object passed to `installSriRuntime`
    pub fn options_json(&self) -> Result<String> {
        let options = RuntimeOptions {
            crossorigin: self.crossorigin.map(|c| c.as_str()),
            skip_resources: &self.skip_resources,
            base_path: self.base_path.as_deref(),
        };
        Ok(serde_json::to_string(&options)?)
    }

    /// Self-invoking snippet
    ///
    /// Outside a document it does nothing, and any failure during
    /// installation is swallowed so the page keeps loading.
    pub fn render(&self) -> Result<String> {
        let map = serde_json::to_string(&self.map)?;
        let options = self.options_json()?;

        Ok(format!(
            "(function () {{\n{}\n{}\ntry {{\n    if (typeof document === 'undefined') return;\n    \
             installSriRuntime({}, {}, createDomAdapter());\n}} catch (e) {{}}\n}})();\n",
            INSTALL_FUNCTION, DOM_ADAPTER, map, options
        ))
    }
}

/// Path part of a base without its trailing slash, `None` for root or relative bases
fn base_pathname(base: &str) -> Option<String> {
    let base = base.trim();
    let path = if is_remote(base) {
        Url::parse(&normalize_remote(base)).ok()?.path().to_string()
    } else if base.starts_with('/') {
        base.to_string()
    } else {
        return None;
    };

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
