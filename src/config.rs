// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Plugin options and validated configuration

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::integrity::{HashAlgorithm, SkipList};
use crate::locator::LocatorOptions;

/// Value of the `crossorigin` attribute written next to `integrity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    Anonymous,
    UseCredentials,
}

impl CrossOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossOrigin::Anonymous => "anonymous",
            CrossOrigin::UseCredentials => "use-credentials",
        }
    }
}

impl fmt::Display for CrossOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrossOrigin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "anonymous" => Ok(CrossOrigin::Anonymous),
            "use-credentials" => Ok(CrossOrigin::UseCredentials),
            other => Err(Error::config(format!(
                "invalid crossorigin value '{}' (expected anonymous or use-credentials)",
                other
            ))),
        }
    }
}

/// What to do with elements that already carry an `integrity` attribute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingIntegrity {
    /// Overwrite with a freshly computed token
    #[default]
    Recompute,
    /// Leave the element untouched
    Preserve,
}

/// Raw plugin options as supplied by the host (camelCase JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SriOptions {
    pub algorithm: Option<String>,
    pub crossorigin: Option<String>,
    pub fetch_cache: bool,
    pub fetch_timeout_ms: u64,
    pub preload_dynamic_chunks: bool,
    pub runtime_patch_dynamic_links: bool,
    pub skip_resources: Vec<String>,
    pub verbose_logging: bool,
    pub existing_integrity: ExistingIntegrity,
    pub base: String,
    pub ssr_build: bool,
}

impl Default for SriOptions {
    fn default() -> Self {
        Self {
            algorithm: None,
            crossorigin: None,
            fetch_cache: true,
            fetch_timeout_ms: 5000,
            preload_dynamic_chunks: true,
            runtime_patch_dynamic_links: true,
            skip_resources: Vec::new(),
            verbose_logging: false,
            existing_integrity: ExistingIntegrity::Recompute,
            base: "/".to_string(),
            ssr_build: false,
        }
    }
}

impl SriOptions {
    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }
}

/// Validated configuration used by the pipeline
#[derive(Debug, Clone)]
pub struct SriConfig {
    /// Hash algorithm for every token
    pub algorithm: HashAlgorithm,
    /// `crossorigin` attribute value, if any
    pub crossorigin: Option<CrossOrigin>,
    /// Cache remote payloads for the rest of the build
    pub fetch_cache: bool,
    /// Remote fetch deadline in milliseconds, 0 disables
    pub fetch_timeout_ms: u64,
    /// Inject modulepreload links for dynamic chunks
    pub preload_dynamic_chunks: bool,
    /// Prepend the browser runtime to entry chunks
    pub runtime_patch: bool,
    /// Elements and URLs left alone
    pub skip: SkipList,
    /// Log per-element decisions at info level
    pub verbose: bool,
    /// Policy for pre-existing integrity attributes
    pub existing_integrity: ExistingIntegrity,
    /// Public base path
    pub base: String,
    /// Server-rendering build (no HTML is expected)
    pub ssr_build: bool,
}

impl Default for SriConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            crossorigin: None,
            fetch_cache: true,
            fetch_timeout_ms: 5000,
            preload_dynamic_chunks: true,
            runtime_patch: true,
            skip: SkipList::default(),
            verbose: false,
            existing_integrity: ExistingIntegrity::default(),
            base: "/".to_string(),
            ssr_build: false,
        }
    }
}

impl SriConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw options
    ///
    /// An unknown algorithm falls back to sha384 with a warning; an unknown
    /// crossorigin value or a bad skip pattern is an error.
    pub fn from_options(options: &SriOptions) -> Result<Self> {
        let algorithm = match options.algorithm.as_deref() {
            None => HashAlgorithm::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    algorithm = raw,
                    fallback = %HashAlgorithm::default(),
                    "Unsupported hash algorithm, using fallback"
                );
                HashAlgorithm::default()
            }),
        };

        let crossorigin = options
            .crossorigin
            .as_deref()
            .map(CrossOrigin::from_str)
            .transpose()?;

        Ok(Self {
            algorithm,
            crossorigin,
            fetch_cache: options.fetch_cache,
            fetch_timeout_ms: options.fetch_timeout_ms,
            preload_dynamic_chunks: options.preload_dynamic_chunks,
            runtime_patch: options.runtime_patch_dynamic_links,
            skip: SkipList::new(&options.skip_resources)?,
            verbose: options.verbose_logging,
            existing_integrity: options.existing_integrity,
            base: normalize_base(&options.base),
            ssr_build: options.ssr_build,
        })
    }

    /// Set hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set crossorigin policy
    pub fn crossorigin(mut self, crossorigin: Option<CrossOrigin>) -> Self {
        self.crossorigin = crossorigin;
        self
    }

    /// Enable/disable remote fetch caching
    pub fn fetch_cache(mut self, enabled: bool) -> Self {
        self.fetch_cache = enabled;
        self
    }

    /// Set remote fetch timeout
    pub fn fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = timeout_ms;
        self
    }

    /// Enable/disable modulepreload injection
    pub fn preload_dynamic_chunks(mut self, enabled: bool) -> Self {
        self.preload_dynamic_chunks = enabled;
        self
    }

    /// Enable/disable the browser runtime
    pub fn runtime_patch(mut self, enabled: bool) -> Self {
        self.runtime_patch = enabled;
        self
    }

    /// Set skip patterns
    pub fn skip_resources<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip = SkipList::new(patterns)?;
        Ok(self)
    }

    /// Enable/disable verbose logging
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set existing-integrity policy
    pub fn existing_integrity(mut self, policy: ExistingIntegrity) -> Self {
        self.existing_integrity = policy;
        self
    }

    /// Set public base path
    pub fn base(mut self, base: impl AsRef<str>) -> Self {
        self.base = normalize_base(base.as_ref());
        self
    }

    /// Mark the build as server-rendering only
    pub fn ssr_build(mut self, ssr: bool) -> Self {
        self.ssr_build = ssr;
        self
    }

    /// Options for the resource locator
    pub fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            cache_enabled: self.fetch_cache,
            timeout_ms: self.fetch_timeout_ms,
            base: self.base.clone(),
        }
    }
}

fn normalize_base(base: &str) -> String {
    let base = base.trim();
    if base.is_empty() {
        "/".to_string()
    } else {
        base.to_string()
    }
}
