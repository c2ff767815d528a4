// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Resource lookup for elements referenced from HTML
//!
//! Local paths are looked up in the in-memory bundle. Absolute and
//! protocol-relative URLs are fetched, cached per build, and concurrent
//! requests for the same URL share one underlying fetch.

mod fetcher;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};

pub use fetcher::{HttpFetcher, HttpFetcherConfig, RemoteFetcher, DEFAULT_USER_AGENT};

use crate::bundle::{BuildArtifact, Bundle};
use crate::error::{Error, Result};

type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Bytes, Arc<Error>>>>;

/// A single local lookup strategy
pub type LocalStrategy = for<'a> fn(&'a Bundle, &str) -> Option<&'a BuildArtifact>;

/// Key equals the normalized path
fn by_exact_key<'a>(bundle: &'a Bundle, path: &str) -> Option<&'a BuildArtifact> {
    bundle.get(path)
}

/// Some key ends with `/<path>`
fn by_key_suffix<'a>(bundle: &'a Bundle, path: &str) -> Option<&'a BuildArtifact> {
    let suffix = format!("/{}", path);
    bundle
        .iter()
        .find(|(key, _)| key.ends_with(&suffix))
        .map(|(_, artifact)| artifact)
}

/// Exact or suffix match after dropping `?query` and `#fragment`
fn by_path_without_query<'a>(bundle: &'a Bundle, path: &str) -> Option<&'a BuildArtifact> {
    let stripped = strip_query(path);
    if stripped == path || stripped.is_empty() {
        return None;
    }
    by_exact_key(bundle, stripped).or_else(|| by_key_suffix(bundle, stripped))
}

/// Same file name in any directory
fn by_basename<'a>(bundle: &'a Bundle, path: &str) -> Option<&'a BuildArtifact> {
    let name = basename(strip_query(path));
    if name.is_empty() {
        return None;
    }
    bundle
        .iter()
        .find(|(key, _)| basename(key) == name)
        .map(|(_, artifact)| artifact)
}

/// Local strategies in the order they are tried
pub const LOCAL_STRATEGIES: &[LocalStrategy] = &[
    by_exact_key,
    by_key_suffix,
    by_path_without_query,
    by_basename,
];

fn strip_query(path: &str) -> &str {
    path.split(&['?', '#'][..]).next().unwrap_or(path)
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `http:`, `https:` or protocol-relative
pub fn is_remote(path: &str) -> bool {
    let lower = path.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Protocol-relative URLs are fetched over https
pub fn normalize_remote(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Locator options
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Keep fetched payloads for the rest of the build
    pub cache_enabled: bool,
    /// Per-fetch deadline in milliseconds, 0 disables
    pub timeout_ms: u64,
    /// Public base path stripped before local lookup
    pub base: String,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            timeout_ms: 5000,
            base: "/".to_string(),
        }
    }
}

/// Resolves element URLs to payload bytes
#[derive(Clone)]
pub struct ResourceLocator {
    fetcher: Arc<dyn RemoteFetcher>,
    cache: Arc<DashMap<String, Bytes>>,
    in_flight: Arc<DashMap<String, SharedFetch>>,
    options: LocatorOptions,
}

impl ResourceLocator {
    /// Locator backed by the default HTTP fetcher
    pub fn new(options: LocatorOptions) -> Result<Self> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new()?), options))
    }

    /// Locator backed by a custom fetcher
    pub fn with_fetcher(fetcher: Arc<dyn RemoteFetcher>, options: LocatorOptions) -> Self {
        Self {
            fetcher,
            cache: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            options,
        }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Load the payload behind `path`
    ///
    /// `Ok(None)` means a local path with no matching artifact. Remote
    /// failures are returned as errors so the caller can skip the element.
    pub async fn load(&self, path: &str, bundle: &Bundle) -> Result<Option<Bytes>> {
        if let Some(local) = self.strip_absolute_base(path) {
            return Ok(self.load_local(local, bundle));
        }
        if is_remote(path) {
            return self.load_remote(&normalize_remote(path)).await.map(Some);
        }
        Ok(self.load_local(path, bundle))
    }

    /// Look a local path up in the bundle
    pub fn load_local(&self, path: &str, bundle: &Bundle) -> Option<Bytes> {
        self.find_local(path, bundle)
            .map(|artifact| Bytes::copy_from_slice(artifact.content()))
    }

    /// Find the artifact a local path refers to
    pub fn find_local<'a>(&self, path: &str, bundle: &'a Bundle) -> Option<&'a BuildArtifact> {
        let normalized = self.normalize_local(path);
        if normalized.is_empty() {
            return None;
        }
        LOCAL_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(bundle, normalized))
    }

    /// Fetch a remote URL through the cache and in-flight table
    pub async fn load_remote(&self, url: &str) -> Result<Bytes> {
        if let Some(hit) = self.cached(url) {
            tracing::debug!(%url, "Remote resource served from cache");
            return Ok(hit);
        }

        // Check and registration happen under one shard lock with no await
        // in between, so concurrent callers always find the pending fetch.
        let shared = match self.in_flight.entry(url.to_string()) {
            Entry::Occupied(pending) => pending.get().clone(),
            Entry::Vacant(slot) => {
                if let Some(hit) = self.cached(url) {
                    return Ok(hit);
                }
                let fetch = self.start_fetch(url.to_string());
                slot.insert(fetch.clone());
                fetch
            }
        };

        shared.await.map_err(Error::from)
    }

    /// Drop cached payloads and forget pending fetches
    pub fn clear(&self) {
        self.cache.clear();
        self.in_flight.clear();
    }

    /// Number of cached remote payloads
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn cached(&self, url: &str) -> Option<Bytes> {
        if !self.options.cache_enabled {
            return None;
        }
        self.cache.get(url).map(|entry| entry.value().clone())
    }

    fn start_fetch(&self, url: String) -> SharedFetch {
        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();
        let cache_enabled = self.options.cache_enabled;
        let timeout_ms = self.options.timeout_ms;

        async move {
            tracing::debug!(%url, "Fetching remote resource");
            let result = if timeout_ms > 0 {
                match tokio::time::timeout(Duration::from_millis(timeout_ms), fetcher.fetch(&url))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::timeout_with_url("fetch", timeout_ms, url.clone())),
                }
            } else {
                fetcher.fetch(&url).await
            };

            if let Ok(ref bytes) = result {
                if cache_enabled {
                    cache.insert(url.clone(), bytes.clone());
                }
            }
            in_flight.remove(&url);

            result.map_err(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Absolute base (CDN) URLs point back into the bundle
    fn strip_absolute_base<'p>(&self, path: &'p str) -> Option<&'p str> {
        let base = self.options.base.trim_end_matches('/');
        if !is_remote(base) {
            return None;
        }
        path.strip_prefix(base)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    }

    fn normalize_local<'p>(&self, path: &'p str) -> &'p str {
        let path = path.trim();
        let base = self.options.base.trim_matches('/');
        let path = path.trim_start_matches("./");
        let path = path.trim_start_matches('/');
        if !base.is_empty() && !is_remote(&self.options.base) {
            if let Some(rest) = path.strip_prefix(base) {
                if let Some(rest) = rest.strip_prefix('/') {
                    return rest.trim_start_matches('/');
                }
            }
        }
        path
    }
}
