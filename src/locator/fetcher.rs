// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Remote resource fetching

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::{Error, Result};

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("sriweave/", env!("CARGO_PKG_VERSION"));

/// Fetches the bytes behind an absolute URL
///
/// The locator owns caching, de-duplication and timeouts; implementations
/// only perform a single request.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-success statuses
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// HTTP fetcher configuration
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Connect timeout (the overall request deadline is applied by the locator)
    pub connect_timeout: Duration,
    /// Default headers
    pub default_headers: HeaderMap,
    /// Proxy URL
    pub proxy: Option<String>,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        // reqwest negotiates encodings itself and decodes before hashing
        default_headers.insert("accept", HeaderValue::from_static("*/*"));

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 10,
            connect_timeout: Duration::from_secs(10),
            default_headers,
            proxy: None,
        }
    }
}

/// reqwest-backed [`RemoteFetcher`]
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .default_headers(config.default_headers.clone());

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get fetcher configuration
    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::fetch(
                url,
                Some(status.as_u16()),
                status.canonical_reason().unwrap_or("request failed"),
            ));
        }

        Ok(response.bytes().await?)
    }
}
