// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Integrity token computation
//!
//! Produces `<algorithm>-<base64 digest>` strings as used by the `integrity`
//! attribute.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

/// SRI hash algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    #[default]
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Token prefix for this algorithm
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Base64 digest of `content`
    pub fn digest(&self, content: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => BASE64.encode(Sha256::digest(content)),
            HashAlgorithm::Sha384 => BASE64.encode(Sha384::digest(content)),
            HashAlgorithm::Sha512 => BASE64.encode(Sha512::digest(content)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(Error::config(format!(
                "unsupported hash algorithm '{}' (expected sha256, sha384 or sha512)",
                other
            ))),
        }
    }
}

/// A parsed or computed integrity token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityHash {
    /// Hash algorithm
    pub algorithm: HashAlgorithm,
    /// Base64 digest
    pub digest: String,
}

impl IntegrityHash {
    /// Hash `content` with `algorithm`
    pub fn compute(algorithm: HashAlgorithm, content: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(content),
        }
    }

    /// Parse the first token of an `integrity` attribute value
    pub fn parse(value: &str) -> Option<Self> {
        let token = value.split_whitespace().next()?;
        let (algorithm, digest) = token.split_once('-')?;
        let algorithm = algorithm.parse().ok()?;
        if digest.is_empty() {
            return None;
        }
        Some(Self {
            algorithm,
            digest: digest.to_string(),
        })
    }

    /// Check `content` against this token
    pub fn verify(&self, content: &[u8]) -> bool {
        self.algorithm.digest(content) == self.digest
    }
}

impl fmt::Display for IntegrityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.digest)
    }
}

/// Compute the integrity token for a payload
pub fn compute_integrity(content: impl AsRef<[u8]>, algorithm: HashAlgorithm) -> String {
    IntegrityHash::compute(algorithm, content.as_ref()).to_string()
}
