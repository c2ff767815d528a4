// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Integrity computation
//!
//! - Token hashing (sha256 / sha384 / sha512)
//! - Per-build pathname to token maps
//! - Skip patterns

mod hasher;
mod map;
mod skip;

pub use hasher::{compute_integrity, HashAlgorithm, IntegrityHash};
pub use map::{
    is_processable, pathname_for, IntegrityMap, IntegrityMapBuilder, MapOptions, MapReport,
    SkipReason,
};
pub use skip::{SkipList, SkipPattern};
