// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Emitted HTML rewriting

mod augmenter;
mod preload;

pub use augmenter::{AugmentOutcome, HtmlAugmenter};
pub use preload::join_base;
