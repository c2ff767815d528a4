// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Pipeline states and run summary

use std::fmt;

use serde::Serialize;

/// State of one pipeline run
///
/// `Idle -> HashingNonEntry -> InjectingRuntime -> HashingEntry ->
/// ResolvingDynamicImports -> AugmentingHtml -> Done`, or `Idle ->
/// HashingAll -> ...` when the runtime is disabled. `Failed` is reachable
/// from every non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    #[default]
    Idle,
    HashingNonEntry,
    InjectingRuntime,
    HashingEntry,
    /// Single pass over every artifact
    HashingAll,
    ResolvingDynamicImports,
    AugmentingHtml,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }

    /// Whether `next` may follow `self`
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;

        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, HashingNonEntry)
                | (Idle, HashingAll)
                | (HashingNonEntry, InjectingRuntime)
                | (InjectingRuntime, HashingEntry)
                | (HashingEntry, ResolvingDynamicImports)
                | (HashingAll, ResolvingDynamicImports)
                | (ResolvingDynamicImports, AugmentingHtml)
                | (AugmentingHtml, Done)
                | (Done, Idle)
                | (Failed, Idle)
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::HashingNonEntry => "hashing non-entry artifacts",
            PipelineStage::InjectingRuntime => "injecting runtime",
            PipelineStage::HashingEntry => "hashing entry chunks",
            PipelineStage::HashingAll => "hashing artifacts",
            PipelineStage::ResolvingDynamicImports => "resolving dynamic imports",
            PipelineStage::AugmentingHtml => "augmenting HTML",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// Artifacts that received an integrity token
    pub assets_hashed: usize,
    /// HTML files whose content changed
    pub html_updated: usize,
    /// modulepreload links added across all HTML files
    pub preloads_injected: usize,
    /// Entry chunks the runtime was prepended to
    pub runtime_injected: usize,
    /// Distinct dynamically imported chunk files
    pub dynamic_chunks: usize,
    /// Every state entered, in order
    pub stages: Vec<PipelineStage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use PipelineStage::*;

        let two_pass = [
            Idle,
            HashingNonEntry,
            InjectingRuntime,
            HashingEntry,
            ResolvingDynamicImports,
            AugmentingHtml,
            Done,
        ];
        assert!(two_pass.windows(2).all(|w| w[0].can_transition_to(w[1])));

        assert!(Idle.can_transition_to(HashingAll));
        assert!(HashingAll.can_transition_to(ResolvingDynamicImports));
        assert!(!HashingNonEntry.can_transition_to(HashingEntry));
        assert!(!Idle.can_transition_to(AugmentingHtml));
        assert!(InjectingRuntime.can_transition_to(Failed));
        assert!(!Done.can_transition_to(Failed));
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineStage::HashingEntry.to_string(), "hashing entry chunks");
        assert_eq!(
            serde_json::to_string(&PipelineStage::ResolvingDynamicImports).unwrap(),
            "\"resolving-dynamic-imports\""
        );
    }
}
