//! Confidence-gated auto-commit policy
//!
//! The single defense against silently misrecording a transaction from a
//! misheard or misread input: a candidate is only persisted without human
//! confirmation when the caller opted in AND the extraction confidence
//! clears the channel's threshold.

use crate::models::ParsedCandidate;

/// Default auto-commit threshold when no channel config is loaded
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Outcome of the auto-commit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitDecision {
    pub commit: bool,
}

/// Per-channel commit policy
#[derive(Debug, Clone, Copy)]
pub struct CommitPolicy {
    threshold: f64,
}

impl CommitPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Commit iff the caller explicitly requested auto-save and the
    /// candidate's confidence clears the threshold.
    pub fn decide(&self, candidate: &ParsedCandidate, auto_save: bool) -> CommitDecision {
        CommitDecision {
            commit: auto_save && candidate.confidence >= self.threshold,
        }
    }
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_with_confidence(confidence: f64) -> ParsedCandidate {
        ParsedCandidate {
            tx_type: "expense".into(),
            amount: 10_000.0,
            description: "Beli gas".into(),
            category: "Bahan Baku".into(),
            confidence,
        }
    }

    #[test]
    fn test_below_threshold_never_commits() {
        let policy = CommitPolicy::default();
        let decision = policy.decide(&candidate_with_confidence(0.69), true);
        assert!(!decision.commit);
    }

    #[test]
    fn test_at_threshold_commits() {
        let policy = CommitPolicy::default();
        let decision = policy.decide(&candidate_with_confidence(0.70), true);
        assert!(decision.commit);
    }

    #[test]
    fn test_opt_in_required_regardless_of_confidence() {
        let policy = CommitPolicy::default();
        let decision = policy.decide(&candidate_with_confidence(0.99), false);
        assert!(!decision.commit);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = CommitPolicy::new(0.9);
        assert!(!policy.decide(&candidate_with_confidence(0.85), true).commit);
        assert!(policy.decide(&candidate_with_confidence(0.95), true).commit);
    }
}
