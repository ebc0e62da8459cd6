//! Aggregate counts over a run's candidate traces.

use fesenda_explore::candidate::CandidateTrace;
use serde::{Deserialize, Serialize};

/// Final aggregate produced whenever the pipeline completes normally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Reset-delimited sub-traces in the exploration.
    pub unique_traces: usize,
    /// Candidates generated (widget x trace x API).
    pub relevant: usize,
    /// Unanimously reproduced candidates.
    pub confirmed: usize,
    /// Fully replayed under enforcement with no missing widgets.
    pub blocked: usize,
    /// Fully replayed under enforcement but with widgets missing.
    pub partially_blocked: usize,
    /// Confirmed but not fully replayable under enforcement.
    pub not_blocked: usize,
    /// Never unanimously reproduced.
    pub not_confirmed: usize,
}

impl AnalysisSummary {
    pub fn from_candidates(unique_traces: usize, candidates: &[CandidateTrace]) -> Self {
        Self {
            unique_traces,
            relevant: candidates.len(),
            confirmed: candidates.iter().filter(|c| c.confirm_ratio == 1.0).count(),
            blocked: candidates
                .iter()
                .filter(|c| c.blocked_ratio == 1.0 && c.unseen_ratio == 0.0)
                .count(),
            partially_blocked: candidates
                .iter()
                .filter(|c| c.blocked_ratio == 1.0 && c.unseen_ratio > 0.0)
                .count(),
            not_blocked: candidates
                .iter()
                .filter(|c| c.confirm_ratio == 1.0 && c.blocked_ratio < 1.0)
                .count(),
            not_confirmed: candidates.iter().filter(|c| c.confirm_ratio < 1.0).count(),
        }
    }
}

impl std::fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unique traces: {}\tRelevant: {}\tConfirmed: {}\tBlocked {}\tPartially Blocked {}",
            self.unique_traces, self.relevant, self.confirmed, self.blocked, self.partially_blocked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fesenda_explore::trace::PlaybackTrace;
    use fesenda_model::api::ObservedApiCall;
    use fesenda_model::widget::Widget;

    fn candidate(confirm: f64, blocked: f64, unseen: f64) -> CandidateTrace {
        let mut c = CandidateTrace::new(
            Widget::new("c", "r", "t", ""),
            PlaybackTrace::new(),
            ObservedApiCall::new("android.hardware.Camera", "open", vec![]),
            None,
        );
        c.confirm_ratio = confirm;
        c.blocked_ratio = blocked;
        c.unseen_ratio = unseen;
        c
    }

    #[test]
    fn test_summary_categories() {
        let candidates = vec![
            candidate(1.0, 1.0, 0.0), // blocked
            candidate(1.0, 1.0, 0.2), // partially blocked
            candidate(1.0, 0.5, 0.0), // not blocked
            candidate(0.0, 0.0, 0.0), // not confirmed
        ];

        let summary = AnalysisSummary::from_candidates(2, &candidates);
        assert_eq!(summary.unique_traces, 2);
        assert_eq!(summary.relevant, 4);
        assert_eq!(summary.confirmed, 3);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.partially_blocked, 1);
        assert_eq!(summary.not_blocked, 1);
        assert_eq!(summary.not_confirmed, 1);
    }
}
