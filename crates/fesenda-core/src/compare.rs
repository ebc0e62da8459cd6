//! Differential classification of two exploration runs.
//!
//! Four severity tiers, evaluated in strict priority order: raw action-count
//! parity, actionable-widget overlap, observed-widget overlap, no loss. The
//! ordering encodes a severity lattice — functional breakage outranks
//! interactive-surface shrinkage, which outranks passive-surface shrinkage.

use fesenda_model::exploration::ExplorationResult;
use fesenda_model::widget::Widget;
use serde::{Deserialize, Serialize};

/// Loss severity detected between a reference run and a candidate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossStatus {
    /// No observable difference.
    None,
    /// Minor: some passive UI surface disappeared.
    InformationLoss,
    /// Severe: some interactive surface disappeared.
    PossibleFunctionalityLoss,
    /// Critical: fewer raw actions were even executable.
    FunctionalityLoss,
}

/// Outcome of a comparison, with the ratios that produced the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub status: LossStatus,
    /// candidate actions / reference actions.
    pub reproducible_ratio: f64,
    pub original_actionable: usize,
    pub current_actionable: usize,
    pub actionable_ratio: f64,
    pub original_observed: usize,
    pub current_observed: usize,
    pub observed_ratio: f64,
    /// Fraction of the candidate's observed widgets absent from the reference.
    pub new_ratio: f64,
}

impl ComparisonResult {
    fn loss(status: LossStatus, reproducible_ratio: f64) -> Self {
        Self {
            status,
            reproducible_ratio,
            original_actionable: 0,
            current_actionable: 0,
            actionable_ratio: 0.0,
            original_observed: 0,
            current_observed: 0,
            observed_ratio: 0.0,
            new_ratio: 0.0,
        }
    }
}

/// Fraction of `reference` widgets present (by uid) in `candidate`.
fn overlap_ratio(reference: &[Widget], candidate: &[Widget]) -> f64 {
    if reference.is_empty() {
        return 1.0;
    }
    let found = reference
        .iter()
        .filter(|r| candidate.iter().any(|c| c.uid() == r.uid()))
        .count();
    found as f64 / reference.len() as f64
}

/// Compare a policy-affected (or replayed) run against its reference run.
pub fn compare(reference: &ExplorationResult, candidate: &ExplorationResult) -> ComparisonResult {
    // Tier 1: raw action-count parity (critical).
    let reproducible_ratio = if reference.action_count() > 0 {
        candidate.action_count() as f64 / reference.action_count() as f64
    } else {
        0.0
    };
    if reproducible_ratio < 1.0 {
        return ComparisonResult::loss(LossStatus::FunctionalityLoss, reproducible_ratio);
    }

    let ref_observed = reference.unique_observed_widgets();
    let cand_observed = candidate.unique_observed_widgets();
    let ref_actionable: Vec<Widget> = ref_observed
        .iter()
        .filter(|w| w.can_be_acted_upon())
        .cloned()
        .collect();
    let cand_actionable: Vec<Widget> = cand_observed
        .iter()
        .filter(|w| w.can_be_acted_upon())
        .cloned()
        .collect();

    // Tier 2: interactive surface (severe).
    let actionable_ratio = overlap_ratio(&ref_actionable, &cand_actionable);
    if actionable_ratio < 1.0 {
        let mut result =
            ComparisonResult::loss(LossStatus::PossibleFunctionalityLoss, reproducible_ratio);
        result.original_actionable = ref_actionable.len();
        result.current_actionable = cand_actionable.len();
        result.actionable_ratio = actionable_ratio;
        return result;
    }

    // Tier 3: passive surface (minor).
    let observed_ratio = overlap_ratio(&ref_observed, &cand_observed);
    let new_widgets = cand_observed
        .iter()
        .filter(|c| !ref_observed.iter().any(|r| r.uid() == c.uid()))
        .count();
    let new_ratio = if cand_observed.is_empty() {
        0.0
    } else {
        new_widgets as f64 / cand_observed.len() as f64
    };

    if observed_ratio < 1.0 {
        return ComparisonResult {
            status: LossStatus::InformationLoss,
            reproducible_ratio,
            original_actionable: ref_actionable.len(),
            current_actionable: cand_actionable.len(),
            actionable_ratio,
            original_observed: ref_observed.len(),
            current_observed: cand_observed.len(),
            observed_ratio,
            new_ratio,
        };
    }

    ComparisonResult {
        status: LossStatus::None,
        reproducible_ratio,
        original_actionable: ref_actionable.len(),
        current_actionable: cand_actionable.len(),
        actionable_ratio,
        original_observed: ref_observed.len(),
        current_observed: cand_observed.len(),
        observed_ratio,
        new_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fesenda_model::action::{Action, ActionRecord, UiState};

    fn run_with(actions: usize, widgets: Vec<Widget>) -> ExplorationResult {
        let mut records = vec![ActionRecord::new(Action::Reset, UiState::new(widgets))];
        for _ in 1..actions {
            records.push(ActionRecord::new(Action::PressBack, UiState::default()));
        }
        ExplorationResult::new("app", records)
    }

    fn actionable(id: &str) -> Widget {
        Widget::new("android.widget.Button", id, id, "")
    }

    fn passive(id: &str) -> Widget {
        Widget::new("android.widget.TextView", id, id, "").with_flags(true, false, false)
    }

    #[test]
    fn test_fewer_actions_is_functionality_loss() {
        // Action deficit dominates regardless of widget overlap.
        let reference = run_with(10, vec![actionable("a")]);
        let candidate = run_with(5, vec![actionable("a")]);

        let result = compare(&reference, &candidate);
        assert_eq!(result.status, LossStatus::FunctionalityLoss);
        assert!((result.reproducible_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_actionable_widget_is_possible_functionality_loss() {
        let reference = run_with(3, vec![actionable("a"), actionable("b"), actionable("c")]);
        let candidate = run_with(3, vec![actionable("a"), actionable("b")]);

        let result = compare(&reference, &candidate);
        assert_eq!(result.status, LossStatus::PossibleFunctionalityLoss);
        assert!((result.actionable_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.original_actionable, 3);
        assert_eq!(result.current_actionable, 2);
    }

    #[test]
    fn test_missing_passive_widget_is_information_loss() {
        let reference = run_with(
            3,
            vec![actionable("a"), actionable("b"), actionable("c"), passive("d")],
        );
        let candidate = run_with(3, vec![actionable("a"), actionable("b"), actionable("c")]);

        let result = compare(&reference, &candidate);
        assert_eq!(result.status, LossStatus::InformationLoss);
        assert!((result.observed_ratio - 3.0 / 4.0).abs() < 1e-9);
        assert_eq!(result.actionable_ratio, 1.0);
    }

    #[test]
    fn test_identical_runs_report_no_loss() {
        let widgets = vec![actionable("a"), passive("b")];
        let reference = run_with(4, widgets.clone());
        let candidate = run_with(4, widgets);

        let result = compare(&reference, &candidate);
        assert_eq!(result.status, LossStatus::None);
        assert_eq!(result.reproducible_ratio, 1.0);
    }

    #[test]
    fn test_empty_reference_reports_zero_ratio() {
        let reference = ExplorationResult::new("app", vec![]);
        let candidate = run_with(2, vec![]);

        let result = compare(&reference, &candidate);
        assert_eq!(result.status, LossStatus::FunctionalityLoss);
        assert_eq!(result.reproducible_ratio, 0.0);
    }

    #[test]
    fn test_new_ratio_counts_novel_widgets() {
        let reference = run_with(2, vec![actionable("a")]);
        let candidate = run_with(2, vec![actionable("a"), passive("x")]);

        let result = compare(&reference, &candidate);
        // All reference widgets found, one of two candidate widgets is novel.
        assert_eq!(result.status, LossStatus::None);
        assert!((result.new_ratio - 0.5).abs() < 1e-9);
    }
}
