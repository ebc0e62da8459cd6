//! Enforcement evaluation: re-replay confirmed candidates with a runtime
//! policy blocking the target API while the target widget is interacted
//! with, and measure how much of the original behavior survives. Each
//! enforced run is also classified against a plain reference replay of the
//! same trace.

use fesenda_explore::association::build_associations;
use fesenda_explore::candidate::CandidateTrace;
use fesenda_explore::enforcement::{EnforcementStrategy, PolicyChannel};
use fesenda_explore::oracle::{ExplorationOracle, ExploreConfig};
use fesenda_model::sensitive::SensitiveApiList;
use fesenda_model::widget::Widget;
use tracing::{info, warn};

use crate::compare::{compare, ComparisonResult};

/// Differential verdict for one evaluated candidate, keyed by its position
/// in the candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateVerdict {
    pub candidate_index: usize,
    pub comparison: ComparisonResult,
}

/// Baseline widgets neither identity-present in `after` nor — when they carry
/// text or a resource-id — structurally equivalent (ignoring location) to
/// anything in `after`.
pub fn unseen_widgets<'a>(baseline: &'a [Widget], after: &[Widget]) -> Vec<&'a Widget> {
    baseline
        .iter()
        .filter(|b| !after.iter().any(|a| a.uid() == b.uid()))
        .filter(|b| {
            let has_identity = !b.text.is_empty() || !b.resource_id.is_empty();
            !(has_identity && after.iter().any(|a| a.is_equivalent_ignore_location(b)))
        })
        .collect()
}

/// Replay each fully confirmed candidate (`confirm_ratio == 1.0`) under
/// enforcement and record `blocked_ratio`, the widgets seen under blocking,
/// and the fraction of baseline widgets that went missing. A plain replay of
/// the same trace serves as the reference for the differential verdict.
pub fn evaluate_confirmed<O: ExplorationOracle>(
    oracle: &mut O,
    config: &ExploreConfig,
    api_list: &SensitiveApiList,
    channel: &mut dyn PolicyChannel,
    candidates: &mut [CandidateTrace],
) -> Vec<CandidateVerdict> {
    let mut verdicts = Vec::new();

    for (index, candidate) in candidates
        .iter_mut()
        .enumerate()
        .filter(|(_, c)| c.confirm_ratio == 1.0)
    {
        info!(
            api = %candidate.api.unique_string(),
            widget = %candidate.widget.uid(),
            "replaying confirmed candidate with enforcement"
        );

        candidate.trace.reset();
        let reference = match oracle.playback(config, &mut candidate.trace, None) {
            Ok(result) => result,
            Err(err) => {
                warn!(%err, "reference playback failed; candidate left unevaluated");
                continue;
            }
        };

        candidate.trace.reset();
        let mut strategy = EnforcementStrategy::new(
            candidate.widget.uid().clone(),
            candidate.api.clone(),
            channel,
        );
        let result = match oracle.playback(config, &mut candidate.trace, Some(&mut strategy)) {
            Ok(result) => result,
            Err(err) => {
                warn!(%err, "enforced playback failed; candidate left unevaluated");
                continue;
            }
        };

        let comparison = compare(&reference, &result);
        info!(status = ?comparison.status, "enforced run classified");
        verdicts.push(CandidateVerdict {
            candidate_index: index,
            comparison,
        });

        let explored = build_associations(&result.records, api_list);
        let widget_reappeared = explored
            .iter()
            .any(|e| e.widget.uid() == candidate.widget.uid());
        if !widget_reappeared {
            continue;
        }

        candidate.blocked_ratio = candidate.explored_ratio();
        candidate.seen_widgets_block = result.unique_observed_widgets();

        let unseen = unseen_widgets(&candidate.seen_widgets, &candidate.seen_widgets_block);
        candidate.unseen_ratio = if candidate.seen_widgets.is_empty() {
            0.0
        } else {
            unseen.len() as f64 / candidate.seen_widgets.len() as f64
        };
        info!(
            blocked_ratio = candidate.blocked_ratio,
            unseen_ratio = candidate.unseen_ratio,
            "enforcement evaluated"
        );
    }

    verdicts
}
