//! Confirmation engine: replay each candidate trace a fixed number of times
//! to weed out flaky widget-API findings before any enforcement step.
//!
//! Confirmation requires unanimous reproducibility — a single attempt that
//! does not re-produce the widget with a sensitive API marks the candidate
//! as unreliable and leaves `confirm_ratio` at 0.0.

use fesenda_explore::association::build_associations;
use fesenda_explore::candidate::CandidateTrace;
use fesenda_explore::oracle::{ExplorationOracle, ExploreConfig};
use fesenda_model::sensitive::SensitiveApiList;
use tracing::{info, warn};

/// Replay every candidate `attempts` times, strictly sequentially (each
/// attempt depends on the environment state left by the previous reset).
/// A failed oracle invocation counts as a failed attempt for that candidate
/// only; the remaining candidates still run.
pub fn confirm_candidates<O: ExplorationOracle>(
    oracle: &mut O,
    config: &ExploreConfig,
    api_list: &SensitiveApiList,
    attempts: u32,
    candidates: &mut [CandidateTrace],
) {
    // Zero attempts would make the unanimity check hold vacuously and the
    // mean ratio divide by zero; nothing can be confirmed without a replay.
    if attempts == 0 {
        warn!("confirmation requested with zero attempts; all candidates stay unconfirmed");
        return;
    }

    for candidate in candidates.iter_mut() {
        let mut ratio_sum = 0.0;
        let mut success_count = 0u32;

        for attempt in 0..attempts {
            info!(
                attempt,
                api = %candidate.api.unique_string(),
                widget = %candidate.widget.uid(),
                "replaying candidate trace"
            );
            candidate.trace.reset();

            let result = match oracle.playback(config, &mut candidate.trace, None) {
                Ok(result) => result,
                Err(err) => {
                    warn!(%err, "playback attempt failed; candidate stays unconfirmed");
                    continue;
                }
            };

            let explored = build_associations(&result.records, api_list);
            let reproduced = explored
                .iter()
                .any(|e| e.widget.uid() == candidate.widget.uid());
            if reproduced {
                success_count += 1;
                ratio_sum += candidate.explored_ratio();
                candidate.extend_seen_widgets(&result.unique_observed_widgets());
            }
        }

        candidate.trace.reset();
        if success_count == attempts {
            candidate.confirm_ratio = ratio_sum / attempts as f64;
            info!(
                widget = %candidate.widget.uid(),
                confirm_ratio = candidate.confirm_ratio,
                "candidate confirmed"
            );
        }
    }
}
