use std::collections::HashSet;

use fesenda_core::confirm::confirm_candidates;
use fesenda_core::summary::AnalysisSummary;
use fesenda_explore::association::build_associations;
use fesenda_explore::candidate::{create_candidate_traces, CandidateTrace};
use fesenda_explore::oracle::{ExplorationOracle, ExploreConfig};
use fesenda_explore::sim::{demo_script, SimulatedOracle};
use fesenda_explore::trace::build_playback_traces;
use fesenda_model::sensitive::SensitiveApiList;
use fesenda_model::widget::{Widget, WidgetId};

fn demo_candidates(oracle: &mut SimulatedOracle, config: &ExploreConfig) -> Vec<CandidateTrace> {
    let results = oracle.explore(config).unwrap();
    let api_list = SensitiveApiList::embedded();
    let explored = build_associations(&results[0].records, &api_list);
    let traces = build_playback_traces(&results[0].records);
    create_candidate_traces(&explored, &traces)
}

fn attach_uid() -> WidgetId {
    Widget::new("android.widget.Button", "btn_attach_photo", "Attach photo", "")
        .uid()
        .clone()
}

#[test]
fn test_reliable_candidates_confirm_with_full_ratio() {
    let mut oracle = SimulatedOracle::new(demo_script());
    let config = ExploreConfig::default();
    let mut candidates = demo_candidates(&mut oracle, &config);
    // Launch-time location on the dummy widget plus camera on the button.
    assert_eq!(candidates.len(), 2);

    confirm_candidates(
        &mut oracle,
        &config,
        &SensitiveApiList::embedded(),
        3,
        &mut candidates,
    );

    for candidate in &candidates {
        assert_eq!(candidate.confirm_ratio, 1.0, "candidate: {candidate}");
        assert!(!candidate.seen_widgets.is_empty());
    }
}

#[test]
fn test_flaky_widget_stays_unconfirmed() {
    // The attach button vanishes on the second replay only.
    let mut oracle = SimulatedOracle::new(demo_script())
        .with_flaky_widget(attach_uid(), HashSet::from([2]));
    let config = ExploreConfig::default();
    let mut candidates = demo_candidates(&mut oracle, &config);
    candidates.retain(|c| !c.widget.is_dummy());
    assert_eq!(candidates.len(), 1);

    confirm_candidates(
        &mut oracle,
        &config,
        &SensitiveApiList::embedded(),
        3,
        &mut candidates,
    );

    // One of three attempts missed the widget: unanimity is gone.
    assert_eq!(candidates[0].confirm_ratio, 0.0);
    assert_eq!(oracle.playback_attempts(), 3);
}

#[test]
fn test_playback_error_only_affects_current_candidate() {
    let mut oracle = SimulatedOracle::new(demo_script());
    let config = ExploreConfig::default();
    let mut candidates = demo_candidates(&mut oracle, &config);
    assert!(candidates[0].widget.is_dummy());

    oracle.fail_next_playback();
    confirm_candidates(
        &mut oracle,
        &config,
        &SensitiveApiList::embedded(),
        3,
        &mut candidates,
    );

    // First attempt of the first candidate failed at the device level.
    assert_eq!(candidates[0].confirm_ratio, 0.0);
    // The remaining candidate still ran all attempts and confirmed.
    assert_eq!(candidates[1].confirm_ratio, 1.0);
}

#[test]
fn test_single_attempt_confirmation() {
    let mut oracle = SimulatedOracle::new(demo_script());
    let config = ExploreConfig::default();
    let mut candidates = demo_candidates(&mut oracle, &config);
    candidates.retain(|c| !c.widget.is_dummy());

    confirm_candidates(
        &mut oracle,
        &config,
        &SensitiveApiList::embedded(),
        1,
        &mut candidates,
    );

    assert_eq!(candidates[0].confirm_ratio, 1.0);
    assert_eq!(oracle.playback_attempts(), 1);
}

#[test]
fn test_zero_attempts_leaves_candidates_unconfirmed() {
    let mut oracle = SimulatedOracle::new(demo_script());
    let config = ExploreConfig::default();
    let mut candidates = demo_candidates(&mut oracle, &config);
    assert!(!candidates.is_empty());

    confirm_candidates(
        &mut oracle,
        &config,
        &SensitiveApiList::embedded(),
        0,
        &mut candidates,
    );

    // No replay runs and no ratio turns into NaN via a zero division.
    assert_eq!(oracle.playback_attempts(), 0);
    for candidate in &candidates {
        assert_eq!(candidate.confirm_ratio, 0.0);
    }

    // Every candidate is accounted for as not confirmed.
    let summary = AnalysisSummary::from_candidates(1, &candidates);
    assert_eq!(summary.confirmed, 0);
    assert_eq!(summary.not_confirmed, candidates.len());
}
