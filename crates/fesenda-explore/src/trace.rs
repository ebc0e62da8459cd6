//! Replayable playback traces and the reset-delimited segmenter.

use fesenda_model::action::{Action, ActionRecord, UiState};
use fesenda_model::widget::WidgetId;
use serde::{Deserialize, Serialize};

/// A single step of a playback trace: the action taken and the UI state it
/// produced, plus whether the most recent replay reached this step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub action: Action,
    pub result_state: UiState,
    /// Set by the oracle during playback, cleared by [`PlaybackTrace::reset`].
    pub replayed: bool,
}

/// An ordered, replayable sub-trace of an exploration, implicitly beginning
/// after a reset. Never mutated after segmenting except for replay marks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackTrace {
    steps: Vec<TraceStep>,
}

impl PlaybackTrace {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, action: Action, result_state: UiState) {
        self.steps.push(TraceStep {
            action,
            result_state,
            replayed: false,
        });
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether any step targets the given widget identity.
    pub fn contains(&self, uid: &WidgetId) -> bool {
        self.steps
            .iter()
            .any(|s| s.action.target_widget().map(|w| w.uid()) == Some(uid))
    }

    /// Clear replay marks before a fresh attempt.
    pub fn reset(&mut self) {
        for step in &mut self.steps {
            step.replayed = false;
        }
    }

    /// Mark a step as successfully replayed. Out-of-range indices are a
    /// programming error on the oracle side.
    pub fn mark_replayed(&mut self, index: usize) {
        self.steps[index].replayed = true;
    }

    /// Fraction of the trace successfully replayed, measured on the prefix up
    /// to and including the first step targeting `target`. With no target (or
    /// a target that never appears) the whole trace counts.
    pub fn explored_ratio(&self, target: Option<&WidgetId>) -> f64 {
        let prefix_len = target
            .and_then(|uid| {
                self.steps
                    .iter()
                    .position(|s| s.action.target_widget().map(|w| w.uid()) == Some(uid))
                    .map(|p| p + 1)
            })
            .unwrap_or(self.steps.len());

        if prefix_len == 0 {
            return 0.0;
        }

        let replayed = self.steps[..prefix_len].iter().filter(|s| s.replayed).count();
        replayed as f64 / prefix_len as f64
    }
}

/// Split a full action history into independently replayable sub-traces,
/// each started by a reset record. The exploration oracle guarantees the
/// first record of a history is a reset.
pub fn build_playback_traces(records: &[ActionRecord]) -> Vec<PlaybackTrace> {
    let mut traces: Vec<PlaybackTrace> = Vec::new();

    for record in records {
        if record.action.is_reset() {
            traces.push(PlaybackTrace::new());
        }
        traces
            .last_mut()
            .expect("action history starts with a reset")
            .push(record.action.clone(), record.result_state.clone());
    }

    traces
}
