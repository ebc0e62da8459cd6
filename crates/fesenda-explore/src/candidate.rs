//! Candidate traces: the unit of investigation of the pipeline. One candidate
//! per (widget, trace-segment, API) triple, progressively enriched by the
//! confirmation and enforcement stages.

use std::path::PathBuf;

use fesenda_model::api::ObservedApiCall;
use fesenda_model::widget::{Widget, WidgetId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::association::ExploredWidget;
use crate::trace::PlaybackTrace;

/// A (widget, trace, API) triple under investigation, with the result fields
/// the confirmation and enforcement stages accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrace {
    pub widget: Widget,
    pub trace: PlaybackTrace,
    pub api: ObservedApiCall,
    pub screenshot: Option<PathBuf>,
    /// Mean reproducibility over the confirmation attempts; stays 0.0 unless
    /// every attempt succeeded.
    pub confirm_ratio: f64,
    /// Reproducibility ratio measured under enforcement.
    pub blocked_ratio: f64,
    /// Fraction of baseline widgets no longer seen (nor structurally
    /// equivalent) under enforcement.
    pub unseen_ratio: f64,
    /// Widgets observed across the confirmation replays.
    pub seen_widgets: Vec<Widget>,
    /// Widgets observed during the enforced replay.
    pub seen_widgets_block: Vec<Widget>,
}

impl CandidateTrace {
    pub fn new(
        widget: Widget,
        trace: PlaybackTrace,
        api: ObservedApiCall,
        screenshot: Option<PathBuf>,
    ) -> Self {
        Self {
            widget,
            trace,
            api,
            screenshot,
            confirm_ratio: 0.0,
            blocked_ratio: 0.0,
            unseen_ratio: 0.0,
            seen_widgets: Vec::new(),
            seen_widgets_block: Vec::new(),
        }
    }

    /// The replay target: the candidate widget, or the whole trace for the
    /// dummy widget (launch behavior has no target step).
    fn target(&self) -> Option<&WidgetId> {
        if self.widget.is_dummy() {
            None
        } else {
            Some(self.widget.uid())
        }
    }

    /// How far the last replay got towards the candidate widget.
    pub fn explored_ratio(&self) -> f64 {
        self.trace.explored_ratio(self.target())
    }

    /// Union widgets into the confirmation-baseline seen set, dedup by uid.
    pub fn extend_seen_widgets(&mut self, widgets: &[Widget]) {
        for widget in widgets {
            if !self.seen_widgets.iter().any(|w| w.uid() == widget.uid()) {
                self.seen_widgets.push(widget.clone());
            }
        }
    }
}

impl std::fmt::Display for CandidateTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "C{}\tB{}\tU{}\t{}\t{}\t{}",
            self.confirm_ratio,
            self.blocked_ratio,
            self.unseen_ratio,
            self.widget.uid(),
            self.api.unique_string(),
            self.screenshot
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )
    }
}

/// Cross-product widget findings against the trace segments containing the
/// widget: one candidate per (widget, segment, API). The dummy widget is
/// associated with the first segment only, since launch behavior is
/// segment-independent.
pub fn create_candidate_traces(
    explored_widgets: &[ExploredWidget],
    traces: &[PlaybackTrace],
) -> Vec<CandidateTrace> {
    let mut candidates = Vec::new();

    for explored in explored_widgets {
        let matching: Vec<&PlaybackTrace> = if explored.widget.is_dummy() {
            traces.first().into_iter().collect()
        } else {
            traces
                .iter()
                .filter(|t| t.contains(explored.widget.uid()))
                .collect()
        };

        for found in &explored.found_apis {
            for trace in &matching {
                debug!(
                    widget = %explored.widget.uid(),
                    api = %found.api.unique_string(),
                    "candidate trace created"
                );
                candidates.push(CandidateTrace::new(
                    explored.widget.clone(),
                    (*trace).clone(),
                    found.api.clone(),
                    found.screenshot.clone(),
                ));
            }
        }
    }

    candidates
}
