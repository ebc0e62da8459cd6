use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::action::ActionRecord;
use crate::widget::{Widget, WidgetId};

/// A completed exploration run for one app, as returned by the exploration
/// oracle: the ordered action history plus the widget model it discovered.
/// Read-only from the analysis core's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationResult {
    pub app_package: String,
    pub records: Vec<ActionRecord>,
}

impl ExplorationResult {
    pub fn new(app_package: impl Into<String>, records: Vec<ActionRecord>) -> Self {
        Self {
            app_package: app_package.into(),
            records,
        }
    }

    pub fn action_count(&self) -> usize {
        self.records.len()
    }

    /// All distinct widgets observed across the run, deduplicated by uid.
    /// The first instance seen for an identity group is the representative.
    pub fn unique_observed_widgets(&self) -> Vec<Widget> {
        let mut seen: HashSet<WidgetId> = HashSet::new();
        let mut widgets = Vec::new();
        for record in &self.records {
            for widget in &record.result_state.widgets {
                if seen.insert(widget.uid().clone()) {
                    widgets.push(widget.clone());
                }
            }
        }
        widgets
    }

    /// The distinct widgets that expose an interaction affordance.
    pub fn actionable_widgets(&self) -> Vec<Widget> {
        self.unique_observed_widgets()
            .into_iter()
            .filter(Widget::can_be_acted_upon)
            .collect()
    }
}
