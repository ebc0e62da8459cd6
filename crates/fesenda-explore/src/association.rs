//! Widget-API association: walk an exploration's action history and collect,
//! per logical widget, the distinct sensitive APIs observed while interacting
//! with it. Runtime-permission dialog interactions are attributed back to the
//! widget whose click raised the dialog.

use std::path::PathBuf;

use fesenda_model::action::ActionRecord;
use fesenda_model::api::ObservedApiCall;
use fesenda_model::sensitive::SensitiveApiList;
use fesenda_model::widget::Widget;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One sensitive API found on a widget, with the screenshot of the moment it
/// was observed. Equality is on the API unique-string only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundApi {
    pub api: ObservedApiCall,
    pub screenshot: Option<PathBuf>,
}

impl PartialEq for FoundApi {
    fn eq(&self, other: &Self) -> bool {
        self.api.unique_string() == other.api.unique_string()
    }
}

/// Aggregated findings for one logical widget.
///
/// Invariant: `found_apis` holds at most one entry per API unique-string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploredWidget {
    pub widget: Widget,
    pub found_apis: Vec<FoundApi>,
}

impl ExploredWidget {
    pub fn new(widget: Widget) -> Self {
        Self {
            widget,
            found_apis: Vec::new(),
        }
    }

    /// Record an API finding, keeping only the first occurrence per
    /// unique-string.
    pub fn add_found_api(&mut self, api: ObservedApiCall, screenshot: Option<PathBuf>) {
        let unique = api.unique_string();
        if self
            .found_apis
            .iter()
            .any(|f| f.api.unique_string() == unique)
        {
            return;
        }
        self.found_apis.push(FoundApi { api, screenshot });
    }

    /// Union another instance's findings into this one. Both sides must refer
    /// to the same widget identity; a mismatched merge is a programming error.
    pub fn merge(&mut self, other: &ExploredWidget) {
        assert_eq!(
            self.widget.uid(),
            other.widget.uid(),
            "merge requires equal widget identity"
        );
        for found in &other.found_apis {
            self.add_found_api(found.api.clone(), found.screenshot.clone());
        }
    }
}

/// Build the per-widget sensitive-API association for an action history.
pub fn build_associations(
    records: &[ActionRecord],
    api_list: &SensitiveApiList,
) -> Vec<ExploredWidget> {
    let mut explored: Vec<ExploredWidget> = Vec::new();

    for index in 0..records.len() {
        let Some(summary) = explored_widget_at(records, index, api_list) else {
            continue;
        };

        match explored
            .iter_mut()
            .find(|e| e.widget.uid() == summary.widget.uid())
        {
            Some(existing) => existing.merge(&summary),
            None => {
                debug!(
                    widget = %summary.widget.uid(),
                    apis = summary.found_apis.len(),
                    "new widget with sensitive APIs"
                );
                explored.push(summary);
            }
        }
    }

    explored
}

/// Extract the attributed findings of a single record, if any.
fn explored_widget_at(
    records: &[ActionRecord],
    index: usize,
    api_list: &SensitiveApiList,
) -> Option<ExploredWidget> {
    let record = &records[index];

    let sensitive: Vec<&ObservedApiCall> = record
        .observed_calls
        .iter()
        .filter(|call| api_list.is_sensitive(call))
        .collect();
    if sensitive.is_empty() {
        return None;
    }

    let attributed = match &record.action {
        // Launch/reset-time API calls belong to the dummy widget.
        fesenda_model::action::Action::Reset => Widget::dummy(),
        action => {
            let widget = action.target_widget()?;
            if action.endorses_runtime_permission() {
                attribute_permission_dialog(records, index)
            } else {
                widget.clone()
            }
        }
    };

    let mut summary = ExploredWidget::new(attributed);
    for call in sensitive {
        summary.add_found_api(call.clone(), record.screenshot.clone());
    }
    Some(summary)
}

/// Resolve the widget a permission-dialog interaction stands for: the nearest
/// prior non-permission widget interaction. Hitting a reset or the start of
/// history resolves to the dummy widget.
///
/// Explicit backward loop; histories can be long and a reset is never itself
/// a permission-dialog continuation, so the walk always terminates.
fn attribute_permission_dialog(records: &[ActionRecord], index: usize) -> Widget {
    let mut i = index;
    while i > 0 {
        i -= 1;
        let action = &records[i].action;
        if action.is_reset() {
            return Widget::dummy();
        }
        if let Some(widget) = action.target_widget() {
            if !action.endorses_runtime_permission() {
                return widget.clone();
            }
        }
    }
    // Permission interaction at the very start of history.
    Widget::dummy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fesenda_model::action::{Action, UiState};

    fn camera() -> ObservedApiCall {
        ObservedApiCall::new("android.hardware.Camera", "open", vec!["int".into()])
    }

    fn location() -> ObservedApiCall {
        ObservedApiCall::new(
            "android.location.LocationManager",
            "getLastKnownLocation",
            vec!["java.lang.String".into()],
        )
    }

    #[test]
    fn test_merge_unions_by_unique_string() {
        let w = Widget::new("c", "r", "t", "");
        let mut a = ExploredWidget::new(w.clone());
        a.add_found_api(camera(), None);

        let mut b = ExploredWidget::new(w);
        b.add_found_api(camera(), None);
        b.add_found_api(location(), None);

        a.merge(&b);
        assert_eq!(a.found_apis.len(), 2);
    }

    #[test]
    fn test_merge_order_independent() {
        let w = Widget::new("c", "r", "t", "");
        let mut a1 = ExploredWidget::new(w.clone());
        a1.add_found_api(camera(), None);
        let mut b1 = ExploredWidget::new(w.clone());
        b1.add_found_api(location(), None);

        let mut a2 = b1.clone();
        let b2 = a1.clone();

        a1.merge(&b1);
        a2.merge(&b2);

        let strings = |e: &ExploredWidget| {
            let mut v: Vec<String> = e.found_apis.iter().map(|f| f.api.unique_string()).collect();
            v.sort();
            v
        };
        assert_eq!(strings(&a1), strings(&a2));
    }

    #[test]
    #[should_panic(expected = "equal widget identity")]
    fn test_merge_rejects_identity_mismatch() {
        let mut a = ExploredWidget::new(Widget::new("c", "one", "", ""));
        let b = ExploredWidget::new(Widget::new("c", "two", "", ""));
        a.merge(&b);
    }

    #[test]
    fn test_permission_dialog_attributed_to_prior_widget() {
        let button = Widget::new("android.widget.Button", "use_camera", "Camera", "");
        let allow = Widget::new("android.widget.Button", "permission_allow", "Allow", "");

        let records = vec![
            ActionRecord::new(Action::Reset, UiState::default()),
            ActionRecord::new(Action::click(button.clone()), UiState::default()),
            ActionRecord::new(Action::endorse_permission(allow), UiState::default())
                .with_calls(vec![camera()]),
        ];

        let explored = build_associations(&records, &SensitiveApiList::embedded());
        assert_eq!(explored.len(), 1);
        assert_eq!(explored[0].widget.uid(), button.uid());
        assert_eq!(explored[0].found_apis.len(), 1);
    }

    #[test]
    fn test_permission_dialog_after_reset_routes_to_dummy() {
        let allow = Widget::new("android.widget.Button", "permission_allow", "Allow", "");
        let records = vec![
            ActionRecord::new(Action::Reset, UiState::default()),
            ActionRecord::new(Action::endorse_permission(allow), UiState::default())
                .with_calls(vec![location()]),
        ];

        let explored = build_associations(&records, &SensitiveApiList::embedded());
        assert_eq!(explored.len(), 1);
        assert!(explored[0].widget.is_dummy());
    }

    #[test]
    fn test_launch_time_calls_route_to_dummy() {
        let records = vec![
            ActionRecord::new(Action::Reset, UiState::default()).with_calls(vec![location()])
        ];

        let explored = build_associations(&records, &SensitiveApiList::embedded());
        assert_eq!(explored.len(), 1);
        assert!(explored[0].widget.is_dummy());
    }

    #[test]
    fn test_chained_permission_dialogs_walk_back() {
        let button = Widget::new("android.widget.Button", "share", "Share", "");
        let allow1 = Widget::new("android.widget.Button", "allow_fine", "Allow", "");
        let allow2 = Widget::new("android.widget.Button", "allow_coarse", "Allow", "");

        let records = vec![
            ActionRecord::new(Action::Reset, UiState::default()),
            ActionRecord::new(Action::click(button.clone()), UiState::default()),
            ActionRecord::new(Action::endorse_permission(allow1), UiState::default()),
            ActionRecord::new(Action::endorse_permission(allow2), UiState::default())
                .with_calls(vec![camera()]),
        ];

        let explored = build_associations(&records, &SensitiveApiList::embedded());
        assert_eq!(explored.len(), 1);
        assert_eq!(explored[0].widget.uid(), button.uid());
    }

    #[test]
    fn test_non_sensitive_calls_ignored() {
        let button = Widget::new("android.widget.Button", "toast", "Hi", "");
        let benign = ObservedApiCall::new("android.widget.Toast", "show", vec![]);
        let records = vec![
            ActionRecord::new(Action::Reset, UiState::default()),
            ActionRecord::new(Action::click(button), UiState::default()).with_calls(vec![benign]),
        ];

        assert!(build_associations(&records, &SensitiveApiList::embedded()).is_empty());
    }

    #[test]
    fn test_repeat_findings_merge_into_one_entry() {
        let button = Widget::new("android.widget.Button", "cam", "Camera", "");
        let records = vec![
            ActionRecord::new(Action::Reset, UiState::default()),
            ActionRecord::new(Action::click(button.clone()), UiState::default())
                .with_calls(vec![camera()]),
            ActionRecord::new(Action::click(button.clone()), UiState::default())
                .with_calls(vec![camera(), location()]),
        ];

        let explored = build_associations(&records, &SensitiveApiList::embedded());
        assert_eq!(explored.len(), 1);
        assert_eq!(explored[0].found_apis.len(), 2);
    }
}
