use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::ObservedApiCall;
use crate::widget::Widget;

/// How a widget was interacted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionKind {
    Click,
    LongClick,
    EnterText,
}

/// A widget-targeting interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetInteraction {
    pub widget: Widget,
    pub kind: InteractionKind,
    /// True when this interaction answers a runtime-permission dialog rather
    /// than exercising the app itself.
    pub endorses_permission: bool,
}

/// One action taken by the exploration engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Restart the app to a known initial state. Delimits trace segments.
    Reset,
    Interact(WidgetInteraction),
    PressBack,
    Terminate,
}

impl Action {
    pub fn click(widget: Widget) -> Self {
        Action::Interact(WidgetInteraction {
            widget,
            kind: InteractionKind::Click,
            endorses_permission: false,
        })
    }

    pub fn endorse_permission(widget: Widget) -> Self {
        Action::Interact(WidgetInteraction {
            widget,
            kind: InteractionKind::Click,
            endorses_permission: true,
        })
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Action::Reset)
    }

    /// The widget this action targets, if any.
    pub fn target_widget(&self) -> Option<&Widget> {
        match self {
            Action::Interact(i) => Some(&i.widget),
            _ => None,
        }
    }

    /// Whether this action is a runtime-permission dialog continuation.
    pub fn endorses_runtime_permission(&self) -> bool {
        matches!(self, Action::Interact(i) if i.endorses_permission)
    }
}

/// The UI state an action produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    pub widgets: Vec<Widget>,
    /// True when the screen is a runtime-permission request dialog.
    pub is_permission_dialog: bool,
}

impl UiState {
    pub fn new(widgets: Vec<Widget>) -> Self {
        Self {
            widgets,
            is_permission_dialog: false,
        }
    }

    pub fn permission_dialog(widgets: Vec<Widget>) -> Self {
        Self {
            widgets,
            is_permission_dialog: true,
        }
    }
}

/// One entry of an exploration's action history: the action, the API calls
/// intercepted while it executed, and the resulting UI state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    pub observed_calls: Vec<ObservedApiCall>,
    pub result_state: UiState,
    pub screenshot: Option<PathBuf>,
}

impl ActionRecord {
    pub fn new(action: Action, result_state: UiState) -> Self {
        Self {
            action,
            observed_calls: Vec::new(),
            result_state,
            screenshot: None,
        }
    }

    pub fn with_calls(mut self, calls: Vec<ObservedApiCall>) -> Self {
        self.observed_calls = calls;
        self
    }

    pub fn with_screenshot(mut self, screenshot: PathBuf) -> Self {
        self.screenshot = Some(screenshot);
        self
    }
}
