//! A scripted, in-process exploration oracle.
//!
//! Drives a deterministic app model (screens, transitions, per-widget API
//! emissions, runtime-permission dialogs) with a seeded RNG for exploration
//! order, and honors policy directives during enforced playback: a blocked
//! API is mocked — the monitor still observes the call, but the app receives
//! dummy data, which may hide dependent widgets or break the navigation the
//! real data powered. Used by the demo binary and by the engine tests; real
//! device oracles implement the same trait against ADB.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use fesenda_model::action::{Action, ActionRecord, UiState};
use fesenda_model::api::ObservedApiCall;
use fesenda_model::exploration::ExplorationResult;
use fesenda_model::widget::{Widget, WidgetId};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::enforcement::EnforcementStrategy;
use crate::oracle::{ExplorationOracle, ExploreConfig, OracleError};
use crate::trace::PlaybackTrace;

/// One screen of the scripted app.
#[derive(Debug, Clone)]
pub struct Screen {
    pub widgets: Vec<Widget>,
}

/// API calls a widget interaction emits.
#[derive(Debug, Clone, Default)]
pub struct Emission {
    pub calls: Vec<ObservedApiCall>,
    /// The interaction first raises a runtime-permission dialog; the calls
    /// fire on the Allow click. Granted once per run.
    pub via_permission_dialog: bool,
}

/// What blocking an API does to the app beyond suppressing the call.
#[derive(Debug, Clone, Default)]
pub struct BlockEffect {
    /// Widgets that disappear from subsequent states while the API is blocked.
    pub hide_widgets: Vec<WidgetId>,
    /// The interaction no longer navigates (the screen the API populated
    /// cannot open).
    pub breaks_transition: bool,
}

/// A deterministic scripted app model.
#[derive(Debug, Clone)]
pub struct AppScript {
    pub app_package: String,
    pub screens: Vec<Screen>,
    pub initial: usize,
    /// (screen, widget uid) -> destination screen.
    pub transitions: HashMap<(usize, WidgetId), usize>,
    /// widget uid -> emission on interaction.
    pub emissions: HashMap<WidgetId, Emission>,
    /// Calls fired while the app launches (attributed to the dummy widget).
    pub launch_calls: Vec<ObservedApiCall>,
    /// API unique-string -> behavior change while that API is blocked.
    pub block_effects: HashMap<String, BlockEffect>,
    /// The Allow button shown on permission dialogs.
    pub permission_allow: Widget,
}

impl AppScript {
    pub fn new(app_package: impl Into<String>, screens: Vec<Screen>) -> Self {
        Self {
            app_package: app_package.into(),
            screens,
            initial: 0,
            transitions: HashMap::new(),
            emissions: HashMap::new(),
            launch_calls: Vec::new(),
            block_effects: HashMap::new(),
            permission_allow: Widget::new(
                "android.widget.Button",
                "com.android.permissioncontroller:id/permission_allow_button",
                "Allow",
                "",
            ),
        }
    }

    pub fn transition(mut self, from: usize, widget: &Widget, to: usize) -> Self {
        self.transitions.insert((from, widget.uid().clone()), to);
        self
    }

    pub fn emits(mut self, widget: &Widget, emission: Emission) -> Self {
        self.emissions.insert(widget.uid().clone(), emission);
        self
    }

    pub fn launches_with(mut self, calls: Vec<ObservedApiCall>) -> Self {
        self.launch_calls = calls;
        self
    }

    pub fn blocked_effect(mut self, api: &ObservedApiCall, effect: BlockEffect) -> Self {
        self.block_effects.insert(api.unique_string(), effect);
        self
    }
}

/// Scripted oracle over an [`AppScript`].
pub struct SimulatedOracle {
    script: AppScript,
    /// Replay ordinal, for flakiness injection.
    playback_attempts: u64,
    /// Widget that fails to appear on the listed playback ordinals (1-based).
    flaky: Option<(WidgetId, HashSet<u64>)>,
    /// Fail the next playback outright with a device error.
    fail_next_playback: bool,
}

impl SimulatedOracle {
    pub fn new(script: AppScript) -> Self {
        Self {
            script,
            playback_attempts: 0,
            flaky: None,
            fail_next_playback: false,
        }
    }

    /// Make `widget` vanish during the given playback ordinals (1-based),
    /// turning those attempts into non-reproductions.
    pub fn with_flaky_widget(mut self, widget: WidgetId, fail_attempts: HashSet<u64>) -> Self {
        self.flaky = Some((widget, fail_attempts));
        self
    }

    pub fn fail_next_playback(&mut self) {
        self.fail_next_playback = true;
    }

    pub fn playback_attempts(&self) -> u64 {
        self.playback_attempts
    }

    fn widget_vanished(&self, uid: &WidgetId, attempt: u64) -> bool {
        match &self.flaky {
            Some((flaky_uid, attempts)) => flaky_uid == uid && attempts.contains(&attempt),
            None => false,
        }
    }

    fn visible_state(&self, screen: usize, hidden: &HashSet<WidgetId>, attempt: u64) -> UiState {
        let widgets = self.script.screens[screen]
            .widgets
            .iter()
            .filter(|w| !hidden.contains(w.uid()) && !self.widget_vanished(w.uid(), attempt))
            .cloned()
            .collect();
        UiState::new(widgets)
    }

    fn dialog_state(&self) -> UiState {
        UiState::permission_dialog(vec![self.script.permission_allow.clone()])
    }

    /// Apply the active policy to the calls an action emits. A blocked call
    /// is mocked, not removed: the monitor still observes it, but the dummy
    /// data triggers the scripted block effect. Returns whether a blocked
    /// call broke the navigation it powered.
    fn apply_policy(
        &self,
        calls: &[ObservedApiCall],
        active_policy: &str,
        hidden: &mut HashSet<WidgetId>,
    ) -> bool {
        let mut broke_transition = false;
        for call in calls {
            if !active_policy.is_empty() && call.policy_string() == active_policy {
                if let Some(effect) = self.script.block_effects.get(&call.unique_string()) {
                    hidden.extend(effect.hide_widgets.iter().cloned());
                    broke_transition |= effect.breaks_transition;
                }
            }
        }
        broke_transition
    }

    fn screenshot(&self, config: &ExploreConfig, n: usize) -> Option<PathBuf> {
        config
            .take_screenshots
            .then(|| PathBuf::from(format!("screenshot_{n:04}.png")))
    }
}

impl ExplorationOracle for SimulatedOracle {
    fn explore(&mut self, config: &ExploreConfig) -> Result<Vec<ExplorationResult>, OracleError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut records: Vec<ActionRecord> = Vec::new();
        let mut granted: HashSet<WidgetId> = HashSet::new();
        let hidden = HashSet::new();

        for _pass in 0..config.reset_passes.max(1) {
            let mut screen = self.script.initial;
            let mut clicked: HashSet<WidgetId> = HashSet::new();

            let mut launch =
                ActionRecord::new(Action::Reset, self.visible_state(screen, &hidden, 0))
                    .with_calls(self.script.launch_calls.clone());
            launch.screenshot = self.screenshot(config, records.len());
            records.push(launch);

            while records.len() < config.max_actions as usize {
                let mut candidates: Vec<Widget> = self.script.screens[screen]
                    .widgets
                    .iter()
                    .filter(|w| w.can_be_acted_upon() && !clicked.contains(w.uid()))
                    .cloned()
                    .collect();
                if candidates.is_empty() {
                    break;
                }
                candidates.shuffle(&mut rng);
                let widget = candidates.remove(0);
                clicked.insert(widget.uid().clone());

                let emission = self
                    .script
                    .emissions
                    .get(widget.uid())
                    .cloned()
                    .unwrap_or_default();
                let destination = self
                    .script
                    .transitions
                    .get(&(screen, widget.uid().clone()))
                    .copied();

                if emission.via_permission_dialog && !granted.contains(widget.uid()) {
                    // Click raises the dialog; Allow carries the calls.
                    records.push(ActionRecord::new(
                        Action::click(widget.clone()),
                        self.dialog_state(),
                    ));
                    granted.insert(widget.uid().clone());
                    screen = destination.unwrap_or(screen);
                    let mut record = ActionRecord::new(
                        Action::endorse_permission(self.script.permission_allow.clone()),
                        self.visible_state(screen, &hidden, 0),
                    )
                    .with_calls(emission.calls.clone());
                    record.screenshot = self.screenshot(config, records.len());
                    records.push(record);
                } else {
                    screen = destination.unwrap_or(screen);
                    let mut record = ActionRecord::new(
                        Action::click(widget.clone()),
                        self.visible_state(screen, &hidden, 0),
                    )
                    .with_calls(emission.calls.clone());
                    record.screenshot = self.screenshot(config, records.len());
                    records.push(record);
                }
            }
        }

        debug!(
            app = %self.script.app_package,
            actions = records.len(),
            "simulated exploration complete"
        );
        Ok(vec![ExplorationResult::new(
            self.script.app_package.clone(),
            records,
        )])
    }

    fn playback(
        &mut self,
        _config: &ExploreConfig,
        trace: &mut PlaybackTrace,
        mut enforcement: Option<&mut EnforcementStrategy<'_>>,
    ) -> Result<ExplorationResult, OracleError> {
        self.playback_attempts += 1;
        let attempt = self.playback_attempts;

        if self.fail_next_playback {
            self.fail_next_playback = false;
            return Err(OracleError::Device("simulated device failure".into()));
        }

        let mut records: Vec<ActionRecord> = Vec::new();
        let mut screen = self.script.initial;
        let mut granted: HashSet<WidgetId> = HashSet::new();
        let mut hidden: HashSet<WidgetId> = HashSet::new();
        // Widget whose permission dialog is currently open.
        let mut pending_dialog: Option<WidgetId> = None;

        for index in 0..trace.len() {
            let action = trace.steps()[index].action.clone();
            let prev_state = if pending_dialog.is_some() {
                self.dialog_state()
            } else {
                self.visible_state(screen, &hidden, attempt)
            };

            let active_policy = match enforcement.as_deref_mut() {
                Some(strategy) => strategy.on_action(&action, &prev_state)?.to_string(),
                None => String::new(),
            };

            match &action {
                Action::Reset => {
                    screen = self.script.initial;
                    pending_dialog = None;
                    self.apply_policy(&self.script.launch_calls, &active_policy, &mut hidden);
                    trace.mark_replayed(index);
                    records.push(
                        ActionRecord::new(
                            Action::Reset,
                            self.visible_state(screen, &hidden, attempt),
                        )
                        .with_calls(self.script.launch_calls.clone()),
                    );
                }

                Action::Interact(i) if i.endorses_permission => {
                    let Some(trigger) = pending_dialog.take() else {
                        // No dialog open; the step cannot replay.
                        continue;
                    };
                    granted.insert(trigger.clone());
                    let emission = self
                        .script
                        .emissions
                        .get(&trigger)
                        .cloned()
                        .unwrap_or_default();
                    let broke = self.apply_policy(&emission.calls, &active_policy, &mut hidden);
                    if !broke {
                        if let Some(dest) =
                            self.script.transitions.get(&(screen, trigger.clone()))
                        {
                            screen = *dest;
                        }
                    }
                    trace.mark_replayed(index);
                    records.push(
                        ActionRecord::new(
                            action.clone(),
                            self.visible_state(screen, &hidden, attempt),
                        )
                        .with_calls(emission.calls.clone()),
                    );
                }

                Action::Interact(i) => {
                    let uid = i.widget.uid().clone();
                    let present = self.script.screens[screen]
                        .widgets
                        .iter()
                        .any(|w| w.uid() == &uid)
                        && !hidden.contains(&uid)
                        && !self.widget_vanished(&uid, attempt);
                    if !present {
                        continue;
                    }

                    let emission = self
                        .script
                        .emissions
                        .get(&uid)
                        .cloned()
                        .unwrap_or_default();

                    if emission.via_permission_dialog && !granted.contains(&uid) {
                        pending_dialog = Some(uid);
                        trace.mark_replayed(index);
                        records.push(ActionRecord::new(action.clone(), self.dialog_state()));
                    } else {
                        let broke = self.apply_policy(&emission.calls, &active_policy, &mut hidden);
                        if !broke {
                            if let Some(dest) = self.script.transitions.get(&(screen, uid)) {
                                screen = *dest;
                            }
                        }
                        trace.mark_replayed(index);
                        records.push(
                            ActionRecord::new(
                                action.clone(),
                                self.visible_state(screen, &hidden, attempt),
                            )
                            .with_calls(emission.calls.clone()),
                        );
                    }
                }

                Action::PressBack | Action::Terminate => {
                    trace.mark_replayed(index);
                    records.push(ActionRecord::new(
                        action.clone(),
                        self.visible_state(screen, &hidden, attempt),
                    ));
                }
            }
        }

        Ok(ExplorationResult::new(
            self.script.app_package.clone(),
            records,
        ))
    }
}

/// A small demo app for the front end: a notes app whose share button uses
/// the camera behind a runtime-permission dialog, with a preview widget that
/// disappears when the camera API is blocked.
pub fn demo_script() -> AppScript {
    let camera = ObservedApiCall::new("android.hardware.Camera", "open", vec!["int".into()]);
    let location = ObservedApiCall::new(
        "android.location.LocationManager",
        "getLastKnownLocation",
        vec!["java.lang.String".into()],
    );

    let attach = Widget::new("android.widget.Button", "btn_attach_photo", "Attach photo", "");
    let notes = Widget::new("android.widget.Button", "btn_notes", "Notes", "");
    let preview = Widget::new("android.widget.ImageView", "img_preview", "", "photo preview")
        .with_flags(true, false, false);
    let back_home = Widget::new("android.widget.Button", "btn_home", "Home", "");

    let home = Screen {
        widgets: vec![attach.clone(), notes.clone()],
    };
    let editor = Screen {
        widgets: vec![back_home.clone(), preview.clone()],
    };

    AppScript::new("com.example.notes", vec![home, editor])
        .transition(0, &attach, 1)
        .transition(1, &back_home, 0)
        .emits(
            &attach,
            Emission {
                calls: vec![camera.clone()],
                via_permission_dialog: true,
            },
        )
        .launches_with(vec![location])
        .blocked_effect(
            &camera,
            BlockEffect {
                hide_widgets: vec![preview.uid().clone()],
                breaks_transition: false,
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::build_associations;
    use crate::trace::build_playback_traces;
    use fesenda_model::sensitive::SensitiveApiList;

    #[test]
    fn test_explore_starts_with_reset() {
        let mut oracle = SimulatedOracle::new(demo_script());
        let results = oracle.explore(&ExploreConfig::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].records[0].action.is_reset());
    }

    #[test]
    fn test_explore_is_seed_deterministic() {
        let config = ExploreConfig::default();
        let a = SimulatedOracle::new(demo_script()).explore(&config).unwrap();
        let b = SimulatedOracle::new(demo_script()).explore(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_demo_attributes_camera_to_attach_button() {
        let mut oracle = SimulatedOracle::new(demo_script());
        let results = oracle.explore(&ExploreConfig::default()).unwrap();
        let explored = build_associations(&results[0].records, &SensitiveApiList::embedded());

        // Launch-time location on the dummy widget, camera on the button.
        assert!(explored.iter().any(|e| e.widget.is_dummy()));
        assert!(explored.iter().any(|e| {
            e.widget.resource_id == "btn_attach_photo"
                && e.found_apis
                    .iter()
                    .any(|f| f.api.unique_string().contains("Camera->open"))
        }));
    }

    #[test]
    fn test_playback_replays_full_trace() {
        let mut oracle = SimulatedOracle::new(demo_script());
        let config = ExploreConfig::default();
        let results = oracle.explore(&config).unwrap();
        let mut traces = build_playback_traces(&results[0].records);
        let mut trace = traces.remove(0);

        oracle.playback(&config, &mut trace, None).unwrap();
        assert_eq!(trace.explored_ratio(None), 1.0);
    }

    #[test]
    fn test_flaky_widget_breaks_replay_on_listed_attempts() {
        let attach_uid = Widget::new(
            "android.widget.Button",
            "btn_attach_photo",
            "Attach photo",
            "",
        )
        .uid()
        .clone();
        let mut oracle = SimulatedOracle::new(demo_script())
            .with_flaky_widget(attach_uid.clone(), HashSet::from([2]));
        let config = ExploreConfig::default();
        let results = oracle.explore(&config).unwrap();
        let mut trace = build_playback_traces(&results[0].records).remove(0);

        oracle.playback(&config, &mut trace, None).unwrap();
        let first = trace.explored_ratio(Some(&attach_uid));
        trace.reset();
        oracle.playback(&config, &mut trace, None).unwrap();
        let second = trace.explored_ratio(Some(&attach_uid));

        assert_eq!(first, 1.0);
        assert!(second < 1.0);
    }
}
