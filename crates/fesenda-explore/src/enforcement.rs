//! Runtime policy enforcement: the policy directive channel and the replay
//! strategy that blocks a target API while the target widget is interacted
//! with.
//!
//! The channel is a single global mutable slot on the controlled environment.
//! Writers always fully overwrite it — stale directives from a previous
//! candidate must never leak into the next action.

use std::path::PathBuf;

use fesenda_model::action::{Action, InteractionKind, UiState};
use fesenda_model::api::ObservedApiCall;
use fesenda_model::widget::WidgetId;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to write policy file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Handle to the environment's policy directive slot. `push` replaces the
/// whole slot; the empty string clears all blocking.
pub trait PolicyChannel {
    fn push(&mut self, directive: &str) -> Result<(), PolicyError>;
}

/// File-backed channel: the device-side enforcement actuator consumes this
/// file. Each push rewrites the file in full.
#[derive(Debug)]
pub struct FilePolicyChannel {
    path: PathBuf,
}

impl FilePolicyChannel {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PolicyChannel for FilePolicyChannel {
    fn push(&mut self, directive: &str) -> Result<(), PolicyError> {
        std::fs::write(&self.path, directive).map_err(|source| PolicyError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// In-memory channel for tests and the simulated oracle. Keeps the push
/// history so tests can assert on overwrite ordering.
#[derive(Debug, Default)]
pub struct InMemoryPolicyChannel {
    current: String,
    history: Vec<String>,
}

impl InMemoryPolicyChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl PolicyChannel for InMemoryPolicyChannel {
    fn push(&mut self, directive: &str) -> Result<(), PolicyError> {
        self.current = directive.to_string();
        self.history.push(directive.to_string());
        Ok(())
    }
}

/// Policy-enforcing replay strategy for one candidate: blocks `api` at the
/// moment execution reaches the target widget, clears the policy for every
/// other widget interaction, and leaves whatever policy is active untouched
/// across runtime-permission dialog continuations.
pub struct EnforcementStrategy<'a> {
    target: WidgetId,
    api: ObservedApiCall,
    channel: &'a mut dyn PolicyChannel,
    /// Mirrors the directive currently on the channel.
    active: String,
}

impl<'a> EnforcementStrategy<'a> {
    pub fn new(target: WidgetId, api: ObservedApiCall, channel: &'a mut dyn PolicyChannel) -> Self {
        Self {
            target,
            api,
            channel,
            active: String::new(),
        }
    }

    pub fn target(&self) -> &WidgetId {
        &self.target
    }

    /// The directive currently in force.
    pub fn active_policy(&self) -> &str {
        &self.active
    }

    /// Apply enforcement for the action about to execute. Returns the
    /// directive in force afterwards.
    pub fn on_action(&mut self, action: &Action, prev_state: &UiState) -> Result<&str, PolicyError> {
        // A permission dialog is part of the same logical step as the action
        // that raised it: keep the current policy.
        if prev_state.is_permission_dialog || action.endorses_runtime_permission() {
            return Ok(&self.active);
        }

        if self.should_enable(action) {
            let directive = self.api.policy_string();
            warn!(policy = %directive, "enforcing policy");
            self.channel.push(&directive)?;
            self.active = directive;
        } else {
            self.channel.push("")?;
            self.active.clear();
        }

        Ok(&self.active)
    }

    fn should_enable(&self, action: &Action) -> bool {
        match action {
            Action::Reset => self.target.is_reset(),
            Action::Interact(i) => {
                matches!(i.kind, InteractionKind::Click | InteractionKind::LongClick)
                    && i.widget.uid() == &self.target
            }
            _ => false,
        }
    }
}
