//! The exploration-oracle seam.
//!
//! The UI-exploration engine (device control, widget discovery, action
//! execution) is an external collaborator. The pipeline only needs two
//! invocation modes: plain exploration, and playback of a single trace with
//! an optional policy-enforcing strategy layered on top. Implementations
//! mark successfully replayed steps on the trace they are given.

use fesenda_model::exploration::ExplorationResult;
use serde::{Deserialize, Serialize};

use crate::enforcement::EnforcementStrategy;
use crate::trace::PlaybackTrace;

/// Configuration handed to the oracle for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    /// Package under exploration. Empty = all packages the oracle knows.
    pub app_package: String,
    /// Seed for reproducible exploration order.
    pub seed: u64,
    /// Upper bound on actions per run.
    pub max_actions: u32,
    /// Number of reset-delimited passes a plain exploration performs.
    pub reset_passes: u32,
    pub take_screenshots: bool,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            app_package: String::new(),
            seed: 42,
            max_actions: 100,
            reset_passes: 1,
            take_screenshots: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("device/environment failure: {0}")]
    Device(String),

    #[error("app under exploration crashed: {0}")]
    AppCrash(String),

    #[error("exploration fault: {0}")]
    Internal(String),

    #[error(transparent)]
    Policy(#[from] crate::enforcement::PolicyError),
}

/// Opaque exploration engine: given a configuration (and, for playback, a
/// trace plus optional enforcement strategy), returns completed exploration
/// records. Calls block until the run finishes; the pipeline never invokes
/// the oracle concurrently.
pub trait ExplorationOracle {
    /// Plain exploration: one completed record per app explored.
    fn explore(&mut self, config: &ExploreConfig) -> Result<Vec<ExplorationResult>, OracleError>;

    /// Replay a single trace, marking the steps that were reached on the
    /// trace. With `enforcement` present, the strategy is consulted before
    /// each action and its policy directives drive the environment.
    fn playback(
        &mut self,
        config: &ExploreConfig,
        trace: &mut PlaybackTrace,
        enforcement: Option<&mut EnforcementStrategy<'_>>,
    ) -> Result<ExplorationResult, OracleError>;
}
