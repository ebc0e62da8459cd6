//! The end-to-end analysis pipeline: explore, associate, segment, generate
//! candidates, confirm, enforce, classify, and report — strictly
//! sequentially, because every replay reuses the same managed environment
//! and the policy slot is global to it.

use std::path::{Path, PathBuf};

use fesenda_explore::association::build_associations;
use fesenda_explore::candidate::create_candidate_traces;
use fesenda_explore::enforcement::PolicyChannel;
use fesenda_explore::oracle::{ExplorationOracle, ExploreConfig, OracleError};
use fesenda_explore::trace::build_playback_traces;
use fesenda_model::exploration::ExplorationResult;
use fesenda_model::sensitive::{SensitiveApiList, SensitiveListError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::confirm::confirm_candidates;
use crate::enforce::evaluate_confirmed;
use crate::persist::{serialize_candidates, Stage};
use crate::report::{write_analysis_report, write_detailed_report, write_widget_api_summary};
use crate::summary::AnalysisSummary;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Initial exploration failed — not recoverable mid-pipeline.
    #[error("exploration failed: {0}")]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    SensitiveList(#[from] SensitiveListError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid config {path}: attempts_confirm must be at least 1")]
    ConfigInvalid { path: String },
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FesendaConfig {
    /// Root for data and report output.
    pub output_dir: PathBuf,
    /// Confirmation attempts per candidate. 3 removes flaky traces; 1 trades
    /// confidence for speed.
    pub attempts_confirm: u32,
    /// Policy file the device-side enforcement actuator consumes.
    pub policy_file: PathBuf,
    /// External sensitive-API list; the embedded list is used when absent.
    pub sensitive_api_list: Option<PathBuf>,
    /// Settings forwarded to the exploration oracle.
    pub explore: ExploreConfig,
}

impl Default for FesendaConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("out"),
            attempts_confirm: 3,
            policy_file: PathBuf::from("api_policies.txt"),
            sensitive_api_list: None,
            explore: ExploreConfig::default(),
        }
    }
}

impl FesendaConfig {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| PipelineError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;
        if config.attempts_confirm == 0 {
            return Err(PipelineError::ConfigInvalid {
                path: path.display().to_string(),
            });
        }
        Ok(config)
    }

    fn data_dir(&self) -> PathBuf {
        self.output_dir.join("data")
    }

    fn report_dir(&self) -> PathBuf {
        self.output_dir.join("exec_summary")
    }
}

/// Run the full analysis: one plain exploration, then per explored app the
/// association/segmentation/candidate stages followed by confirmation and
/// enforcement replays. Returns one summary per app.
pub fn run_pipeline<O: ExplorationOracle>(
    oracle: &mut O,
    channel: &mut dyn PolicyChannel,
    config: &FesendaConfig,
) -> Result<Vec<AnalysisSummary>, PipelineError> {
    let api_list = match &config.sensitive_api_list {
        Some(path) => SensitiveApiList::from_file(path)?,
        None => SensitiveApiList::embedded(),
    };
    for dir in [&config.data_dir(), &config.report_dir()] {
        std::fs::create_dir_all(dir).map_err(|source| PipelineError::OutputDir {
            path: dir.display().to_string(),
            source,
        })?;
    }

    info!(apis = api_list.len(), "starting exploration");
    let results = oracle.explore(&config.explore)?;

    let mut summaries = Vec::new();
    for result in &results {
        summaries.push(process_app(oracle, channel, config, &api_list, result));
    }
    Ok(summaries)
}

fn process_app<O: ExplorationOracle>(
    oracle: &mut O,
    channel: &mut dyn PolicyChannel,
    config: &FesendaConfig,
    api_list: &SensitiveApiList,
    result: &ExplorationResult,
) -> AnalysisSummary {
    let app = &result.app_package;
    info!(app = %app, actions = result.action_count(), "analyzing exploration");

    let explored_widgets = build_associations(&result.records, api_list);
    write_widget_api_summary(&config.report_dir(), app, &explored_widgets);

    let traces = build_playback_traces(&result.records);
    let mut candidates = create_candidate_traces(&explored_widgets, &traces);
    info!(
        app = %app,
        traces = traces.len(),
        candidates = candidates.len(),
        "candidate traces generated"
    );
    serialize_candidates(&config.data_dir(), app, Stage::Filtered, &candidates);

    confirm_candidates(
        oracle,
        &config.explore,
        api_list,
        config.attempts_confirm,
        &mut candidates,
    );
    serialize_candidates(&config.data_dir(), app, Stage::Confirmed, &candidates);

    let verdicts =
        evaluate_confirmed(oracle, &config.explore, api_list, channel, &mut candidates);
    serialize_candidates(&config.data_dir(), app, Stage::Evaluated, &candidates);

    let summary = AnalysisSummary::from_candidates(traces.len(), &candidates);
    write_analysis_report(&config.report_dir(), &summary, &candidates);
    for (idx, candidate) in candidates.iter().enumerate() {
        let verdict = verdicts
            .iter()
            .find(|v| v.candidate_index == idx)
            .map(|v| &v.comparison);
        write_detailed_report(&config.report_dir(), candidate, verdict, idx);
    }

    info!(app = %app, %summary, "analysis complete");
    summary
}
