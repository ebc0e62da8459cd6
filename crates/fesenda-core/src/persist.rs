//! Staged candidate persistence: every candidate is written after the
//! filtering, confirmation, and evaluation stages so a run can be audited
//! or resumed. A failed write is logged and skipped — persistence failures
//! do not affect analysis correctness.

use std::path::{Path, PathBuf};

use fesenda_explore::candidate::CandidateTrace;
use tracing::{error, info};

/// Pipeline stage a candidate snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filtered,
    Confirmed,
    Evaluated,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Filtered => "filtered",
            Stage::Confirmed => "confirmed",
            Stage::Evaluated => "evaluated",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to write candidate to {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to encode/decode candidate at {path}: {source}")]
    Codec {
        path: String,
        source: serde_json::Error,
    },
}

/// `{appPackage}_{stage}_{index}.json` under the data directory.
pub fn candidate_path(data_dir: &Path, app_package: &str, stage: Stage, index: usize) -> PathBuf {
    data_dir.join(format!("{}_{}_{}.json", app_package, stage.as_str(), index))
}

fn write_candidate(path: &Path, candidate: &CandidateTrace) -> Result<(), PersistError> {
    let json =
        serde_json::to_string_pretty(candidate).map_err(|source| PersistError::Codec {
            path: path.display().to_string(),
            source,
        })?;
    std::fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reload a previously serialized candidate.
pub fn load_candidate(path: &Path) -> Result<CandidateTrace, PersistError> {
    let json = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| PersistError::Codec {
        path: path.display().to_string(),
        source,
    })
}

/// Serialize every candidate for one stage. Failures are logged per file and
/// do not interrupt the remaining writes.
pub fn serialize_candidates(
    data_dir: &Path,
    app_package: &str,
    stage: Stage,
    candidates: &[CandidateTrace],
) {
    for (index, candidate) in candidates.iter().enumerate() {
        let path = candidate_path(data_dir, app_package, stage, index);
        info!(path = %path.display(), "serializing candidate trace");
        if let Err(err) = write_candidate(&path, candidate) {
            error!(%err, "candidate serialization failed");
        }
    }
}
