//! Report files: per-run widget-API summaries, the aggregate trace-analysis
//! report, and detailed per-candidate reports. Write failures are logged
//! with the failing path and never abort the pipeline.

use std::fmt::Write as _;
use std::path::Path;

use fesenda_explore::association::ExploredWidget;
use fesenda_explore::candidate::CandidateTrace;
use tracing::{error, info};

use crate::compare::ComparisonResult;
use crate::enforce::unseen_widgets;
use crate::summary::AnalysisSummary;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            error!(path = %path.display(), %err, "failed to create report directory");
            return;
        }
    }
    if let Err(err) = std::fs::write(path, content) {
        error!(path = %path.display(), %err, "failed to write report file");
    }
}

/// One line per found API: widget unique-string, API unique-string,
/// screenshot path, raw widget dump — tab separated.
pub fn write_widget_api_summary(
    report_dir: &Path,
    report_name: &str,
    explored_widgets: &[ExploredWidget],
) {
    info!(report_name, "writing widget-API summary");
    let mut out = String::new();
    for explored in explored_widgets {
        for found in &explored.found_apis {
            let screenshot = found
                .screenshot
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}",
                explored.widget.uid(),
                found.api.unique_string(),
                screenshot,
                explored.widget.dump(),
            );
        }
    }
    write_file(
        &report_dir.join(format!("{report_name}-widget-api-summary.txt")),
        &out,
    );
}

/// The aggregate report: summary counts plus per-category candidate lines.
pub fn write_analysis_report(
    report_dir: &Path,
    summary: &AnalysisSummary,
    candidates: &[CandidateTrace],
) {
    let blocked: Vec<&CandidateTrace> = candidates
        .iter()
        .filter(|c| c.blocked_ratio == 1.0 && c.unseen_ratio == 0.0)
        .collect();
    let partial: Vec<&CandidateTrace> = candidates
        .iter()
        .filter(|c| c.blocked_ratio == 1.0 && c.unseen_ratio > 0.0)
        .collect();
    let not_blocked: Vec<&CandidateTrace> = candidates
        .iter()
        .filter(|c| c.confirm_ratio == 1.0 && c.blocked_ratio < 1.0)
        .collect();
    let not_confirmed: Vec<&CandidateTrace> = candidates
        .iter()
        .filter(|c| c.confirm_ratio < 1.0)
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{summary}");
    for (title, group) in [
        ("Blocked Sub-traces:", &blocked),
        ("Partially Blocked Sub-traces:", &partial),
        ("Not Blocked Sub-traces:", &not_blocked),
        ("Not confirmed Sub-traces:", &not_confirmed),
    ] {
        let _ = writeln!(out, "{title}");
        for (idx, candidate) in group.iter().enumerate() {
            let _ = writeln!(out, "{idx}\t{candidate}");
        }
    }

    for line in out.lines() {
        info!("{line}");
    }
    write_file(&report_dir.join("api_trace_analysis_report.txt"), &out);
}

/// Detailed view of one candidate: ratios, the differential verdict for its
/// enforced run, its trace, and the missing / original / after-block widget
/// listings.
pub fn write_detailed_report(
    report_dir: &Path,
    candidate: &CandidateTrace,
    verdict: Option<&ComparisonResult>,
    trace_nr: usize,
) {
    let mut out = String::new();
    let _ = writeln!(out, "API\t\t{}", candidate.api.unique_string());
    let _ = writeln!(out, "Widget\t\t{}", candidate.widget.uid());
    let screenshot = candidate
        .screenshot
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let _ = writeln!(out, "Screenshot\t\t{screenshot}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Confirm ratio\t\t{}", candidate.confirm_ratio);
    let _ = writeln!(out, "Block ratio\t\t{}", candidate.blocked_ratio);
    let _ = writeln!(out, "Unseen ratio\t\t{}", candidate.unseen_ratio);
    if let Some(comparison) = verdict {
        let _ = writeln!(out, "Status\t\t{:?}", comparison.status);
        let _ = writeln!(
            out,
            "Reproducible ratio\t\t{}",
            comparison.reproducible_ratio
        );
    }

    let _ = writeln!(out, "\nPlayback trace");
    for step in candidate.trace.steps() {
        let _ = writeln!(out, "{:?}", step.action);
    }

    let mut missing = unseen_widgets(&candidate.seen_widgets, &candidate.seen_widgets_block);
    missing.sort_by_key(|w| w.uid().as_str().to_string());
    let _ = writeln!(out, "\nMissing widgets");
    for widget in missing {
        let _ = writeln!(out, "{}", widget.uid());
    }

    let mut original: Vec<_> = candidate.seen_widgets.iter().collect();
    original.sort_by_key(|w| w.uid().as_str().to_string());
    let _ = writeln!(out, "\nOriginal widgets");
    for widget in original {
        let _ = writeln!(out, "{}", widget.uid());
    }

    let mut after: Vec<_> = candidate.seen_widgets_block.iter().collect();
    after.sort_by_key(|w| w.uid().as_str().to_string());
    let _ = writeln!(out, "\nWidgets after block");
    for widget in after {
        let _ = writeln!(out, "{}", widget.uid());
    }

    write_file(
        &report_dir.join(format!("detailed_trace_{trace_nr}.txt")),
        &out,
    );
}
