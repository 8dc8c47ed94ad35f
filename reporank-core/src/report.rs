//! Analysis report entities and rendering helpers.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Hotspot, Issue, LanguageDistribution, QualityMetric};
use crate::error::RepoRankError;

/// One repository's analysis result.
///
/// `metrics` holds raw measurements as produced by the analyzer until
/// [`crate::normalizer::normalize_report`] replaces them with `[0,1]`
/// utilities; downstream stages only ever see the normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Repository locator the report was produced from.
    pub project_url: String,
    /// Language name to percentage of total lines.
    pub languages: LanguageDistribution,
    /// Raw issues reported by the analyzer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
    /// Raw security hotspots reported by the analyzer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hotspots: Vec<Hotspot>,
    /// Metric values keyed by metric identifier.
    #[schema(value_type = Object)]
    pub metrics: BTreeMap<QualityMetric, f64>,
    /// Overall rank in `[0,1]`, absent until assessment has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f64>,
}

impl AnalysisReport {
    /// Create a report carrying raw analyzer output, not yet ranked.
    pub fn new(
        project_url: impl Into<String>,
        languages: LanguageDistribution,
        issues: Vec<Issue>,
        hotspots: Vec<Hotspot>,
        metrics: BTreeMap<QualityMetric, f64>,
    ) -> Self {
        Self {
            project_url: project_url.into(),
            languages,
            issues,
            hotspots,
            metrics,
            rank: None,
        }
    }
}

/// Result of assessing a batch: ranked reports partitioned by constraints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Reports satisfying every constraint, sorted by descending rank.
    pub compliant: Vec<AnalysisReport>,
    /// Reports violating at least one constraint, in input order.
    pub non_compliant: Vec<AnalysisReport>,
}

/// Render any serializable payload as pretty-printed JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, RepoRankError> {
    serde_json::to_string_pretty(payload)
        .map_err(|err| RepoRankError::Internal(format!("failed to encode report: {err}")))
}

/// Render an assessment as Markdown.
pub fn render_assessment_markdown(assessment: &Assessment) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# RepoRank Assessment\n");

    let _ = writeln!(output, "## Compliant\n");
    if assessment.compliant.is_empty() {
        let _ = writeln!(output, "No compliant repositories.\n");
    } else {
        let _ = writeln!(output, "| Rank | Repository |");
        let _ = writeln!(output, "|------|------------|");
        for report in &assessment.compliant {
            let _ = writeln!(
                output,
                "| {} | {} |",
                format_rank(report.rank),
                report.project_url
            );
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Non-compliant\n");
    if assessment.non_compliant.is_empty() {
        let _ = writeln!(output, "No non-compliant repositories.\n");
    } else {
        for report in &assessment.non_compliant {
            let _ = writeln!(
                output,
                "- {} (rank {})",
                report.project_url,
                format_rank(report.rank)
            );
        }
        let _ = writeln!(output);
    }

    for report in assessment
        .compliant
        .iter()
        .chain(&assessment.non_compliant)
    {
        append_report_details(&mut output, report);
    }

    output
}

/// Format language stats sorted by descending percentage.
pub fn format_language_stats(stats: &LanguageDistribution) -> Vec<(String, f64)> {
    let mut items: Vec<(String, f64)> = stats.iter().map(|(k, v)| (k.clone(), *v)).collect();
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    items
}

fn format_rank(rank: Option<f64>) -> String {
    match rank {
        Some(rank) => format!("{rank:.4}"),
        None => "unranked".to_string(),
    }
}

fn append_report_details(output: &mut String, report: &AnalysisReport) {
    let _ = writeln!(output, "## {}\n", report.project_url);

    if report.languages.is_empty() {
        let _ = writeln!(output, "### Languages\nNo languages detected.\n");
    } else {
        let _ = writeln!(output, "### Languages");
        for (language, percent) in format_language_stats(&report.languages) {
            let _ = writeln!(output, "- {language}: {percent:.2}%");
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "### Scores");
    for (metric, value) in &report.metrics {
        let _ = writeln!(output, "- {metric:?}: {value:.4}");
    }
    let _ = writeln!(output);
}
