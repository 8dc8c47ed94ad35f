//! Assessment facade: rank, filter, and order a batch of reports.

use std::cmp::Ordering;

use crate::domain::{Constraint, Preference};
use crate::filter;
use crate::report::{AnalysisReport, Assessment};
use crate::tree::RankTree;

/// Ranks batches of reports against the fixed quality decomposition.
#[derive(Debug, Default)]
pub struct AssessmentService {
    tree: RankTree,
}

impl AssessmentService {
    /// Create a service with the fixed topology built once.
    pub fn new() -> Self {
        Self {
            tree: RankTree::build(),
        }
    }

    /// Annotate every report with its rank and partition by constraints.
    ///
    /// With no constraints the filter is skipped entirely and every report is
    /// compliant. The compliant list is sorted by descending rank;
    /// non-compliant reports keep their input order.
    pub fn assess(
        &self,
        mut reports: Vec<AnalysisReport>,
        constraints: &[Constraint],
        preferences: &[Preference],
    ) -> Assessment {
        for report in &mut reports {
            report.rank = Some(self.tree.evaluate(&report.metrics, preferences));
        }

        let (mut compliant, non_compliant) = if constraints.is_empty() {
            (reports, Vec::new())
        } else {
            filter::partition(reports, constraints)
        };

        compliant.sort_by(|a, b| b.rank.partial_cmp(&a.rank).unwrap_or(Ordering::Equal));

        Assessment {
            compliant,
            non_compliant,
        }
    }
}
