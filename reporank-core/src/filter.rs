//! Constraint-based partitioning of assessed reports.

use crate::domain::Constraint;
use crate::report::AnalysisReport;

/// Split reports into (compliant, non-compliant) against the constraints.
///
/// A report is compliant only when every constraint holds for its normalized
/// score; an empty constraint list makes every report compliant. The
/// partition is exhaustive and keeps each list in input order. A constraint
/// on a metric the report does not carry cannot be verified and counts as
/// unsatisfied.
pub fn partition(
    reports: Vec<AnalysisReport>,
    constraints: &[Constraint],
) -> (Vec<AnalysisReport>, Vec<AnalysisReport>) {
    let mut compliant = Vec::new();
    let mut non_compliant = Vec::new();

    for report in reports {
        if satisfies_all(&report, constraints) {
            compliant.push(report);
        } else {
            non_compliant.push(report);
        }
    }

    (compliant, non_compliant)
}

fn satisfies_all(report: &AnalysisReport, constraints: &[Constraint]) -> bool {
    constraints.iter().all(|constraint| {
        report
            .metrics
            .get(&constraint.quality_metric)
            .is_some_and(|&value| constraint.is_satisfied_by(value))
    })
}
