//! Domain entities for RepoRank.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{RepoRankError, Result};

/// A mapping of language names to their percentage of total lines.
pub type LanguageDistribution = BTreeMap<String, f64>;

/// Closed set of quality metric keys carried by an analysis report.
///
/// `LinesOfCode` is a raw measurement consumed by the normalizer; every other
/// key names a `[0,1]` utility once normalization has run.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityMetric {
    /// Ratio of comment lines to total lines.
    CommentRate,
    /// Average method length.
    MethodSize,
    /// Duplicated-lines ratio.
    Duplication,
    /// Technical-debt ratio.
    TechnicalDebtRatio,
    /// Severity-weighted composite over BUG issues.
    BugSeverity,
    /// Estimated effort to fix reliability findings.
    ReliabilityRemediationEffort,
    /// Cyclomatic complexity.
    CyclomaticComplexity,
    /// Cognitive complexity.
    CognitiveComplexity,
    /// Severity-weighted composite over VULNERABILITY issues.
    VulnerabilitySeverity,
    /// Probability-weighted composite over security hotspots.
    HotspotPriority,
    /// Estimated effort to fix security findings.
    SecurityRemediationEffort,
    /// Total lines of code.
    LinesOfCode,
}

/// A named node of the ranking tree; preferences may target any of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityAttribute {
    /// Aggregate of all non-security attributes.
    Quality,
    /// Aggregate of the security metrics.
    Security,
    /// How easy the code is to read.
    Comprehension,
    /// How small the building blocks are.
    Simplicity,
    /// How cheap the code is to change.
    Maintainability,
    /// How unlikely the code is to misbehave.
    Reliability,
    /// How convoluted the control flow is.
    Complexity,
    /// Leaf backed by [`QualityMetric::CommentRate`].
    CommentRate,
    /// Leaf backed by [`QualityMetric::MethodSize`].
    MethodSize,
    /// Leaf backed by [`QualityMetric::Duplication`].
    Duplication,
    /// Leaf backed by [`QualityMetric::TechnicalDebtRatio`].
    TechnicalDebtRatio,
    /// Leaf backed by [`QualityMetric::BugSeverity`].
    BugSeverity,
    /// Leaf backed by [`QualityMetric::ReliabilityRemediationEffort`].
    ReliabilityRemediationEffort,
    /// Leaf backed by [`QualityMetric::CyclomaticComplexity`].
    CyclomaticComplexity,
    /// Leaf backed by [`QualityMetric::CognitiveComplexity`].
    CognitiveComplexity,
    /// Leaf backed by [`QualityMetric::VulnerabilitySeverity`].
    VulnerabilitySeverity,
    /// Leaf backed by [`QualityMetric::HotspotPriority`].
    HotspotPriority,
    /// Leaf backed by [`QualityMetric::SecurityRemediationEffort`].
    SecurityRemediationEffort,
}

impl QualityAttribute {
    /// The metric a leaf attribute reads, or `None` for internal attributes.
    pub fn metric(&self) -> Option<QualityMetric> {
        match self {
            Self::CommentRate => Some(QualityMetric::CommentRate),
            Self::MethodSize => Some(QualityMetric::MethodSize),
            Self::Duplication => Some(QualityMetric::Duplication),
            Self::TechnicalDebtRatio => Some(QualityMetric::TechnicalDebtRatio),
            Self::BugSeverity => Some(QualityMetric::BugSeverity),
            Self::ReliabilityRemediationEffort => {
                Some(QualityMetric::ReliabilityRemediationEffort)
            }
            Self::CyclomaticComplexity => Some(QualityMetric::CyclomaticComplexity),
            Self::CognitiveComplexity => Some(QualityMetric::CognitiveComplexity),
            Self::VulnerabilitySeverity => Some(QualityMetric::VulnerabilitySeverity),
            Self::HotspotPriority => Some(QualityMetric::HotspotPriority),
            Self::SecurityRemediationEffort => Some(QualityMetric::SecurityRemediationEffort),
            Self::Quality
            | Self::Security
            | Self::Comprehension
            | Self::Simplicity
            | Self::Maintainability
            | Self::Reliability
            | Self::Complexity => None,
        }
    }
}

/// Issue severity tiers, ordered from least to most severe.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    /// Informational finding.
    Info,
    /// Minor defect.
    Minor,
    /// Major defect.
    Major,
    /// Critical defect.
    Critical,
    /// Defect that must be fixed before release.
    Blocker,
}

/// Likelihood tiers for security hotspots, ordered from least to most likely.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotspotProbability {
    /// Unlikely to be exploitable.
    Low,
    /// Possibly exploitable.
    Medium,
    /// Likely exploitable.
    High,
}

/// Character range of a finding within a source file; passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    /// First line of the range.
    pub start_line: u32,
    /// Last line of the range.
    pub end_line: u32,
    /// Offset within the first line.
    pub start_offset: u32,
    /// Offset within the last line.
    pub end_offset: u32,
}

/// A secondary location attached to an issue; passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowLocation {
    /// Range of the location, when the scanner reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_range: Option<TextRange>,
    /// Scanner message for the location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// An execution flow attached to an issue; passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flow {
    /// Ordered locations of the flow.
    pub locations: Vec<FlowLocation>,
}

/// One static-analysis issue (bug, vulnerability, or code smell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Rule that produced the issue.
    pub rule: String,
    /// Severity tier.
    pub severity: IssueSeverity,
    /// Component (file) the issue was raised against.
    pub component: String,
    /// Line number, when the scanner reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Scanner message.
    pub message: String,
    /// Issue type tag, e.g. "BUG" or "VULNERABILITY".
    #[serde(rename = "type")]
    pub kind: String,
    /// Range of the issue, when the scanner reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_range: Option<TextRange>,
    /// Execution flows, when the scanner reports them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<Flow>,
}

/// One security hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Component (file) the hotspot was raised against.
    pub component: String,
    /// Security category reported by the scanner.
    pub security_category: String,
    /// Likelihood tier.
    pub vulnerability_probability: HotspotProbability,
    /// Line number, when the scanner reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Scanner message.
    pub message: String,
    /// Rule that produced the hotspot.
    pub rule_key: String,
}

/// Comparison operators usable in constraints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ComparisonOperator {
    /// Strictly less than the threshold.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal to the threshold.
    #[serde(rename = "<=")]
    Lte,
    /// Strictly greater than the threshold.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal to the threshold.
    #[serde(rename = ">=")]
    Gte,
    /// Equal to the threshold.
    #[serde(rename = "==")]
    Eq,
    /// Not equal to the threshold.
    #[serde(rename = "!=")]
    Neq,
}

impl ComparisonOperator {
    /// Resolve an operator from its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Neq),
            _ => None,
        }
    }

    /// The operator's symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Eq => "==",
            Self::Neq => "!=",
        }
    }

    /// Apply the operator to a metric value and a threshold.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => value < threshold,
            Self::Lte => value <= threshold,
            Self::Gt => value > threshold,
            Self::Gte => value >= threshold,
            Self::Eq => value == threshold,
            Self::Neq => value != threshold,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A threshold a report's normalized metric must satisfy.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Metric the constraint applies to.
    pub quality_metric: QualityMetric,
    /// Comparison operator.
    pub operator: ComparisonOperator,
    /// Threshold, a utility value in `[0,1]`.
    pub threshold: f64,
}

impl Constraint {
    /// Whether a normalized metric value satisfies the constraint.
    pub fn is_satisfied_by(&self, value: f64) -> bool {
        self.operator.compare(value, self.threshold)
    }

    /// Reject thresholds outside the utility range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(RepoRankError::Validation(format!(
                "constraint threshold must be within [0,1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} {}",
            self.quality_metric, self.operator, self.threshold
        )
    }
}

/// An explicit weight for one ranking-tree node.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    /// Attribute the weight applies to.
    pub quality_attribute: QualityAttribute,
    /// Weight share in `[0,1]` of the attribute's sibling level.
    pub weight: f64,
}

impl Preference {
    /// Reject weights outside the share range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(RepoRankError::Validation(format!(
                "preference weight must be within [0,1], got {}",
                self.weight
            )));
        }
        Ok(())
    }
}
