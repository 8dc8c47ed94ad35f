#![deny(missing_docs)]
//! RepoRank core library.
//!
//! This crate contains the scoring pipeline that turns raw static-analysis
//! output into ranked, constraint-filtered quality assessments: metric
//! normalization, constraint filtering, and the preference-weighted ranking
//! tree, plus the collaborator seams the orchestration layer builds on.

pub mod analyzer;
pub mod assessment;
pub mod domain;
pub mod error;
pub mod filter;
pub mod fs;
pub mod normalizer;
pub mod report;
pub mod tree;

pub use analyzer::{StaticAnalyzer, TokeiAnalyzer};
pub use assessment::AssessmentService;
pub use domain::{
    ComparisonOperator, Constraint, Flow, FlowLocation, Hotspot, HotspotProbability, Issue,
    IssueSeverity, LanguageDistribution, Preference, QualityAttribute, QualityMetric, TextRange,
};
pub use error::{RepoRankError, Result};
pub use filter::partition;
pub use fs::{FileSystem, StdFileSystem};
pub use normalizer::{normalize, normalize_report};
pub use report::{
    AnalysisReport, Assessment, format_language_stats, render_assessment_markdown, render_json,
};
pub use tree::{RankNode, RankTree};
