//! Fixed quality decomposition and preference-weighted ranking.
//!
//! The topology is built once and never mutated; evaluation walks it with
//! nothing but borrowed state, so any number of reports can be ranked
//! concurrently against the same tree.

use std::collections::BTreeMap;

use crate::domain::{Preference, QualityAttribute, QualityMetric};

/// A node of the quality decomposition.
#[derive(Debug, Clone)]
pub struct RankNode {
    attribute: QualityAttribute,
    children: Vec<RankNode>,
}

impl RankNode {
    fn internal(attribute: QualityAttribute, children: Vec<RankNode>) -> Self {
        Self {
            attribute,
            children,
        }
    }

    fn leaf(attribute: QualityAttribute) -> Self {
        debug_assert!(attribute.metric().is_some(), "leaf needs a backing metric");
        Self {
            attribute,
            children: Vec::new(),
        }
    }

    /// The attribute this node represents.
    pub fn attribute(&self) -> QualityAttribute {
        self.attribute
    }

    /// Child nodes; empty for leaves.
    pub fn children(&self) -> &[RankNode] {
        &self.children
    }
}

/// The fixed decomposition of overall rank into quality attributes.
#[derive(Debug, Clone)]
pub struct RankTree {
    children: Vec<RankNode>,
}

impl RankTree {
    /// Build the fixed topology.
    pub fn build() -> Self {
        let comprehension = RankNode::internal(
            QualityAttribute::Comprehension,
            vec![RankNode::leaf(QualityAttribute::CommentRate)],
        );
        let simplicity = RankNode::internal(
            QualityAttribute::Simplicity,
            vec![RankNode::leaf(QualityAttribute::MethodSize)],
        );
        let maintainability = RankNode::internal(
            QualityAttribute::Maintainability,
            vec![
                RankNode::leaf(QualityAttribute::Duplication),
                RankNode::leaf(QualityAttribute::TechnicalDebtRatio),
            ],
        );
        let reliability = RankNode::internal(
            QualityAttribute::Reliability,
            vec![
                RankNode::leaf(QualityAttribute::BugSeverity),
                RankNode::leaf(QualityAttribute::ReliabilityRemediationEffort),
            ],
        );
        let complexity = RankNode::internal(
            QualityAttribute::Complexity,
            vec![
                RankNode::leaf(QualityAttribute::CyclomaticComplexity),
                RankNode::leaf(QualityAttribute::CognitiveComplexity),
            ],
        );
        let quality = RankNode::internal(
            QualityAttribute::Quality,
            vec![
                comprehension,
                simplicity,
                maintainability,
                reliability,
                complexity,
            ],
        );
        let security = RankNode::internal(
            QualityAttribute::Security,
            vec![
                RankNode::leaf(QualityAttribute::VulnerabilitySeverity),
                RankNode::leaf(QualityAttribute::HotspotPriority),
                RankNode::leaf(QualityAttribute::SecurityRemediationEffort),
            ],
        );

        Self {
            children: vec![quality, security],
        }
    }

    /// Top-level nodes (QUALITY and SECURITY).
    pub fn children(&self) -> &[RankNode] {
        &self.children
    }

    /// Rank a report's normalized metrics; the result is in `[0,1]`.
    ///
    /// Preferences pin the weight share of the nodes they name; the siblings
    /// of a pinned node split the remainder of their level evenly. A leaf
    /// whose metric is absent contributes 0 for that leaf only.
    pub fn evaluate(
        &self,
        metrics: &BTreeMap<QualityMetric, f64>,
        preferences: &[Preference],
    ) -> f64 {
        weighted_value(&self.children, metrics, preferences)
    }
}

impl Default for RankTree {
    fn default() -> Self {
        Self::build()
    }
}

fn weighted_value(
    children: &[RankNode],
    metrics: &BTreeMap<QualityMetric, f64>,
    preferences: &[Preference],
) -> f64 {
    children
        .iter()
        .zip(level_shares(children, preferences))
        .map(|(child, share)| share * node_value(child, metrics, preferences))
        .sum()
}

fn node_value(
    node: &RankNode,
    metrics: &BTreeMap<QualityMetric, f64>,
    preferences: &[Preference],
) -> f64 {
    if node.children.is_empty() {
        node.attribute
            .metric()
            .and_then(|metric| metrics.get(&metric))
            .copied()
            .unwrap_or_default()
    } else {
        weighted_value(&node.children, metrics, preferences)
    }
}

/// Weight shares for one sibling level; without preferences every sibling
/// receives an equal share and the shares sum to 1.
pub(crate) fn level_shares(children: &[RankNode], preferences: &[Preference]) -> Vec<f64> {
    let pinned: Vec<Option<f64>> = children
        .iter()
        .map(|child| {
            preferences
                .iter()
                .find(|preference| preference.quality_attribute == child.attribute)
                .map(|preference| preference.weight)
        })
        .collect();

    let assigned: f64 = pinned.iter().flatten().sum();
    let unpinned = pinned.iter().filter(|share| share.is_none()).count();
    // Overcommitted levels leave nothing for the remaining siblings.
    let default_share = if unpinned == 0 {
        0.0
    } else {
        ((1.0 - assigned) / unpinned as f64).max(0.0)
    };

    pinned
        .into_iter()
        .map(|share| share.unwrap_or(default_share))
        .collect()
}
