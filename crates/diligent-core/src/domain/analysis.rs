//! Analysis result tree and the per-run report.

use serde::{Deserialize, Serialize};

/// One node of the analysis tree: a single command execution and the
/// oracle's judgment of it.
///
/// `follow_ups` holds at most one child per node: the analysis of the
/// follow-up command the oracle proposed for this node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    pub flagged: bool,

    #[serde(
        default,
        alias = "analysis_description",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<AnalysisItem>,
}

impl AnalysisItem {
    /// A fresh, unjudged node for the given prompt and command.
    pub fn new(prompt: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    /// Number of follow-up levels below this node (0 for a leaf).
    pub fn depth(&self) -> usize {
        self.follow_ups
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .follow_ups
            .iter()
            .map(AnalysisItem::node_count)
            .sum::<usize>()
    }

    /// Pre-order walk over this subtree.
    pub fn walk(&self) -> Vec<&AnalysisItem> {
        let mut out = vec![self];
        for child in &self.follow_ups {
            out.extend(child.walk());
        }
        out
    }
}

/// Terminal state of a single analysis node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// The command was empty; nothing ran.
    NoCommand,
    /// The command timed out or failed; the oracle was not consulted.
    ExecFailed,
    /// The oracle call failed or its reply did not parse.
    OracleFailed,
    /// Judged not suspicious.
    Clear,
    /// Flagged, with no follow-up chased (none suggested or depth exhausted).
    FlaggedNoFollowup,
    /// Flagged and a follow-up child was produced.
    FlaggedWithFollowup,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::NoCommand => "no_command",
            NodeState::ExecFailed => "exec_failed",
            NodeState::OracleFailed => "oracle_failed",
            NodeState::Clear => "clear",
            NodeState::FlaggedNoFollowup => "flagged_no_followup",
            NodeState::FlaggedWithFollowup => "flagged_with_followup",
        }
    }
}

/// The result of one run: one root item per check, in catalog order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    pub items: Vec<AnalysisItem>,
}

impl Report {
    pub fn new(items: Vec<AnalysisItem>) -> Self {
        Self { items }
    }

    /// Flagged nodes across every tree, follow-ups included.
    pub fn flagged_count(&self) -> usize {
        self.items
            .iter()
            .flat_map(AnalysisItem::walk)
            .filter(|item| item.flagged)
            .count()
    }

    /// Total nodes across every tree.
    pub fn total_nodes(&self) -> usize {
        self.items.iter().map(AnalysisItem::node_count).sum()
    }

    /// Deepest follow-up chain in the report.
    pub fn max_depth(&self) -> usize {
        self.items.iter().map(AnalysisItem::depth).max().unwrap_or(0)
    }

    /// Every alert raised in the report, in pre-order.
    pub fn alerts(&self) -> Vec<&str> {
        self.items
            .iter()
            .flat_map(AnalysisItem::walk)
            .filter_map(|item| item.alert.as_deref())
            .collect()
    }

    /// Indented JSON, the persisted form of the report.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
