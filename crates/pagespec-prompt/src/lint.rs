//! Advisory spec lint.
//!
//! Findings are data for display. Lint never mutates the spec and never
//! blocks compilation. Every invariant violation becomes an `error`; the
//! remaining rules flag incomplete metadata or layout as `warning`.

use std::fmt;

use serde::Serialize;

use pagespec_core::{
    GridRect, InvariantCode, LeafType, Node, NodeId, Spec, check_invariants, find_orphans,
};

use crate::recipes::is_known_recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    Error,
    Warning,
}

impl LintLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for LintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable lint rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LintCode {
    Invariant(InvariantCode),
    EmptyComponentRef,
    UnknownRecipe,
    TableWithoutColumns,
    FormWithoutFields,
    OrphanNode,
    GridOverlap,
}

impl LintCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invariant(code) => code.as_str(),
            Self::EmptyComponentRef => "empty_component_ref",
            Self::UnknownRecipe => "unknown_recipe",
            Self::TableWithoutColumns => "table_without_columns",
            Self::FormWithoutFields => "form_without_fields",
            Self::OrphanNode => "orphan_node",
            Self::GridOverlap => "grid_overlap",
        }
    }
}

impl fmt::Display for LintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LintCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LintIssue {
    pub level: LintLevel,
    pub code: LintCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
}

impl LintIssue {
    fn warning(code: LintCode, node_id: &NodeId, message: String) -> Self {
        Self {
            level: LintLevel::Warning,
            code,
            message,
            node_id: Some(node_id.clone()),
        }
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.level, self.code, self.message)
    }
}

/// Scan a spec. Errors come first, then warnings in node-id order.
#[must_use]
pub fn lint_spec(spec: &Spec) -> Vec<LintIssue> {
    let mut issues: Vec<LintIssue> = check_invariants(spec)
        .into_iter()
        .map(|violation| LintIssue {
            level: LintLevel::Error,
            code: LintCode::Invariant(violation.code),
            message: violation.message,
            node_id: violation.node_id,
        })
        .collect();

    for (id, node) in &spec.nodes {
        match node {
            Node::Leaf(leaf) => {
                let meta = &leaf.leaf_meta;
                if meta.component_ref.trim().is_empty() {
                    issues.push(LintIssue::warning(
                        LintCode::EmptyComponentRef,
                        id,
                        format!("{} leaf {id} has no componentRef", leaf.leaf_type),
                    ));
                }
                let has_field = |key: &str| meta.fields.get(key).is_some_and(|v| !v.is_empty());
                if leaf.leaf_type == LeafType::Table && !has_field("columns") {
                    issues.push(LintIssue::warning(
                        LintCode::TableWithoutColumns,
                        id,
                        format!("table {id} ({}) declares no columns", meta.component_ref),
                    ));
                }
                if leaf.leaf_type == LeafType::Form && !has_field("form") {
                    issues.push(LintIssue::warning(
                        LintCode::FormWithoutFields,
                        id,
                        format!("form {id} ({}) declares no form fields", meta.component_ref),
                    ));
                }
                for recipe in meta.recipes.iter().filter(|r| !is_known_recipe(r)) {
                    issues.push(LintIssue::warning(
                        LintCode::UnknownRecipe,
                        id,
                        format!("leaf {id} uses unknown recipe {recipe}"),
                    ));
                }
            }
            Node::Container(container) => {
                let items = container.grid_items();
                for (i, a) in items.iter().enumerate() {
                    for b in &items[i + 1..] {
                        if GridRect::from(a).overlaps(GridRect::from(b)) {
                            issues.push(LintIssue::warning(
                                LintCode::GridOverlap,
                                id,
                                format!(
                                    "grid {id}: items {} and {} overlap",
                                    a.item_id, b.item_id
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }

    for orphan in find_orphans(spec) {
        issues.push(LintIssue::warning(
            LintCode::OrphanNode,
            &orphan,
            format!("node {orphan} is not reachable from the root"),
        ));
    }

    tracing::debug!(
        spec_id = %spec.meta.id,
        errors = issues.iter().filter(|i| i.level == LintLevel::Error).count(),
        total = issues.len(),
        "spec linted"
    );
    issues
}

/// Whether any finding is an error.
#[must_use]
pub fn has_errors(issues: &[LintIssue]) -> bool {
    issues.iter().any(|issue| issue.level == LintLevel::Error)
}
