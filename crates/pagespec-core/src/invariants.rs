//! Structural consistency checker.
//!
//! [`check_invariants`] is a developer-facing assertion: every structural
//! operation runs it after mutating and turns a non-empty result into a hard
//! error. User-facing advice lives in the lint pass.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::guards::{children_of, reachable_from_root};
use crate::id::NodeId;
use crate::model::{ContainerType, Node, SlotContent, Spec};

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    MissingRoot,
    RootNotPage,
    IdMismatch,
    MissingSlot,
    UnexpectedSlot,
    UnexpectedItems,
    DanglingSlotChild,
    DanglingGridSlot,
    GridSlotNotGrid,
    DanglingGridItemChild,
    DuplicateGridItemId,
    DegenerateGridItem,
    CycleDetected,
}

impl InvariantCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRoot => "missing_root",
            Self::RootNotPage => "root_not_page",
            Self::IdMismatch => "id_mismatch",
            Self::MissingSlot => "missing_slot",
            Self::UnexpectedSlot => "unexpected_slot",
            Self::UnexpectedItems => "unexpected_items",
            Self::DanglingSlotChild => "dangling_slot_child",
            Self::DanglingGridSlot => "dangling_grid_slot",
            Self::GridSlotNotGrid => "grid_slot_not_grid",
            Self::DanglingGridItemChild => "dangling_grid_item_child",
            Self::DuplicateGridItemId => "duplicate_grid_item_id",
            Self::DegenerateGridItem => "degenerate_grid_item",
            Self::CycleDetected => "cycle_detected",
        }
    }
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantViolation {
    pub code: InvariantCode,
    pub node_id: Option<NodeId>,
    pub related_node: Option<NodeId>,
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn push_violation(
    out: &mut Vec<InvariantViolation>,
    code: InvariantCode,
    node_id: Option<&NodeId>,
    related_node: Option<&NodeId>,
    message: impl Into<String>,
) {
    out.push(InvariantViolation {
        code,
        node_id: node_id.cloned(),
        related_node: related_node.cloned(),
        message: message.into(),
    });
}

/// Validate a spec snapshot. An empty result means the spec is consistent.
#[must_use]
pub fn check_invariants(spec: &Spec) -> Vec<InvariantViolation> {
    let mut out = Vec::new();

    match spec.root() {
        None => push_violation(
            &mut out,
            InvariantCode::MissingRoot,
            Some(&spec.root_id),
            None,
            format!("root node {} is missing", spec.root_id),
        ),
        Some(Node::Container(root)) if root.container_type == ContainerType::Page => {}
        Some(other) => push_violation(
            &mut out,
            InvariantCode::RootNotPage,
            Some(&spec.root_id),
            None,
            format!(
                "root node {} is {}:{}, expected container:page",
                spec.root_id,
                other.kind_str(),
                other.type_str()
            ),
        ),
    }

    for (key, node) in &spec.nodes {
        if key != node.id() {
            push_violation(
                &mut out,
                InvariantCode::IdMismatch,
                Some(key),
                Some(node.id()),
                format!("node stored under {key} carries id {}", node.id()),
            );
        }
        let Node::Container(container) = node else {
            continue;
        };
        let id = &container.id;

        if container.is_slot_host() {
            if container.items.is_some() {
                push_violation(
                    &mut out,
                    InvariantCode::UnexpectedItems,
                    Some(id),
                    None,
                    format!(
                        "{} container {id} carries grid items",
                        container.container_type
                    ),
                );
            }
            match &container.slot {
                None => push_violation(
                    &mut out,
                    InvariantCode::MissingSlot,
                    Some(id),
                    None,
                    format!(
                        "slot host {id} ({}) has no slot",
                        container.container_type
                    ),
                ),
                Some(SlotContent::Empty) => {}
                Some(SlotContent::Single { child_id }) => {
                    if !spec.contains(child_id) {
                        push_violation(
                            &mut out,
                            InvariantCode::DanglingSlotChild,
                            Some(id),
                            Some(child_id),
                            format!("slot of {id} references missing child {child_id}"),
                        );
                    }
                }
                Some(SlotContent::Grid { grid_id }) => match spec.node(grid_id) {
                    None => push_violation(
                        &mut out,
                        InvariantCode::DanglingGridSlot,
                        Some(id),
                        Some(grid_id),
                        format!("slot of {id} references missing grid {grid_id}"),
                    ),
                    Some(target) if !crate::guards::is_grid(target) => push_violation(
                        &mut out,
                        InvariantCode::GridSlotNotGrid,
                        Some(id),
                        Some(grid_id),
                        format!(
                            "slot of {id} delegates to {grid_id}, which is {}:{}",
                            target.kind_str(),
                            target.type_str()
                        ),
                    ),
                    Some(_) => {}
                },
            }
            continue;
        }

        if container.slot.is_some() {
            push_violation(
                &mut out,
                InvariantCode::UnexpectedSlot,
                Some(id),
                None,
                format!("grid container {id} carries a slot"),
            );
        }
        let mut seen_items = BTreeSet::new();
        for item in container.grid_items() {
            if !seen_items.insert(&item.item_id) {
                push_violation(
                    &mut out,
                    InvariantCode::DuplicateGridItemId,
                    Some(id),
                    None,
                    format!("grid {id} repeats item id {}", item.item_id),
                );
            }
            if !spec.contains(&item.child_id) {
                push_violation(
                    &mut out,
                    InvariantCode::DanglingGridItemChild,
                    Some(id),
                    Some(&item.child_id),
                    format!(
                        "grid item {} of {id} references missing child {}",
                        item.item_id, item.child_id
                    ),
                );
            }
            if item.w == 0 || item.h == 0 {
                push_violation(
                    &mut out,
                    InvariantCode::DegenerateGridItem,
                    Some(id),
                    Some(&item.child_id),
                    format!(
                        "grid item {} of {id} has degenerate size {}x{}",
                        item.item_id, item.w, item.h
                    ),
                );
            }
        }
    }

    if spec.contains(&spec.root_id) {
        for (node_id, parent) in collect_cycles(spec) {
            push_violation(
                &mut out,
                InvariantCode::CycleDetected,
                Some(&node_id),
                Some(&parent),
                format!("cycle detected: {parent} references ancestor {node_id}"),
            );
        }
    }

    out
}

enum CycleStep<'a> {
    Enter {
        parent: Option<&'a NodeId>,
        node_id: &'a NodeId,
    },
    Exit(&'a NodeId),
}

/// Back edges found by a depth-first walk from the root, keyed by the
/// ancestor they point at. Iterative, so deep nesting cannot exhaust the
/// call stack.
fn collect_cycles(spec: &Spec) -> BTreeMap<NodeId, NodeId> {
    let mut visiting: BTreeSet<&NodeId> = BTreeSet::new();
    let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
    let mut cycles = BTreeMap::new();
    let mut stack = vec![CycleStep::Enter {
        parent: None,
        node_id: &spec.root_id,
    }];
    while let Some(step) = stack.pop() {
        match step {
            CycleStep::Exit(node_id) => {
                let _ = visiting.remove(node_id);
            }
            CycleStep::Enter { parent, node_id } => {
                if let Some(parent) = parent
                    && visiting.contains(node_id)
                {
                    let _ = cycles
                        .entry(node_id.clone())
                        .or_insert_with(|| parent.clone());
                    continue;
                }
                if !spec.contains(node_id) || !visited.insert(node_id) {
                    continue;
                }
                let _ = visiting.insert(node_id);
                stack.push(CycleStep::Exit(node_id));
                stack.extend(children_of(spec, node_id).into_iter().rev().map(|edge| {
                    CycleStep::Enter {
                        parent: Some(node_id),
                        node_id: edge.child_id,
                    }
                }));
            }
        }
    }
    cycles
}

/// Nodes present in the map but not reachable from the root.
#[must_use]
pub fn find_orphans(spec: &Spec) -> Vec<NodeId> {
    let reachable = reachable_from_root(spec);
    spec.nodes
        .keys()
        .filter(|id| !reachable.contains(*id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::GridItemId;
    use crate::model::{ContainerNode, GridItem, LeafType, Props};

    fn codes(spec: &Spec) -> Vec<InvariantCode> {
        check_invariants(spec).into_iter().map(|v| v.code).collect()
    }

    #[test]
    fn fresh_and_demo_specs_are_valid() {
        assert!(check_invariants(&Spec::new_empty("a")).is_empty());
        assert!(check_invariants(&Spec::demo("b")).is_empty());
    }

    #[test]
    fn missing_root_is_reported() {
        let mut spec = Spec::new_empty("a");
        spec.root_id = NodeId::new("n_gone");
        assert_eq!(codes(&spec), vec![InvariantCode::MissingRoot]);
    }

    #[test]
    fn root_must_be_page() {
        let mut spec = Spec::new_empty("a");
        let leaf = spec.create_leaf(LeafType::Table, None).expect("leaf");
        spec.root_id = leaf;
        assert!(codes(&spec).contains(&InvariantCode::RootNotPage));
    }

    #[test]
    fn slot_hosts_need_a_slot() {
        let mut spec = Spec::new_empty("a");
        let root = spec.root_id.clone();
        spec.node_mut(&root)
            .and_then(Node::as_container_mut)
            .expect("root container")
            .slot = None;
        assert_eq!(codes(&spec), vec![InvariantCode::MissingSlot]);
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut spec = Spec::new_empty("a");
        let root = spec.root_id.clone();
        spec.node_mut(&root)
            .and_then(Node::as_container_mut)
            .expect("root container")
            .slot = Some(SlotContent::Single {
            child_id: NodeId::new("n_missing"),
        });
        let found = check_invariants(&spec);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, InvariantCode::DanglingSlotChild);
        assert_eq!(found[0].related_node, Some(NodeId::new("n_missing")));
        assert!(found[0].to_string().contains("n_missing"));
    }

    #[test]
    fn grid_slot_must_target_a_grid() {
        let mut spec = Spec::new_empty("a");
        let root = spec.root_id.clone();
        let leaf = spec.create_leaf(LeafType::Chart, None).expect("leaf");
        spec.node_mut(&root)
            .and_then(Node::as_container_mut)
            .expect("root container")
            .slot = Some(SlotContent::Grid { grid_id: leaf });
        assert_eq!(codes(&spec), vec![InvariantCode::GridSlotNotGrid]);
    }

    #[test]
    fn duplicate_and_degenerate_items_are_reported() {
        let mut spec = Spec::new_empty("a");
        let root = spec.root_id.clone();
        let grid = spec.ensure_container_grid(&root).expect("grid");
        let leaf = spec.create_leaf(LeafType::Kpi, None).expect("leaf");
        let items = spec
            .node_mut(&grid)
            .and_then(Node::as_container_mut)
            .and_then(|c| c.items.as_mut())
            .expect("grid items");
        let item_id = GridItemId::new("gi_same");
        items.push(GridItem::new(item_id.clone(), leaf.clone(), 0, 0, 2, 2));
        items.push(GridItem::new(item_id, leaf, 2, 0, 0, 2));
        let found = codes(&spec);
        assert!(found.contains(&InvariantCode::DuplicateGridItemId));
        assert!(found.contains(&InvariantCode::DegenerateGridItem));
    }

    #[test]
    fn cycles_are_detected_but_sharing_is_not() {
        let mut spec = Spec::new_empty("a");
        let root = spec.root_id.clone();
        let card = NodeId::new("n_card");
        let section = NodeId::new("n_section");
        let mut card_node = ContainerNode::new(card.clone(), ContainerType::Card, Props::new());
        card_node.slot = Some(SlotContent::Single {
            child_id: section.clone(),
        });
        let mut section_node =
            ContainerNode::new(section.clone(), ContainerType::Section, Props::new());
        section_node.slot = Some(SlotContent::Single {
            child_id: card.clone(),
        });
        spec.nodes.insert(card.clone(), Node::Container(card_node));
        spec.nodes
            .insert(section.clone(), Node::Container(section_node));
        // Unreachable cycles are not reported by the reachability walk.
        assert!(check_invariants(&spec).is_empty());

        spec.node_mut(&root)
            .and_then(Node::as_container_mut)
            .expect("root container")
            .slot = Some(SlotContent::Single {
            child_id: card.clone(),
        });
        let found = check_invariants(&spec);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, InvariantCode::CycleDetected);
        assert_eq!(found[0].node_id, Some(card));
    }

    #[test]
    fn shared_child_in_closed_branch_is_fine() {
        let mut spec = Spec::new_empty("a");
        let root = spec.root_id.clone();
        let grid = spec.ensure_container_grid(&root).expect("grid");
        let leaf = spec.create_leaf(LeafType::List, None).expect("leaf");
        let items = spec
            .node_mut(&grid)
            .and_then(Node::as_container_mut)
            .and_then(|c| c.items.as_mut())
            .expect("grid items");
        items.push(GridItem::new(GridItemId::new("gi_a"), leaf.clone(), 0, 0, 2, 2));
        items.push(GridItem::new(GridItemId::new("gi_b"), leaf, 2, 0, 2, 2));
        assert!(check_invariants(&spec).is_empty());
    }

    #[test]
    fn orphan_scan_lists_unreachable_nodes() {
        let mut spec = Spec::new_empty("a");
        let loose = spec.create_leaf(LeafType::Tree, None).expect("leaf");
        assert_eq!(find_orphans(&spec), vec![loose]);
    }

    /// `depth` sections nested through single slots below the root.
    fn section_chain(depth: usize) -> (Spec, Vec<NodeId>) {
        let mut spec = Spec::new_empty("deep");
        let mut chain = vec![spec.root_id.clone()];
        for _ in 0..depth {
            let id = NodeId::fresh();
            let section = ContainerNode::new(id.clone(), ContainerType::Section, Props::new());
            let _ = spec.nodes.insert(id.clone(), Node::Container(section));
            let host = chain.last().expect("host");
            spec.node_mut(host)
                .and_then(Node::as_container_mut)
                .expect("host container")
                .slot = Some(SlotContent::Single {
                child_id: id.clone(),
            });
            chain.push(id);
        }
        (spec, chain)
    }

    #[test]
    fn very_deep_nesting_is_checked_without_recursion() {
        let (mut spec, chain) = section_chain(100_000);
        assert!(check_invariants(&spec).is_empty());

        let bottom = chain.last().expect("bottom").clone();
        spec.node_mut(&bottom)
            .and_then(Node::as_container_mut)
            .expect("bottom container")
            .slot = Some(SlotContent::Single {
            child_id: chain[1].clone(),
        });
        let found = check_invariants(&spec);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, InvariantCode::CycleDetected);
        assert_eq!(found[0].node_id, Some(chain[1].clone()));
        assert_eq!(found[0].related_node, Some(bottom));
    }
}
