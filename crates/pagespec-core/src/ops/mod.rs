//! Structural operations over a [`Spec`].
//!
//! Every operation is an inherent method that mutates the spec in place.
//! Reference errors are raised before anything changes. After a successful
//! mutation the operation bumps `meta.updatedAt` and re-runs
//! [`check_invariants`]; a non-empty result becomes
//! [`SpecOpFailure::Invariants`] and the spec must be considered unusable.

mod create;
mod delete;
mod duplicate;
mod edit;
mod grid;
mod movement;
mod presets;
mod replace;
mod slot;

use std::fmt;

use crate::guards::descendant_closure;
use crate::id::{GridItemId, NodeId};
use crate::invariants::{InvariantViolation, check_invariants};
use crate::model::{ContainerNode, GridItem, Node, Spec};

pub use create::LeafMetaPatch;
pub use duplicate::COPY_SUFFIX;
pub use edit::split_csv;
pub use movement::MoveTarget;
pub use presets::LayoutPreset;

/// Structural operation identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecOpKind {
    CreateLeaf,
    CreateContainer,
    CreateGridContainer,
    AttachToSlot,
    SetSlotSingle,
    ClearSlot,
    UpgradeSlotToGrid,
    DowngradeGridToSingle,
    EnsureContainerGrid,
    AddGridItem,
    RemoveGridItem,
    UpdateGridGeom,
    ReplaceSingleChild,
    ReplaceGridItemChild,
    DeleteNodeCascade,
    CleanupOrphans,
    MoveNode,
    ApplyLayoutPreset,
    UpdateLeafMeta,
    UpdateProps,
    UpdateMeta,
}

impl SpecOpKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateLeaf => "create_leaf",
            Self::CreateContainer => "create_container",
            Self::CreateGridContainer => "create_grid_container",
            Self::AttachToSlot => "attach_to_slot",
            Self::SetSlotSingle => "set_slot_single",
            Self::ClearSlot => "clear_slot",
            Self::UpgradeSlotToGrid => "upgrade_slot_to_grid",
            Self::DowngradeGridToSingle => "downgrade_grid_to_single",
            Self::EnsureContainerGrid => "ensure_container_grid",
            Self::AddGridItem => "add_grid_item",
            Self::RemoveGridItem => "remove_grid_item",
            Self::UpdateGridGeom => "update_grid_geom",
            Self::ReplaceSingleChild => "replace_single_child",
            Self::ReplaceGridItemChild => "replace_grid_item_child",
            Self::DeleteNodeCascade => "delete_node_cascade",
            Self::CleanupOrphans => "cleanup_orphans",
            Self::MoveNode => "move_node",
            Self::ApplyLayoutPreset => "apply_layout_preset",
            Self::UpdateLeafMeta => "update_leaf_meta",
            Self::UpdateProps => "update_props",
            Self::UpdateMeta => "update_meta",
        }
    }
}

impl fmt::Display for SpecOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reasons for operation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecOpFailure {
    NodeNotFound { node_id: NodeId },
    NotContainer { node_id: NodeId },
    NotSlotHost { node_id: NodeId },
    NotGrid { node_id: NodeId },
    NotLeaf { node_id: NodeId },
    SlotNotSingle { host_id: NodeId, found: &'static str },
    GridItemNotFound { grid_id: NodeId, item_id: GridItemId },
    CannotMoveRoot { node_id: NodeId },
    CycleRejected { parent: NodeId, child: NodeId },
    Invariants(Vec<InvariantViolation>),
}

impl fmt::Display for SpecOpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => write!(f, "node {node_id} not found"),
            Self::NotContainer { node_id } => write!(f, "node {node_id} is not a container"),
            Self::NotSlotHost { node_id } => {
                write!(f, "node {node_id} has no slot host capability")
            }
            Self::NotGrid { node_id } => write!(f, "node {node_id} is not a grid container"),
            Self::NotLeaf { node_id } => write!(f, "node {node_id} is not a leaf"),
            Self::SlotNotSingle { host_id, found } => {
                write!(f, "slot of {host_id} is {found}, expected single")
            }
            Self::GridItemNotFound { grid_id, item_id } => {
                write!(f, "grid {grid_id} has no item {item_id}")
            }
            Self::CannotMoveRoot { node_id } => write!(f, "cannot move root node {node_id}"),
            Self::CycleRejected { parent, child } => write!(
                f,
                "operation would create cycle: {child} is an ancestor of {parent}"
            ),
            Self::Invariants(violations) => {
                write!(f, "invariant violation")?;
                for violation in violations {
                    write!(f, "\n  {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SpecOpFailure {}

/// Failure payload of a structural operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecOpError {
    pub op: SpecOpKind,
    pub reason: SpecOpFailure,
}

impl SpecOpError {
    #[must_use]
    pub fn new(op: SpecOpKind, reason: SpecOpFailure) -> Self {
        Self { op, reason }
    }

    /// Violations carried by an invariant failure.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        match &self.reason {
            SpecOpFailure::Invariants(violations) => violations,
            _ => &[],
        }
    }
}

impl fmt::Display for SpecOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.op, self.reason)
    }
}

impl std::error::Error for SpecOpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

pub(crate) type OpResult<T> = Result<T, SpecOpFailure>;

impl Spec {
    /// Run `body`, then touch and validate. The failure is tagged with `op`.
    pub(crate) fn run_op<T>(
        &mut self,
        op: SpecOpKind,
        body: impl FnOnce(&mut Self) -> OpResult<T>,
    ) -> Result<T, SpecOpError> {
        let value = body(self).map_err(|reason| SpecOpError::new(op, reason))?;
        self.commit(op)?;
        Ok(value)
    }

    /// Touch `updatedAt` and re-validate after a mutation.
    pub(crate) fn commit(&mut self, op: SpecOpKind) -> Result<(), SpecOpError> {
        self.touch();
        let violations = check_invariants(self);
        if violations.is_empty() {
            tracing::debug!(
                op = op.as_str(),
                spec_id = %self.meta.id,
                nodes = self.nodes.len(),
                "spec op applied"
            );
            return Ok(());
        }
        tracing::error!(
            op = op.as_str(),
            spec_id = %self.meta.id,
            violations = violations.len(),
            first = %violations[0],
            "spec op broke invariants"
        );
        Err(SpecOpError::new(op, SpecOpFailure::Invariants(violations)))
    }

    pub(crate) fn require_node(&self, id: &NodeId) -> OpResult<&Node> {
        self.nodes.get(id).ok_or_else(|| SpecOpFailure::NodeNotFound {
            node_id: id.clone(),
        })
    }

    pub(crate) fn require_container(&self, id: &NodeId) -> OpResult<&ContainerNode> {
        self.require_node(id)?
            .as_container()
            .ok_or_else(|| SpecOpFailure::NotContainer {
                node_id: id.clone(),
            })
    }

    pub(crate) fn require_slot_host(&self, id: &NodeId) -> OpResult<&ContainerNode> {
        let container = self.require_container(id)?;
        if container.is_slot_host() {
            Ok(container)
        } else {
            Err(SpecOpFailure::NotSlotHost {
                node_id: id.clone(),
            })
        }
    }

    pub(crate) fn require_grid(&self, id: &NodeId) -> OpResult<&ContainerNode> {
        let container = self.require_container(id)?;
        if container.is_grid() {
            Ok(container)
        } else {
            Err(SpecOpFailure::NotGrid {
                node_id: id.clone(),
            })
        }
    }

    pub(crate) fn container_mut(&mut self, id: &NodeId) -> OpResult<&mut ContainerNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| SpecOpFailure::NodeNotFound {
                node_id: id.clone(),
            })?
            .as_container_mut()
            .ok_or_else(|| SpecOpFailure::NotContainer {
                node_id: id.clone(),
            })
    }

    pub(crate) fn grid_items_mut(&mut self, grid_id: &NodeId) -> OpResult<&mut Vec<GridItem>> {
        let container = self.container_mut(grid_id)?;
        if !container.is_grid() {
            return Err(SpecOpFailure::NotGrid {
                node_id: grid_id.clone(),
            });
        }
        Ok(container.items.get_or_insert_with(Vec::new))
    }

    /// Reject an edge `parent -> child` when `parent` is inside `child`'s subtree.
    pub(crate) fn ensure_no_cycle(&self, parent: &NodeId, child: &NodeId) -> OpResult<()> {
        if descendant_closure(self, child).contains(parent) {
            return Err(SpecOpFailure::CycleRejected {
                parent: parent.clone(),
                child: child.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
