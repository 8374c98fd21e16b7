use std::collections::BTreeSet;

use super::{SpecOpError, SpecOpFailure, SpecOpKind};
use crate::guards::descendant_closure;
use crate::id::NodeId;
use crate::model::{DEFAULT_ITEM_HEIGHT, DEFAULT_ITEM_WIDTH, GridConfig, SlotContent, Spec};
use crate::placement::Placement;

/// Destination of a [`Spec::move_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    /// Drop into a slot host: an empty slot takes the node as its single
    /// child, a single slot is upgraded to a grid, a grid slot gets a new
    /// auto-placed item.
    Slot { host_id: NodeId },
    /// Place into a grid container.
    Grid { grid_id: NodeId, placement: Placement },
}

impl MoveTarget {
    #[must_use]
    pub fn target_id(&self) -> &NodeId {
        match self {
            Self::Slot { host_id } => host_id,
            Self::Grid { grid_id, .. } => grid_id,
        }
    }
}

impl Spec {
    /// Detach a non-root node from every parent reference and attach it at
    /// `target`. Moving a node into its own subtree is rejected.
    pub fn move_node(
        &mut self,
        node_id: &NodeId,
        target: MoveTarget,
    ) -> Result<(), SpecOpError> {
        self.run_op(SpecOpKind::MoveNode, |spec| {
            let _ = spec.require_node(node_id)?;
            if node_id == &spec.root_id {
                return Err(SpecOpFailure::CannotMoveRoot {
                    node_id: node_id.clone(),
                });
            }
            match &target {
                MoveTarget::Slot { host_id } => {
                    let _ = spec.require_slot_host(host_id)?;
                }
                MoveTarget::Grid { grid_id, .. } => {
                    let _ = spec.require_grid(grid_id)?;
                }
            }
            let subtree = descendant_closure(spec, node_id);
            let mut parents = vec![target.target_id().clone()];
            if let MoveTarget::Slot { host_id } = &target
                && let SlotContent::Grid { grid_id } = spec.slot_of(host_id)?
            {
                parents.push(grid_id);
            }
            if let Some(parent) = parents.into_iter().find(|id| subtree.contains(id)) {
                return Err(SpecOpFailure::CycleRejected {
                    parent,
                    child: node_id.clone(),
                });
            }

            let _ = spec.scrub_references(&BTreeSet::from([node_id.clone()]));
            match target {
                MoveTarget::Slot { host_id } => match spec.slot_of(&host_id)? {
                    SlotContent::Empty => spec.attach_slot_inner(
                        &host_id,
                        SlotContent::Single {
                            child_id: node_id.clone(),
                        },
                    )?,
                    SlotContent::Single { child_id } => {
                        let grid_id = spec.insert_grid(GridConfig::default());
                        let _ = spec.add_item_inner(
                            &grid_id,
                            &child_id,
                            &Placement::at(0, 0, DEFAULT_ITEM_WIDTH, DEFAULT_ITEM_HEIGHT),
                        )?;
                        let _ = spec.add_item_inner(&grid_id, node_id, &Placement::default())?;
                        spec.attach_slot_inner(&host_id, SlotContent::Grid { grid_id })?;
                    }
                    SlotContent::Grid { grid_id } => {
                        let _ = spec.add_item_inner(&grid_id, node_id, &Placement::default())?;
                    }
                },
                MoveTarget::Grid { grid_id, placement } => {
                    let _ = spec.add_item_inner(&grid_id, node_id, &placement)?;
                }
            }
            tracing::debug!(node_id = %node_id, "node moved");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::{ParentRef, find_parent_ref};
    use crate::model::{ContainerType, LeafType, Node, Props};

    #[test]
    fn move_between_slot_hosts() {
        let mut spec = Spec::new_empty("move");
        let root = spec.root_id.clone();
        let grid = spec.ensure_container_grid(&root).expect("grid");
        let card = spec
            .create_container(ContainerType::Card, Props::new())
            .expect("card");
        let leaf = spec.create_leaf(LeafType::Table, None).expect("leaf");
        let _ = spec
            .add_grid_item(&grid, &card, Placement::default())
            .expect("card item");
        let _ = spec
            .add_grid_item(&grid, &leaf, Placement::default())
            .expect("leaf item");

        spec.move_node(&leaf, MoveTarget::Slot { host_id: card.clone() })
            .expect("move");
        assert_eq!(
            find_parent_ref(&spec, &leaf),
            Some(ParentRef::Slot { host_id: card })
        );
        let grid_items = spec
            .node(&grid)
            .and_then(Node::as_container)
            .expect("grid")
            .grid_items()
            .len();
        assert_eq!(grid_items, 1);
    }

    #[test]
    fn moving_into_occupied_slot_upgrades_it() {
        let mut spec = Spec::new_empty("move");
        let root = spec.root_id.clone();
        let section = spec
            .create_container(ContainerType::Section, Props::new())
            .expect("section");
        let first = spec.create_leaf(LeafType::Kpi, None).expect("leaf");
        let second = spec.create_leaf(LeafType::Chart, None).expect("leaf");
        spec.set_slot_single(&root, &section).expect("attach section");
        spec.set_slot_single(&section, &first).expect("attach first");
        spec.move_node(&second, MoveTarget::Slot { host_id: section.clone() })
            .expect("move");
        let slot = spec
            .node(&section)
            .and_then(Node::as_container)
            .and_then(|c| c.slot.clone())
            .expect("slot");
        assert!(matches!(slot, SlotContent::Grid { .. }));
    }

    #[test]
    fn root_and_self_subtree_moves_are_rejected() {
        let mut spec = Spec::new_empty("move");
        let root = spec.root_id.clone();
        let card = spec
            .create_container(ContainerType::Card, Props::new())
            .expect("card");
        let inner = spec
            .create_container(ContainerType::Section, Props::new())
            .expect("section");
        spec.set_slot_single(&root, &card).expect("attach");
        spec.set_slot_single(&card, &inner).expect("attach");

        let err = spec
            .move_node(&root, MoveTarget::Slot { host_id: card.clone() })
            .expect_err("root");
        assert!(matches!(err.reason, SpecOpFailure::CannotMoveRoot { .. }));
        let before = spec.clone();
        let err = spec
            .move_node(&card, MoveTarget::Slot { host_id: inner })
            .expect_err("into own subtree");
        assert!(matches!(err.reason, SpecOpFailure::CycleRejected { .. }));
        assert_eq!(spec, before);
    }
}
