use super::{SpecOpError, SpecOpFailure, SpecOpKind};
use crate::id::{GridItemId, NodeId};
use crate::model::{SlotContent, Spec};

impl Spec {
    /// Point a `single` slot at another node.
    ///
    /// The displaced child stays in the map; callers delete it if wanted.
    /// Returns the displaced child id.
    pub fn replace_single_child(
        &mut self,
        host_id: &NodeId,
        new_child_id: &NodeId,
    ) -> Result<NodeId, SpecOpError> {
        self.run_op(SpecOpKind::ReplaceSingleChild, |spec| {
            let previous = match spec.slot_of(host_id)? {
                SlotContent::Single { child_id } => child_id,
                other => {
                    return Err(SpecOpFailure::SlotNotSingle {
                        host_id: host_id.clone(),
                        found: other.kind_str(),
                    });
                }
            };
            spec.attach_slot_inner(
                host_id,
                SlotContent::Single {
                    child_id: new_child_id.clone(),
                },
            )?;
            Ok(previous)
        })
    }

    /// Point a grid item at another node, keeping its geometry.
    ///
    /// Returns `false` when the grid has no such item.
    pub fn replace_grid_item_child(
        &mut self,
        grid_id: &NodeId,
        item_id: &GridItemId,
        new_child_id: &NodeId,
    ) -> Result<bool, SpecOpError> {
        let op = SpecOpKind::ReplaceGridItemChild;
        let present = self
            .require_grid(grid_id)
            .map_err(|reason| SpecOpError::new(op, reason))?
            .grid_items()
            .iter()
            .any(|item| &item.item_id == item_id);
        if !present {
            return Ok(false);
        }
        self.run_op(op, |spec| {
            let _ = spec.require_node(new_child_id)?;
            spec.ensure_no_cycle(grid_id, new_child_id)?;
            if let Some(item) = spec
                .grid_items_mut(grid_id)?
                .iter_mut()
                .find(|item| &item.item_id == item_id)
            {
                item.child_id = new_child_id.clone();
            }
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeafType, Node};
    use crate::placement::Placement;

    #[test]
    fn single_child_swap_keeps_old_node() {
        let mut spec = Spec::new_empty("replace");
        let root = spec.root_id.clone();
        let old = spec.create_leaf(LeafType::Table, None).expect("leaf");
        let new = spec.create_leaf(LeafType::Chart, None).expect("leaf");
        spec.set_slot_single(&root, &old).expect("attach");
        let displaced = spec.replace_single_child(&root, &new).expect("replace");
        assert_eq!(displaced, old);
        assert!(spec.contains(&old));
        let slot = spec
            .node(&root)
            .and_then(Node::as_container)
            .and_then(|c| c.slot.clone());
        assert_eq!(slot, Some(SlotContent::Single { child_id: new }));
    }

    #[test]
    fn single_child_swap_requires_single_slot() {
        let mut spec = Spec::new_empty("replace");
        let root = spec.root_id.clone();
        let new = spec.create_leaf(LeafType::Chart, None).expect("leaf");
        let err = spec
            .replace_single_child(&root, &new)
            .expect_err("empty slot");
        assert!(matches!(err.reason, SpecOpFailure::SlotNotSingle { .. }));
    }

    #[test]
    fn grid_item_swap_keeps_geometry() {
        let mut spec = Spec::new_empty("replace");
        let root = spec.root_id.clone();
        let grid = spec.ensure_container_grid(&root).expect("grid");
        let old = spec.create_leaf(LeafType::Kpi, None).expect("leaf");
        let new = spec.create_leaf(LeafType::List, None).expect("leaf");
        let item_id = spec
            .add_grid_item(&grid, &old, Placement::at(3, 2, 4, 5))
            .expect("add");
        assert!(spec
            .replace_grid_item_child(&grid, &item_id, &new)
            .expect("replace"));
        let item = spec
            .node(&grid)
            .and_then(Node::as_container)
            .expect("grid")
            .grid_items()[0]
            .clone();
        assert_eq!(item.child_id, new);
        assert_eq!((item.x, item.y, item.w, item.h), (3, 2, 4, 5));
        assert!(!spec
            .replace_grid_item_child(&grid, &GridItemId::new("gi_none"), &old)
            .expect("missing item"));
    }
}
