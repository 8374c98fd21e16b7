use std::collections::BTreeSet;

use super::{OpResult, SpecOpError, SpecOpFailure, SpecOpKind};
use crate::id::{GridItemId, NodeId};
use crate::model::{
    DEFAULT_ITEM_HEIGHT, DEFAULT_ITEM_WIDTH, GridConfig, GridItem, SlotContent, Spec,
};
use crate::placement::{Placement, clamp_width};

impl Spec {
    /// Validate and set a slot host's content. Displaced content is left in place.
    pub(crate) fn attach_slot_inner(
        &mut self,
        host_id: &NodeId,
        content: SlotContent,
    ) -> OpResult<()> {
        let _ = self.require_slot_host(host_id)?;
        match &content {
            SlotContent::Empty => {}
            SlotContent::Single { child_id } => {
                let _ = self.require_node(child_id)?;
                self.ensure_no_cycle(host_id, child_id)?;
            }
            SlotContent::Grid { grid_id } => {
                let _ = self.require_grid(grid_id)?;
                self.ensure_no_cycle(host_id, grid_id)?;
            }
        }
        self.container_mut(host_id)?.slot = Some(content);
        Ok(())
    }

    pub(crate) fn slot_of(&self, host_id: &NodeId) -> OpResult<SlotContent> {
        Ok(self
            .require_slot_host(host_id)?
            .slot
            .clone()
            .unwrap_or(SlotContent::Empty))
    }

    /// Set a slot host's content directly.
    pub fn attach_to_slot(
        &mut self,
        host_id: &NodeId,
        content: SlotContent,
    ) -> Result<(), SpecOpError> {
        self.run_op(SpecOpKind::AttachToSlot, |spec| {
            spec.attach_slot_inner(host_id, content)
        })
    }

    pub fn set_slot_single(
        &mut self,
        host_id: &NodeId,
        child_id: &NodeId,
    ) -> Result<(), SpecOpError> {
        self.run_op(SpecOpKind::SetSlotSingle, |spec| {
            spec.attach_slot_inner(
                host_id,
                SlotContent::Single {
                    child_id: child_id.clone(),
                },
            )
        })
    }

    pub fn clear_slot(&mut self, host_id: &NodeId) -> Result<(), SpecOpError> {
        self.run_op(SpecOpKind::ClearSlot, |spec| {
            spec.attach_slot_inner(host_id, SlotContent::Empty)
        })
    }

    /// Turn a `single` slot into a grid holding the original child and `new_child_id`.
    ///
    /// The original child lands at `(0, 0)` with the default item size; the new
    /// child is auto-placed unless `placement` pins it. Returns the grid id.
    pub fn upgrade_slot_to_grid(
        &mut self,
        host_id: &NodeId,
        new_child_id: &NodeId,
        placement: Option<Placement>,
    ) -> Result<NodeId, SpecOpError> {
        self.upgrade_slot_to_grid_with(host_id, new_child_id, placement, GridConfig::default())
    }

    /// [`Spec::upgrade_slot_to_grid`] with an explicit grid configuration.
    ///
    /// Both items are placed against `config.col_num`.
    pub fn upgrade_slot_to_grid_with(
        &mut self,
        host_id: &NodeId,
        new_child_id: &NodeId,
        placement: Option<Placement>,
        config: GridConfig,
    ) -> Result<NodeId, SpecOpError> {
        self.run_op(SpecOpKind::UpgradeSlotToGrid, |spec| {
            let original = match spec.slot_of(host_id)? {
                SlotContent::Single { child_id } => child_id,
                other => {
                    return Err(SpecOpFailure::SlotNotSingle {
                        host_id: host_id.clone(),
                        found: other.kind_str(),
                    });
                }
            };
            let _ = spec.require_node(new_child_id)?;
            spec.ensure_no_cycle(host_id, new_child_id)?;

            let grid_id = spec.insert_grid(config);
            spec.add_item_inner(
                &grid_id,
                &original,
                &Placement::at(0, 0, DEFAULT_ITEM_WIDTH, DEFAULT_ITEM_HEIGHT),
            )?;
            spec.add_item_inner(&grid_id, new_child_id, &placement.unwrap_or_default())?;
            spec.attach_slot_inner(
                host_id,
                SlotContent::Grid {
                    grid_id: grid_id.clone(),
                },
            )?;
            tracing::debug!(host_id = %host_id, grid_id = %grid_id, "slot upgraded to grid");
            Ok(grid_id)
        })
    }

    /// Collapse a grid slot holding exactly one item back into `single`.
    ///
    /// The grid node is removed. Returns `false` without touching the spec when
    /// the slot is not a grid or the grid does not hold exactly one item.
    pub fn downgrade_grid_to_single(&mut self, host_id: &NodeId) -> Result<bool, SpecOpError> {
        let op = SpecOpKind::DowngradeGridToSingle;
        let slot = self
            .slot_of(host_id)
            .map_err(|reason| SpecOpError::new(op, reason))?;
        let SlotContent::Grid { grid_id } = slot else {
            return Ok(false);
        };
        let survivor = match self.require_grid(&grid_id).map(|grid| grid.grid_items()) {
            Ok([only]) => only.child_id.clone(),
            _ => return Ok(false),
        };
        self.run_op(op, |spec| {
            let _ = spec.scrub_references(&BTreeSet::from([grid_id.clone()]));
            spec.attach_slot_inner(
                host_id,
                SlotContent::Single {
                    child_id: survivor,
                },
            )?;
            let _ = spec.nodes.remove(&grid_id);
            tracing::debug!(host_id = %host_id, grid_id = %grid_id, "grid downgraded to single");
            Ok(true)
        })
    }

    pub(crate) fn ensure_grid_inner(
        &mut self,
        host_id: &NodeId,
        config: GridConfig,
    ) -> OpResult<NodeId> {
        match self.slot_of(host_id)? {
            SlotContent::Grid { grid_id } => Ok(grid_id),
            SlotContent::Single { child_id } => {
                let grid_id = self.insert_grid(config);
                self.grid_items_mut(&grid_id)?.push(GridItem::new(
                    GridItemId::fresh(),
                    child_id,
                    0,
                    0,
                    clamp_width(config.col_num, config.col_num),
                    DEFAULT_ITEM_HEIGHT,
                ));
                self.attach_slot_inner(
                    host_id,
                    SlotContent::Grid {
                        grid_id: grid_id.clone(),
                    },
                )?;
                Ok(grid_id)
            }
            SlotContent::Empty => {
                let grid_id = self.insert_grid(config);
                self.attach_slot_inner(
                    host_id,
                    SlotContent::Grid {
                        grid_id: grid_id.clone(),
                    },
                )?;
                Ok(grid_id)
            }
        }
    }

    /// Make sure a slot host delegates to a grid and return the grid id.
    ///
    /// An existing single child is wrapped as a full-width item at the top.
    pub fn ensure_container_grid(&mut self, host_id: &NodeId) -> Result<NodeId, SpecOpError> {
        self.ensure_container_grid_with(host_id, GridConfig::default())
    }

    /// [`Spec::ensure_container_grid`] creating any new grid with `config`.
    ///
    /// An existing grid is returned as is.
    pub fn ensure_container_grid_with(
        &mut self,
        host_id: &NodeId,
        config: GridConfig,
    ) -> Result<NodeId, SpecOpError> {
        let op = SpecOpKind::EnsureContainerGrid;
        if let SlotContent::Grid { grid_id } = self
            .slot_of(host_id)
            .map_err(|reason| SpecOpError::new(op, reason))?
        {
            return Ok(grid_id);
        }
        self.run_op(op, |spec| spec.ensure_grid_inner(host_id, config))
    }
}
