use super::{OpResult, SpecOpError, SpecOpKind};
use crate::id::{GridItemId, NodeId};
use crate::model::{GridItem, Spec, allocate_item_id};
use crate::placement::{GeomPatch, Placement, clamp_width, resolve_placement};

impl Spec {
    pub(crate) fn add_item_inner(
        &mut self,
        grid_id: &NodeId,
        child_id: &NodeId,
        placement: &Placement,
    ) -> OpResult<GridItemId> {
        let cols = self.require_grid(grid_id)?.grid_config().col_num;
        let _ = self.require_node(child_id)?;
        self.ensure_no_cycle(grid_id, child_id)?;

        let items = self.grid_items_mut(grid_id)?;
        let rect = resolve_placement(items, cols, placement);
        let item_id = allocate_item_id(items);
        items.push(GridItem {
            min_w: placement.min_w,
            min_h: placement.min_h,
            max_w: placement.max_w,
            max_h: placement.max_h,
            is_static: placement.is_static,
            ..GridItem::new(
                item_id.clone(),
                child_id.clone(),
                rect.x,
                rect.y,
                rect.w,
                rect.h,
            )
        });
        tracing::debug!(
            grid_id = %grid_id,
            child_id = %child_id,
            x = rect.x,
            y = rect.y,
            w = rect.w,
            h = rect.h,
            "grid item placed"
        );
        Ok(item_id)
    }

    /// Place `child_id` in a grid. Missing coordinates auto-place the item.
    pub fn add_grid_item(
        &mut self,
        grid_id: &NodeId,
        child_id: &NodeId,
        placement: Placement,
    ) -> Result<GridItemId, SpecOpError> {
        self.run_op(SpecOpKind::AddGridItem, |spec| {
            spec.add_item_inner(grid_id, child_id, &placement)
        })
    }

    /// Drop an item from a grid. The child node stays in the map.
    ///
    /// Returns `false` when the grid has no such item.
    pub fn remove_grid_item(
        &mut self,
        grid_id: &NodeId,
        item_id: &GridItemId,
    ) -> Result<bool, SpecOpError> {
        let op = SpecOpKind::RemoveGridItem;
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
            spec.grid_items_mut(grid_id)?
                .retain(|item| &item.item_id != item_id);
            tracing::debug!(grid_id = %grid_id, item_id = %item_id, "grid item removed");
            Ok(true)
        })
    }

    /// Patch an item's geometry.
    ///
    /// Widths are clamped to the column count and the item's own bounds,
    /// sizes stay at least 1, and `x` is pulled left to keep the item inside
    /// the grid. Returns `false` when the item is missing or nothing changed.
    pub fn update_grid_geom(
        &mut self,
        grid_id: &NodeId,
        item_id: &GridItemId,
        patch: GeomPatch,
    ) -> Result<bool, SpecOpError> {
        let op = SpecOpKind::UpdateGridGeom;
        let grid = self
            .require_grid(grid_id)
            .map_err(|reason| SpecOpError::new(op, reason))?;
        let cols = grid.grid_config().col_num;
        let Some(current) = grid
            .grid_items()
            .iter()
            .find(|item| &item.item_id == item_id)
        else {
            return Ok(false);
        };

        let mut next = current.clone();
        let mut w = patch.w.unwrap_or(next.w);
        if let Some(min_w) = next.min_w {
            w = w.max(min_w);
        }
        if let Some(max_w) = next.max_w {
            w = w.min(max_w);
        }
        next.w = clamp_width(w, cols);
        let mut h = patch.h.unwrap_or(next.h);
        if let Some(min_h) = next.min_h {
            h = h.max(min_h);
        }
        if let Some(max_h) = next.max_h {
            h = h.min(max_h);
        }
        next.h = h.max(1);
        next.x = patch.x.unwrap_or(next.x).min(cols.max(1) - next.w);
        next.y = patch.y.unwrap_or(next.y);
        if &next == current {
            return Ok(false);
        }

        self.run_op(op, |spec| {
            if let Some(slot) = spec
                .grid_items_mut(grid_id)?
                .iter_mut()
                .find(|item| &item.item_id == item_id)
            {
                *slot = next;
            }
            Ok(true)
        })
    }
}
