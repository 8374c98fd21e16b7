//! Grid auto-placement.
//!
//! First-fit scan: rows top-to-bottom, then columns left-to-right, for the
//! first rectangle that does not overlap any occupied one. Rectangles are
//! half-open, so touching edges do not collide.
//!
//! The scan covers rows `0..=max_bottom`, where `max_bottom` is the lowest
//! occupied bottom edge. A rectangle starting at `max_bottom` cannot overlap
//! anything, so the scan always terminates with a position and the
//! "place below everything" fallback is simply its last row.

use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_ITEM_HEIGHT, DEFAULT_ITEM_WIDTH, GridItem};

/// Axis-aligned grid rectangle in column/row units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    #[must_use]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub const fn right(self) -> u32 {
        self.x.saturating_add(self.w)
    }

    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Half-open overlap test.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }
}

impl From<&GridItem> for GridRect {
    fn from(item: &GridItem) -> Self {
        Self::new(item.x, item.y, item.w, item.h)
    }
}

/// Clamp a requested width into `1..=cols`.
#[must_use]
pub fn clamp_width(w: u32, cols: u32) -> u32 {
    w.clamp(1, cols.max(1))
}

/// First free `(x, y)` for a `w` x `h` rectangle in a `cols`-wide grid.
#[must_use]
pub fn find_free_position(occupied: &[GridRect], cols: u32, w: u32, h: u32) -> (u32, u32) {
    let cols = cols.max(1);
    let w = clamp_width(w, cols);
    let h = h.max(1);
    let max_bottom = occupied.iter().map(|rect| rect.bottom()).max().unwrap_or(0);

    for y in 0..=max_bottom {
        for x in 0..=(cols - w) {
            let candidate = GridRect::new(x, y, w, h);
            if occupied.iter().all(|rect| !rect.overlaps(candidate)) {
                return (x, y);
            }
        }
    }
    (0, max_bottom)
}

/// Requested placement for a new grid item.
///
/// Missing coordinates trigger auto-placement; missing sizes fall back to the
/// default item size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub min_w: Option<u32>,
    pub min_h: Option<u32>,
    pub max_w: Option<u32>,
    pub max_h: Option<u32>,
    pub is_static: bool,
}

impl Placement {
    /// Auto-placed item of the given size.
    #[must_use]
    pub fn sized(w: u32, h: u32) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }

    /// Item at an explicit position and size.
    #[must_use]
    pub fn at(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            w: Some(w),
            h: Some(h),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_auto(&self) -> bool {
        self.x.is_none() || self.y.is_none()
    }
}

/// Partial geometry update for an existing grid item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeomPatch {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
}

impl GeomPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolve a placement against the existing items of a `cols`-wide grid.
///
/// Widths are clamped to the column count, sizes are at least 1, and an
/// explicit `x` is pulled left so the item stays inside the grid.
#[must_use]
pub fn resolve_placement(existing: &[GridItem], cols: u32, placement: &Placement) -> GridRect {
    let cols = cols.max(1);
    let w = clamp_width(placement.w.unwrap_or(DEFAULT_ITEM_WIDTH), cols);
    let h = placement.h.unwrap_or(DEFAULT_ITEM_HEIGHT).max(1);
    match (placement.x, placement.y) {
        (Some(x), Some(y)) => GridRect::new(x.min(cols - w), y, w, h),
        _ => {
            let occupied: Vec<GridRect> = existing.iter().map(GridRect::from).collect();
            let (x, y) = find_free_position(&occupied, cols, w, h);
            GridRect::new(x, y, w, h)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn touching_rectangles_do_not_overlap() {
        let a = GridRect::new(0, 0, 6, 6);
        assert!(!a.overlaps(GridRect::new(6, 0, 6, 6)));
        assert!(!a.overlaps(GridRect::new(0, 6, 6, 6)));
        assert!(a.overlaps(GridRect::new(5, 5, 2, 2)));
        assert!(a.overlaps(a));
    }

    #[test]
    fn empty_grid_places_at_origin() {
        assert_eq!(find_free_position(&[], 12, 6, 6), (0, 0));
    }

    #[test]
    fn fills_row_before_moving_down() {
        let occupied = [GridRect::new(0, 0, 6, 6)];
        assert_eq!(find_free_position(&occupied, 12, 6, 6), (6, 0));
        let full_row = [GridRect::new(0, 0, 6, 6), GridRect::new(6, 0, 6, 6)];
        assert_eq!(find_free_position(&full_row, 12, 6, 6), (0, 6));
    }

    #[test]
    fn finds_gap_between_items() {
        let occupied = [GridRect::new(0, 0, 4, 2), GridRect::new(8, 0, 4, 2)];
        assert_eq!(find_free_position(&occupied, 12, 4, 2), (4, 0));
    }

    #[test]
    fn wide_request_is_clamped_to_columns() {
        assert_eq!(find_free_position(&[], 4, 10, 1), (0, 0));
        let rect = resolve_placement(&[], 4, &Placement::sized(10, 0));
        assert_eq!((rect.w, rect.h), (4, 1));
    }

    #[test]
    fn explicit_position_is_kept_inside_grid() {
        let rect = resolve_placement(&[], 12, &Placement::at(10, 3, 6, 2));
        assert_eq!(rect, GridRect::new(6, 3, 6, 2));
    }

    #[test]
    fn defaults_apply_without_size() {
        let rect = resolve_placement(&[], 12, &Placement::default());
        assert_eq!(rect, GridRect::new(0, 0, DEFAULT_ITEM_WIDTH, DEFAULT_ITEM_HEIGHT));
    }

    proptest! {
        #[test]
        fn auto_placement_never_overlaps(
            cols in 1u32..16,
            sizes in prop::collection::vec((1u32..20, 1u32..8), 1..24),
        ) {
            let mut occupied: Vec<GridRect> = Vec::new();
            for (w, h) in sizes {
                let w = clamp_width(w, cols);
                let (x, y) = find_free_position(&occupied, cols, w, h);
                let candidate = GridRect::new(x, y, w, h);
                prop_assert!(candidate.right() <= cols);
                for rect in &occupied {
                    prop_assert!(!rect.overlaps(candidate));
                }
                occupied.push(candidate);
            }
        }
    }
}
