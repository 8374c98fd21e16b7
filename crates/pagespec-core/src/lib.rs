#![forbid(unsafe_code)]

//! Page spec model for the low-code page editor.
//!
//! A [`Spec`] is an arena of container and leaf nodes keyed by [`NodeId`].
//! Containers reference their content by id: slot hosts through a
//! [`SlotContent`], grids through placed [`GridItem`]s. Structural
//! operations are inherent methods on [`Spec`] (see [`ops`]) that validate
//! references up front and re-check [`check_invariants`] after every edit.

pub mod guards;
pub mod id;
pub mod invariants;
pub mod model;
pub mod ops;
pub mod placement;

pub use guards::{
    ChildEdge, ParentRef, children_of, descendant_closure, find_host_by_grid_id,
    find_parent_ref, find_path, is_container, is_grid, is_leaf, is_slot_host,
    reachable_from_root, slot_hosts, sorted_grid_items,
};
pub use id::{GridItemId, NodeId, SpecId};
pub use invariants::{InvariantCode, InvariantViolation, check_invariants, find_orphans};
pub use model::{
    CompactType, ContainerNode, ContainerType, DEFAULT_GRID_COLUMNS, DEFAULT_GRID_MARGIN,
    DEFAULT_GRID_ROW_HEIGHT, DEFAULT_ITEM_HEIGHT, DEFAULT_ITEM_WIDTH, GridConfig, GridItem,
    LeafMeta, LeafNode, LeafType, Node, Props, SPEC_VERSION, SlotContent, Spec, SpecMeta,
    now_millis,
};
pub use ops::{
    COPY_SUFFIX, LayoutPreset, LeafMetaPatch, MoveTarget, SpecOpError, SpecOpFailure,
    SpecOpKind, split_csv,
};
pub use placement::{GeomPatch, GridRect, Placement, find_free_position, resolve_placement};
