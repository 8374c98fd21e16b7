//! Layout presets and the sample page.

use super::{LeafMetaPatch, SpecOpError, SpecOpKind};
use crate::guards::descendant_closure;
use crate::id::{GridItemId, NodeId};
use crate::model::{
    ContainerType, GridConfig, GridItem, LeafType, Node, Props, SlotContent, Spec,
};
use crate::placement::{GridRect, Placement};

/// Built-in cell arrangements for a 12-column grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutPreset {
    /// One full-width cell.
    Single,
    /// Two equal columns.
    TwoColumns,
    /// Three equal columns.
    ThreeColumns,
    /// Narrow left column beside a wide main area.
    Sidebar,
    /// Full-width header above two columns.
    HeaderTwoColumns,
}

impl LayoutPreset {
    pub const ALL: [Self; 5] = [
        Self::Single,
        Self::TwoColumns,
        Self::ThreeColumns,
        Self::Sidebar,
        Self::HeaderTwoColumns,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::TwoColumns => "two_columns",
            Self::ThreeColumns => "three_columns",
            Self::Sidebar => "sidebar",
            Self::HeaderTwoColumns => "header_two_columns",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.as_str() == raw)
    }

    /// Cell rectangles of the preset.
    #[must_use]
    pub fn cells(self) -> Vec<GridRect> {
        match self {
            Self::Single => vec![GridRect::new(0, 0, 12, 8)],
            Self::TwoColumns => vec![GridRect::new(0, 0, 6, 8), GridRect::new(6, 0, 6, 8)],
            Self::ThreeColumns => vec![
                GridRect::new(0, 0, 4, 8),
                GridRect::new(4, 0, 4, 8),
                GridRect::new(8, 0, 4, 8),
            ],
            Self::Sidebar => vec![GridRect::new(0, 0, 3, 12), GridRect::new(3, 0, 9, 12)],
            Self::HeaderTwoColumns => vec![
                GridRect::new(0, 0, 12, 3),
                GridRect::new(0, 3, 6, 8),
                GridRect::new(6, 3, 6, 8),
            ],
        }
    }
}

impl Spec {
    /// Replace a slot host's content with a grid of `section` cells.
    ///
    /// Each cell hosts its own empty grid so content can be dropped straight
    /// in. The previous content is deleted together with its descendants.
    /// Returns the new outer grid id.
    pub fn apply_layout_preset(
        &mut self,
        host_id: &NodeId,
        cells: &[GridRect],
    ) -> Result<NodeId, SpecOpError> {
        self.run_op(SpecOpKind::ApplyLayoutPreset, |spec| {
            let previous = spec.slot_of(host_id)?;
            spec.attach_slot_inner(host_id, SlotContent::Empty)?;
            if let Some(old) = previous.target() {
                let released = descendant_closure(spec, old);
                let _ = spec.scrub_references(&released);
                spec.nodes.retain(|id, _| !released.contains(id));
            }

            let grid_id = spec.insert_grid(GridConfig::default());
            for cell in cells {
                let section = spec.insert_container(ContainerType::Section, Props::new());
                let inner = spec.insert_grid(GridConfig::default());
                spec.attach_slot_inner(&section, SlotContent::Grid { grid_id: inner })?;
                let _ = spec.add_item_inner(
                    &grid_id,
                    &section,
                    &Placement::at(cell.x, cell.y, cell.w, cell.h),
                )?;
            }
            spec.attach_slot_inner(
                host_id,
                SlotContent::Grid {
                    grid_id: grid_id.clone(),
                },
            )?;
            tracing::debug!(host_id = %host_id, cells = cells.len(), "layout preset applied");
            Ok(grid_id)
        })
    }

    /// Sample page: a search form above an order table with a KPI card and
    /// an edit dialog beside it.
    #[must_use]
    pub fn demo(name: impl Into<String>) -> Self {
        let mut spec = Self::new_empty(name);
        let root_id = spec.root_id.clone();

        let search = spec.insert_leaf(
            LeafType::Form,
            Some(
                LeafMetaPatch::component("SearchForm")
                    .with_description("Order search conditions")
                    .with_field("form", ["keyword", "status", "createdAt"])
                    .with_recipes(["search.submit.reload"]),
            ),
        );
        let table = spec.insert_leaf(
            LeafType::Table,
            Some(
                LeafMetaPatch::component("DataTable")
                    .with_description("Order list")
                    .with_field("columns", ["orderNo", "customer", "amount", "status"])
                    .with_recipes(["table.row.open-dialog"]),
            ),
        );
        let kpi = spec.insert_leaf(
            LeafType::Kpi,
            Some(
                LeafMetaPatch::component("KpiCard")
                    .with_field("items", ["todayOrders", "todayAmount"])
                    .with_recipes(["kpi.click.filter"]),
            ),
        );
        let edit_form = spec.insert_leaf(
            LeafType::Form,
            Some(
                LeafMetaPatch::component("FormPanel")
                    .with_field("form", ["customer", "amount", "status"])
                    .with_recipes(["form.submit.refresh"]),
            ),
        );
        let dialog = spec.insert_container(ContainerType::Dialog, Props::new());
        let grid = spec.insert_grid(GridConfig::default());

        if let Some(container) = spec.node_mut(&dialog).and_then(Node::as_container_mut) {
            container.slot = Some(SlotContent::Single {
                child_id: edit_form,
            });
            let _ = container
                .props
                .insert("title".into(), serde_json::Value::from("Edit order"));
        }
        let layout = [
            (search, GridRect::new(0, 0, 12, 3)),
            (table, GridRect::new(0, 3, 8, 10)),
            (kpi, GridRect::new(8, 3, 4, 4)),
            (dialog, GridRect::new(8, 7, 4, 6)),
        ];
        let items: Vec<GridItem> = layout
            .into_iter()
            .map(|(child_id, rect)| {
                GridItem::new(GridItemId::fresh(), child_id, rect.x, rect.y, rect.w, rect.h)
            })
            .collect();
        if let Some(container) = spec.node_mut(&grid).and_then(Node::as_container_mut) {
            container.items = Some(items);
        }
        if let Some(container) = spec.node_mut(&root_id).and_then(Node::as_container_mut) {
            container.slot = Some(SlotContent::Grid { grid_id: grid });
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::guards::children_of;
    use crate::invariants::check_invariants;

    #[test]
    fn demo_is_valid_and_complete() {
        let spec = Spec::demo("Orders");
        assert!(check_invariants(&spec).is_empty());
        assert_eq!(spec.len(), 7);
        let leaves: BTreeMap<_, _> = spec
            .nodes
            .values()
            .filter_map(Node::as_leaf)
            .map(|leaf| (leaf.leaf_meta.component_ref.clone(), leaf.leaf_type))
            .collect();
        assert_eq!(leaves.get("DataTable"), Some(&LeafType::Table));
        assert_eq!(leaves.get("SearchForm"), Some(&LeafType::Form));
    }

    #[test]
    fn preset_builds_section_cells_with_inner_grids() {
        let mut spec = Spec::new_empty("preset");
        let root = spec.root_id.clone();
        let leaf = spec.create_leaf(LeafType::Table, None).expect("leaf");
        spec.set_slot_single(&root, &leaf).expect("attach");

        let grid = spec
            .apply_layout_preset(&root, &LayoutPreset::HeaderTwoColumns.cells())
            .expect("preset");
        assert!(!spec.contains(&leaf));
        let cells = children_of(&spec, &grid);
        assert_eq!(cells.len(), 3);
        for cell in cells {
            let section = spec
                .node(cell.child_id)
                .and_then(Node::as_container)
                .expect("section");
            assert_eq!(section.container_type, ContainerType::Section);
            assert!(matches!(section.slot, Some(SlotContent::Grid { .. })));
        }
        // outer grid + 3 sections + 3 inner grids + root
        assert_eq!(spec.len(), 8);
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in LayoutPreset::ALL {
            assert_eq!(LayoutPreset::parse(preset.as_str()), Some(preset));
            assert!(!preset.cells().is_empty());
        }
    }
}
