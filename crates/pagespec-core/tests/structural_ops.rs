use pagespec_core::{
    ContainerType, LayoutPreset, LeafMetaPatch, LeafType, MoveTarget, Node, Placement, Props,
    SlotContent, Spec, SpecOpFailure, check_invariants, children_of, find_orphans, find_path,
};

fn slot_of(spec: &Spec, host: &pagespec_core::NodeId) -> SlotContent {
    spec.node(host)
        .and_then(Node::as_container)
        .and_then(|c| c.slot.clone())
        .expect("slot host")
}

#[test]
fn build_a_dashboard_page_step_by_step() {
    let mut spec = Spec::new_empty("Dashboard");
    let root = spec.root_id.clone();

    let outer = spec
        .apply_layout_preset(&root, &LayoutPreset::Sidebar.cells())
        .expect("preset");
    let cells: Vec<_> = children_of(&spec, &outer)
        .into_iter()
        .map(|edge| edge.child_id.clone())
        .collect();
    assert_eq!(cells.len(), 2);

    let tree = spec
        .create_leaf(LeafType::Tree, Some(LeafMetaPatch::component("OrgTree")))
        .expect("tree");
    let table = spec
        .create_leaf(
            LeafType::Table,
            Some(
                LeafMetaPatch::component("JrTable")
                    .with_field("columns", ["name", "dept"])
                    .with_recipes(["tree.select.filter"]),
            ),
        )
        .expect("table");
    spec.move_node(
        &tree,
        MoveTarget::Slot {
            host_id: cells[0].clone(),
        },
    )
    .expect("tree into sidebar");
    spec.move_node(
        &table,
        MoveTarget::Slot {
            host_id: cells[1].clone(),
        },
    )
    .expect("table into main");

    let path = find_path(&spec, &table).expect("table reachable");
    assert_eq!(path.first(), Some(&root));
    assert_eq!(path.last(), Some(&table));
    assert!(path.contains(&cells[1]));
    assert!(find_orphans(&spec).is_empty());
    assert!(check_invariants(&spec).is_empty());
}

#[test]
fn replace_then_delete_displaced_subtree() {
    let mut spec = Spec::new_empty("Replace");
    let root = spec.root_id.clone();
    let card = spec
        .create_container(ContainerType::Card, Props::new())
        .expect("card");
    let kpi = spec.create_leaf(LeafType::Kpi, None).expect("kpi");
    spec.set_slot_single(&card, &kpi).expect("kpi in card");
    spec.set_slot_single(&root, &card).expect("card in root");

    let chart = spec.create_leaf(LeafType::Chart, None).expect("chart");
    let displaced = spec.replace_single_child(&root, &chart).expect("replace");
    assert_eq!(displaced, card);
    assert_eq!(find_orphans(&spec).len(), 2);

    assert!(spec.delete_node_cascade(&displaced).expect("delete"));
    assert!(find_orphans(&spec).is_empty());
    assert_eq!(spec.len(), 2);
    assert_eq!(slot_of(&spec, &root), SlotContent::Single { child_id: chart });
}

#[test]
fn grid_items_never_overlap_under_auto_placement() {
    let mut spec = Spec::new_empty("Grid");
    let root = spec.root_id.clone();
    let grid = spec.ensure_container_grid(&root).expect("grid");
    let sizes = [(4, 2), (8, 3), (12, 1), (3, 5), (6, 6), (5, 2), (2, 2)];
    for (w, h) in sizes {
        let leaf = spec.create_leaf(LeafType::List, None).expect("leaf");
        let _ = spec
            .add_grid_item(&grid, &leaf, Placement::sized(w, h))
            .expect("add");
    }
    let items = spec
        .node(&grid)
        .and_then(Node::as_container)
        .expect("grid")
        .grid_items()
        .to_vec();
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            let ra = pagespec_core::GridRect::from(a);
            let rb = pagespec_core::GridRect::from(b);
            assert!(!ra.overlaps(rb), "{a:?} overlaps {b:?}");
        }
        assert!(a.x + a.w <= 12);
    }
}

#[test]
fn errors_name_operation_and_node() {
    let mut spec = Spec::new_empty("Errors");
    let leaf = spec.create_leaf(LeafType::Custom, None).expect("leaf");
    let err = spec
        .ensure_container_grid(&leaf)
        .expect_err("leaf cannot host");
    assert!(matches!(err.reason, SpecOpFailure::NotContainer { .. }));
    let text = err.to_string();
    assert!(text.contains("ensure_container_grid"), "{text}");
    assert!(text.contains(leaf.as_str()), "{text}");
}
