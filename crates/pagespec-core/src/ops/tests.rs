use std::collections::BTreeSet;

use proptest::prelude::*;

use super::*;
use crate::guards::{children_of, descendant_closure, slot_hosts};
use crate::invariants::check_invariants;
use crate::model::{ContainerType, LeafType, Props, SlotContent};
use crate::placement::{GeomPatch, GridRect, Placement};

#[derive(Debug, Clone)]
enum Step {
    AddLeaf { host: usize, leaf: usize },
    AddContainer { host: usize, kind: usize },
    Delete { node: usize },
    Move { node: usize, host: usize },
    Resize { grid: usize, item: usize, w: u32, h: u32 },
    Downgrade { host: usize },
    Cleanup,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (any::<usize>(), 0usize..LeafType::ALL.len())
            .prop_map(|(host, leaf)| Step::AddLeaf { host, leaf }),
        2 => (any::<usize>(), 0usize..ContainerType::ALL.len())
            .prop_map(|(host, kind)| Step::AddContainer { host, kind }),
        1 => any::<usize>().prop_map(|node| Step::Delete { node }),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(node, host)| Step::Move { node, host }),
        1 => (any::<usize>(), any::<usize>(), 1u32..16, 1u32..8)
            .prop_map(|(grid, item, w, h)| Step::Resize { grid, item, w, h }),
        1 => any::<usize>().prop_map(|host| Step::Downgrade { host }),
        1 => Just(Step::Cleanup),
    ]
}

fn pick<T: Clone>(items: &[T], index: usize) -> Option<T> {
    (!items.is_empty()).then(|| items[index % items.len()].clone())
}

fn host_ids(spec: &Spec) -> Vec<NodeId> {
    slot_hosts(spec).iter().map(|host| host.id.clone()).collect()
}

fn grid_ids(spec: &Spec) -> Vec<NodeId> {
    spec.nodes
        .values()
        .filter_map(Node::as_container)
        .filter(|c| c.is_grid())
        .map(|c| c.id.clone())
        .collect()
}

/// Attach a node the way the editor does: fill an empty slot, upgrade a
/// single slot, or append to a grid slot.
fn drop_into(spec: &mut Spec, host: &NodeId, child: &NodeId) -> Result<(), SpecOpError> {
    spec.move_node(
        child,
        MoveTarget::Slot {
            host_id: host.clone(),
        },
    )
}

fn apply(spec: &mut Spec, step: &Step) -> Result<(), SpecOpError> {
    match *step {
        Step::AddLeaf { host, leaf } => {
            let Some(host) = pick(&host_ids(spec), host) else {
                return Ok(());
            };
            let leaf = spec.create_leaf(LeafType::ALL[leaf], None)?;
            drop_into(spec, &host, &leaf)
        }
        Step::AddContainer { host, kind } => {
            let Some(host) = pick(&host_ids(spec), host) else {
                return Ok(());
            };
            let container = spec.create_container(ContainerType::ALL[kind], Props::new())?;
            if ContainerType::ALL[kind] == ContainerType::Grid {
                let host_grid = spec.ensure_container_grid(&host)?;
                let _ = spec.add_grid_item(&host_grid, &container, Placement::default())?;
                return Ok(());
            }
            drop_into(spec, &host, &container)
        }
        Step::Delete { node } => {
            let ids: Vec<NodeId> = spec.nodes.keys().cloned().collect();
            if let Some(node) = pick(&ids, node) {
                let _ = spec.delete_node_cascade(&node)?;
            }
            Ok(())
        }
        Step::Move { node, host } => {
            let ids: Vec<NodeId> = spec.nodes.keys().cloned().collect();
            let (Some(node), Some(host)) = (pick(&ids, node), pick(&host_ids(spec), host)) else {
                return Ok(());
            };
            drop_into(spec, &host, &node)
        }
        Step::Resize { grid, item, w, h } => {
            let Some(grid) = pick(&grid_ids(spec), grid) else {
                return Ok(());
            };
            let items: Vec<_> = spec
                .node(&grid)
                .and_then(Node::as_container)
                .map(|c| c.grid_items().iter().map(|i| i.item_id.clone()).collect())
                .unwrap_or_default();
            if let Some(item) = pick(&items, item) {
                let patch = GeomPatch {
                    w: Some(w),
                    h: Some(h),
                    ..GeomPatch::default()
                };
                let _ = spec.update_grid_geom(&grid, &item, patch)?;
            }
            Ok(())
        }
        Step::Downgrade { host } => {
            if let Some(host) = pick(&host_ids(spec), host) {
                let _ = spec.downgrade_grid_to_single(&host)?;
            }
            Ok(())
        }
        Step::Cleanup => spec.cleanup_orphans().map(|_| ()),
    }
}

fn slot_kind_profile(spec: &Spec) -> Vec<(&'static str, &'static str, usize)> {
    let mut profile: Vec<_> = spec
        .nodes
        .values()
        .map(|node| {
            let slot = node
                .as_container()
                .and_then(|c| c.slot.as_ref())
                .map_or("-", SlotContent::kind_str);
            let items = node.as_container().map_or(0, |c| c.grid_items().len());
            (node.type_str(), slot, items)
        })
        .collect();
    profile.sort_unstable();
    profile
}

fn geometry_profile(spec: &Spec) -> Vec<GridRect> {
    let mut rects: Vec<GridRect> = spec
        .nodes
        .values()
        .filter_map(Node::as_container)
        .flat_map(|c| c.grid_items().iter().map(GridRect::from))
        .collect();
    rects.sort_unstable_by_key(|r| (r.x, r.y, r.w, r.h));
    rects
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_edit_sequences_preserve_invariants(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut spec = Spec::new_empty("fuzz");
        for step in &steps {
            if let Err(err) = apply(&mut spec, step) {
                prop_assert!(err.violations().is_empty(), "{step:?} broke invariants: {err}");
            }
            prop_assert!(check_invariants(&spec).is_empty(), "after {step:?}");
        }
    }

    #[test]
    fn cascade_delete_removes_exactly_the_closure(steps in prop::collection::vec(step_strategy(), 4..30), victim in any::<usize>()) {
        let mut spec = Spec::new_empty("cascade");
        for step in &steps {
            let _ = apply(&mut spec, step);
        }
        let _ = spec.cleanup_orphans().expect("cleanup");
        let candidates: Vec<NodeId> = spec
            .nodes
            .keys()
            .filter(|id| **id != spec.root_id)
            .cloned()
            .collect();
        let Some(victim) = pick(&candidates, victim) else {
            return Ok(());
        };
        let closure = descendant_closure(&spec, &victim);
        let before: BTreeSet<NodeId> = spec.nodes.keys().cloned().collect();
        prop_assert!(spec.delete_node_cascade(&victim).expect("delete"));

        for id in &closure {
            prop_assert!(!spec.contains(id));
        }
        // Survivors are everything outside the closure that is still reachable.
        let expected: BTreeSet<NodeId> = before.difference(&closure).cloned().collect();
        let after: BTreeSet<NodeId> = spec.nodes.keys().cloned().collect();
        prop_assert!(after.is_subset(&expected));
        for id in spec.nodes.keys() {
            for edge in children_of(&spec, id) {
                prop_assert!(!closure.contains(edge.child_id));
            }
        }
        prop_assert!(check_invariants(&spec).is_empty());
    }

    #[test]
    fn duplicate_is_disjoint_and_isomorphic(steps in prop::collection::vec(step_strategy(), 1..30)) {
        let mut spec = Spec::new_empty("dup");
        for step in &steps {
            let _ = apply(&mut spec, step);
        }
        let copy = spec.duplicate();
        prop_assert!(check_invariants(&copy).is_empty());
        let original: BTreeSet<_> = spec.nodes.keys().collect();
        prop_assert!(copy.nodes.keys().all(|id| !original.contains(id)));
        prop_assert_eq!(copy.len(), spec.len());
        prop_assert_eq!(slot_kind_profile(&copy), slot_kind_profile(&spec));
        prop_assert_eq!(geometry_profile(&copy), geometry_profile(&spec));
    }
}

#[test]
fn upgrade_then_remove_then_downgrade_restores_single() {
    let mut spec = Spec::new_empty("round trip");
    let root = spec.root_id.clone();
    let a = spec.create_leaf(LeafType::Table, None).expect("a");
    let b = spec.create_leaf(LeafType::Chart, None).expect("b");
    spec.set_slot_single(&root, &a).expect("attach a");
    let grid = spec
        .upgrade_slot_to_grid(&root, &b, Some(Placement::at(0, 6, 12, 4)))
        .expect("upgrade");

    assert!(!spec.downgrade_grid_to_single(&root).expect("two items"));

    let a_item = spec
        .node(&grid)
        .and_then(Node::as_container)
        .expect("grid")
        .grid_items()
        .iter()
        .find(|item| item.child_id == a)
        .map(|item| item.item_id.clone())
        .expect("a placed");
    assert!(spec.remove_grid_item(&grid, &a_item).expect("remove a"));
    assert!(spec.downgrade_grid_to_single(&root).expect("downgrade"));

    let slot = spec
        .node(&root)
        .and_then(Node::as_container)
        .and_then(|c| c.slot.clone());
    assert_eq!(slot, Some(SlotContent::Single { child_id: b }));
    assert!(!spec.contains(&grid));
    assert!(check_invariants(&spec).is_empty());
}

#[test]
fn failed_reference_checks_leave_spec_untouched() {
    let mut spec = Spec::demo("untouched");
    let before = spec.clone();
    let missing = NodeId::new("n_missing");
    let root = spec.root_id.clone();
    assert!(spec.set_slot_single(&root, &missing).is_err());
    assert!(spec.replace_single_child(&root, &missing).is_err());
    assert!(
        spec.move_node(&missing, MoveTarget::Slot { host_id: root.clone() })
            .is_err()
    );
    assert!(
        spec.add_grid_item(&missing, &root, Placement::default())
            .is_err()
    );
    assert_eq!(spec, before);
}
