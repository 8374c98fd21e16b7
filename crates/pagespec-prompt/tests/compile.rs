use pagespec_core::{
    ContainerType, LeafMetaPatch, LeafType, MoveTarget, NodeId, Placement, Props, Spec,
};
use pagespec_prompt::{
    PromptMode, PromptOptions, SECTION_TITLES, build_prompt, find_recipe, lint_spec,
};
use proptest::prelude::*;

fn example_page() -> Spec {
    let mut spec = Spec::new_empty("示例页");
    let root = spec.root_id.clone();
    let table = spec
        .create_leaf(
            LeafType::Table,
            Some(LeafMetaPatch::component("JrTable").with_recipes(["search.submit.reload"])),
        )
        .expect("table");
    spec.set_slot_single(&root, &table).expect("attach");
    spec
}

fn section_positions(raw: &str) -> Vec<usize> {
    SECTION_TITLES
        .iter()
        .map(|title| raw.find(&format!("## {title}")).expect("section present"))
        .collect()
}

#[test]
fn single_table_page_scenario() {
    let spec = example_page();
    let result = build_prompt(&spec, &PromptOptions::default());
    let recipe = find_recipe("search.submit.reload").expect("built-in recipe");

    assert!(result.raw_text.contains("JrTable"));
    assert!(result.raw_text.contains(recipe.prompt));
    assert!(result.raw_text.contains(recipe.checklist));
    assert!(result.raw_text.contains("示例页/index"));
    assert!(section_positions(&result.raw_text).windows(2).all(|w| w[0] < w[1]));

    assert_eq!(
        result.sections.dsl,
        vec![
            "[ROOT] container:page".to_owned(),
            "  [A] leaf:table componentRef=JrTable".to_owned(),
        ]
    );
    assert_eq!(result.sections.leaf_details[0], "- [A] table -> JrTable");
    assert_eq!(result.sections.leaf_details[1], "  - recipes:");
    assert_eq!(
        result.sections.checklist.last().map(String::as_str),
        Some(format!("- [ ] [A] {}", recipe.checklist).as_str())
    );
}

#[test]
fn unknown_recipe_still_compiles() {
    let mut spec = example_page();
    let table = spec
        .nodes
        .values()
        .find_map(|node| node.as_leaf().map(|leaf| leaf.id.clone()))
        .expect("table");
    spec.update_leaf_meta(&table, LeafMetaPatch::default().with_recipes(["mystery.flow"]))
        .expect("patch");
    let result = build_prompt(&spec, &PromptOptions::default());
    assert!(result.raw_text.contains("Unknown recipe: mystery.flow"));
    assert!(
        result
            .raw_text
            .contains("Confirm and complete unknown recipe: mystery.flow")
    );
    assert!(!lint_spec(&spec).is_empty());
}

#[test]
fn geometry_and_custom_rules_flow_through() {
    let spec = Spec::demo("Orders");
    let options = PromptOptions::new(PromptMode::Short)
        .with_geometry(true)
        .with_rule("Use the shared request helper");
    let result = build_prompt(&spec, &options);
    assert!(result.raw_text.contains("geom=(0,3,8,10)"));
    assert_eq!(
        result.sections.hard_rules.last().map(String::as_str),
        Some("Use the shared request helper")
    );
    assert!(!result.raw_text.contains("Mock/API"));
}

#[derive(Debug, Clone)]
enum Build {
    Leaf(usize),
    Container(usize),
}

fn build_strategy() -> impl Strategy<Value = Build> {
    prop_oneof![
        (0usize..LeafType::ALL.len()).prop_map(Build::Leaf),
        (0usize..ContainerType::ALL.len()).prop_map(Build::Container),
    ]
}

/// Grow a spec by dropping each new node into a host chosen by `pick`.
fn grow(steps: &[(Build, usize)]) -> Spec {
    let mut spec = Spec::new_empty("prop");
    let mut hosts: Vec<NodeId> = vec![spec.root_id.clone()];
    for (step, pick) in steps {
        let host = hosts[pick % hosts.len()].clone();
        let id = match step {
            Build::Leaf(i) => spec.create_leaf(LeafType::ALL[*i], None),
            Build::Container(i) if ContainerType::ALL[*i] == ContainerType::Grid => continue,
            Build::Container(i) => spec.create_container(ContainerType::ALL[*i], Props::new()),
        }
        .expect("create");
        if spec.node(&id).and_then(|n| n.as_container()).is_some() {
            hosts.push(id.clone());
        }
        let grid = spec.ensure_container_grid(&host).expect("grid");
        spec.move_node(
            &id,
            MoveTarget::Grid {
                grid_id: grid,
                placement: Placement::default(),
            },
        )
        .expect("place");
    }
    spec
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn compile_is_deterministic_and_ordered(
        steps in prop::collection::vec((build_strategy(), any::<usize>()), 0..20),
        mode in prop::sample::select(PromptMode::ALL.to_vec()),
        geometry in any::<bool>(),
    ) {
        let spec = grow(&steps);
        let options = PromptOptions::new(mode).with_geometry(geometry);
        let first = build_prompt(&spec, &options);
        let second = build_prompt(&spec.clone(), &options);
        prop_assert_eq!(&first.raw_text, &second.raw_text);
        prop_assert!(section_positions(&first.raw_text).windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(first.sections.dsl.len(), spec.len());
    }
}
