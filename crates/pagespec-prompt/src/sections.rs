//! Section builders. Each returns the section body as lines.

use std::collections::BTreeSet;

use pagespec_core::{LeafNode, LeafType, Node, Spec};

use crate::dsl::DslEntry;
use crate::options::{PromptMode, PromptOptions};
use crate::recipes::apply_recipe;

/// Field lists rendered first, in this order. Other keys follow alphabetically.
pub const PRIMARY_FIELDS: [&str; 4] = ["columns", "form", "series", "items"];

/// Body of Leaf Details when the spec has no reachable leaf.
pub const NO_LEAVES_LINE: &str = "- no leaf nodes";

const FIXED_RULES: [&str; 2] = [
    "Do not introduce UI libraries the project has not declared",
    "Do not replace project components with native HTML tags",
];

const FIXED_CHECKLIST: [&str; 3] = [
    "- [ ] Structure and region codes match the DSL",
    "- [ ] Every leaf is implemented with its componentRef",
    "- [ ] No new UI libraries and no native tags in place of project components",
];

fn leaves<'e, 'a>(entries: &'e [DslEntry<'a>]) -> impl Iterator<Item = (&'e str, &'a LeafNode)> {
    entries
        .iter()
        .filter_map(|entry| entry.node.as_leaf().map(|leaf| (entry.code.as_str(), leaf)))
}

/// Numbered list of what to hand back.
#[must_use]
pub fn deliverables(spec: &Spec, mode: PromptMode) -> Vec<String> {
    let leaf_types: BTreeSet<LeafType> = spec
        .nodes
        .values()
        .filter_map(Node::as_leaf)
        .map(|leaf| leaf.leaf_type)
        .collect();
    let has_overlay = spec
        .nodes
        .values()
        .filter_map(Node::as_container)
        .any(|container| container.container_type.is_overlay());

    let mut items = vec![
        format!("Page skeleton: {}/index", spec.meta.name),
        "Layout components: split into sub-components per DSL region (as needed)".to_owned(),
    ];
    if !leaf_types.is_empty() {
        let names: Vec<&str> = leaf_types.iter().map(|ty| ty.as_str()).collect();
        items.push(format!(
            "Leaf components: implementation files for {}",
            names.join(", ")
        ));
    }
    if has_overlay {
        items.push("Overlay components: Dialog/Drawer sub-modules".to_owned());
    }
    items.push("Interaction wiring: follow the recipes in Leaf Details".to_owned());
    if mode != PromptMode::Short {
        items.push(
            "Mock/API placeholders: minimal runnable data layer for each leaf's data needs"
                .to_owned(),
        );
        items.push("Self-check: verify every Checklist item before delivery".to_owned());
    }
    if mode == PromptMode::Batch {
        items.push(
            "Packaging: return every file in a single response, one code block per file path"
                .to_owned(),
        );
    }
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| format!("{}. {item}", index + 1))
        .collect()
}

/// Fixed rules followed by the caller's custom rules.
#[must_use]
pub fn hard_rules(options: &PromptOptions) -> Vec<String> {
    FIXED_RULES
        .iter()
        .map(|rule| (*rule).to_owned())
        .chain(
            options
                .custom_rules
                .iter()
                .map(|rule| rule.trim())
                .filter(|rule| !rule.is_empty())
                .map(str::to_owned),
        )
        .collect()
}

/// Per-leaf metadata in DSL walk order.
#[must_use]
pub fn leaf_details(entries: &[DslEntry<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (code, leaf) in leaves(entries) {
        let meta = &leaf.leaf_meta;
        lines.push(format!("- [{code}] {} -> {}", leaf.leaf_type, meta.component_ref));
        if let Some(description) = meta.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("  - description: {description}"));
        }
        let mut keys: Vec<&str> = PRIMARY_FIELDS.to_vec();
        keys.extend(
            meta.fields
                .keys()
                .map(String::as_str)
                .filter(|key| PRIMARY_FIELDS.iter().all(|primary| primary != key)),
        );
        for key in keys {
            if let Some(values) = meta.fields.get(key).filter(|v| !v.is_empty()) {
                lines.push(format!("  - {key}: {}", values.join(", ")));
            }
        }
        if !meta.recipes.is_empty() {
            lines.push("  - recipes:".to_owned());
            for recipe in &meta.recipes {
                lines.push(format!("    - {}", apply_recipe(recipe).prompt_line));
            }
        }
    }
    if lines.is_empty() {
        lines.push(NO_LEAVES_LINE.to_owned());
    }
    lines
}

/// Fixed checks, then one line per leaf and one per leaf recipe.
#[must_use]
pub fn checklist(entries: &[DslEntry<'_>]) -> Vec<String> {
    let mut lines: Vec<String> = FIXED_CHECKLIST.iter().map(|line| (*line).to_owned()).collect();
    for (code, leaf) in leaves(entries) {
        lines.push(format!(
            "- [ ] [{code}] complete {} placement with {} and data placeholders",
            leaf.leaf_type, leaf.leaf_meta.component_ref
        ));
        for recipe in &leaf.leaf_meta.recipes {
            lines.push(format!("- [ ] [{code}] {}", apply_recipe(recipe).checklist_line));
        }
    }
    lines
}
