use std::collections::{BTreeMap, BTreeSet};

use crate::id::{GridItemId, NodeId, SpecId};
use crate::model::{SlotContent, Spec, now_millis};

/// Suffix appended to the name of a duplicated spec.
pub const COPY_SUFFIX: &str = " (copy)";

impl Spec {
    /// Deep copy with a fresh id for every node and every grid item.
    ///
    /// Internal references (root, slot targets, grid item children) are
    /// remapped; metadata is copied unchanged. References to ids absent from
    /// the node map are kept as they are.
    #[must_use]
    pub fn with_fresh_ids(&self) -> Spec {
        let mut mapping: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut taken: BTreeSet<NodeId> = self.nodes.keys().cloned().collect();
        for old in self.nodes.keys() {
            let fresh = loop {
                let candidate = NodeId::fresh();
                if taken.insert(candidate.clone()) {
                    break candidate;
                }
            };
            let _ = mapping.insert(old.clone(), fresh);
        }
        let remap = |id: &NodeId| mapping.get(id).cloned().unwrap_or_else(|| id.clone());

        let mut nodes = BTreeMap::new();
        for (old_id, node) in &self.nodes {
            let mut node = node.clone();
            node.set_id(remap(old_id));
            if let Some(container) = node.as_container_mut() {
                if let Some(slot) = container.slot.as_mut() {
                    let remapped = match &*slot {
                        SlotContent::Empty => SlotContent::Empty,
                        SlotContent::Single { child_id } => SlotContent::Single {
                            child_id: remap(child_id),
                        },
                        SlotContent::Grid { grid_id } => SlotContent::Grid {
                            grid_id: remap(grid_id),
                        },
                    };
                    *slot = remapped;
                }
                if let Some(items) = container.items.as_mut() {
                    let mut used = BTreeSet::new();
                    for item in items.iter_mut() {
                        item.item_id = loop {
                            let candidate = GridItemId::fresh();
                            if used.insert(candidate.clone()) {
                                break candidate;
                            }
                        };
                        item.child_id = remap(&item.child_id);
                    }
                }
            }
            let _ = nodes.insert(node.id().clone(), node);
        }

        Spec {
            version: self.version,
            root_id: remap(&self.root_id),
            nodes,
            meta: self.meta.clone(),
        }
    }

    /// Copy this spec under a new spec id with fully remapped node ids.
    ///
    /// The name gets a `" (copy)"` suffix, the timestamp is renewed and the
    /// template flag is cleared.
    #[must_use]
    pub fn duplicate(&self) -> Spec {
        let mut copy = self.with_fresh_ids();
        copy.meta.id = SpecId::fresh();
        copy.meta.name = format!("{}{COPY_SUFFIX}", self.meta.name);
        copy.meta.updated_at = now_millis();
        copy.meta.is_template = false;
        tracing::debug!(
            from = %self.meta.id,
            to = %copy.meta.id,
            nodes = copy.nodes.len(),
            "spec duplicated"
        );
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants::check_invariants;
    use crate::model::Node;

    #[test]
    fn duplicate_is_disjoint_and_valid() {
        let mut spec = Spec::demo("orders");
        spec.meta.is_template = true;
        let copy = spec.duplicate();

        assert!(check_invariants(&copy).is_empty());
        assert_eq!(copy.len(), spec.len());
        assert!(spec.nodes.keys().all(|id| !copy.contains(id)));
        assert_ne!(copy.root_id, spec.root_id);
        assert_ne!(copy.meta.id, spec.meta.id);
        assert_eq!(copy.meta.name, "orders (copy)");
        assert!(!copy.meta.is_template);
    }

    #[test]
    fn duplicate_remaps_grid_item_ids() {
        let spec = Spec::demo("orders");
        let copy = spec.duplicate();
        let item_ids = |s: &Spec| -> BTreeSet<GridItemId> {
            s.nodes
                .values()
                .filter_map(Node::as_container)
                .flat_map(|c| c.grid_items().iter().map(|i| i.item_id.clone()))
                .collect()
        };
        let original = item_ids(&spec);
        assert!(!original.is_empty());
        assert!(original.is_disjoint(&item_ids(&copy)));
    }
}
