use std::collections::BTreeSet;

use super::{SpecOpError, SpecOpKind};
use crate::guards::{descendant_closure, is_grid, reachable_from_root};
use crate::id::NodeId;
use crate::model::{Node, SlotContent, Spec};

impl Spec {
    /// Remove every slot reference and grid item that points into `ids`.
    pub(crate) fn scrub_references(&mut self, ids: &BTreeSet<NodeId>) -> bool {
        let mut changed = false;
        for node in self.nodes.values_mut() {
            let Some(container) = node.as_container_mut() else {
                continue;
            };
            if let Some(slot) = container.slot.as_mut()
                && slot.target().is_some_and(|target| ids.contains(target))
            {
                *slot = SlotContent::Empty;
                changed = true;
            }
            if let Some(items) = container.items.as_mut() {
                let before = items.len();
                items.retain(|item| !ids.contains(&item.child_id));
                changed |= items.len() != before;
            }
        }
        changed
    }

    /// Reset dangling references, drop dangling grid items, and delete every
    /// node unreachable from the root. Returns `(changed, removed_nodes)`.
    pub(crate) fn sweep_orphans(&mut self) -> (bool, usize) {
        let mut changed = false;
        let dangling_slots: Vec<NodeId> = self
            .nodes
            .values()
            .filter_map(Node::as_container)
            .filter(|container| match &container.slot {
                Some(SlotContent::Single { child_id }) => !self.contains(child_id),
                Some(SlotContent::Grid { grid_id }) => {
                    !self.node(grid_id).is_some_and(is_grid)
                }
                _ => false,
            })
            .map(|container| container.id.clone())
            .collect();
        for host_id in dangling_slots {
            if let Some(container) = self.node_mut(&host_id).and_then(Node::as_container_mut) {
                container.slot = Some(SlotContent::Empty);
                changed = true;
            }
        }

        let existing: BTreeSet<NodeId> = self.nodes.keys().cloned().collect();
        for node in self.nodes.values_mut() {
            if let Some(items) = node.as_container_mut().and_then(|c| c.items.as_mut()) {
                let before = items.len();
                items.retain(|item| existing.contains(&item.child_id));
                changed |= items.len() != before;
            }
        }

        let reachable = reachable_from_root(self);
        let before = self.nodes.len();
        self.nodes.retain(|id, _| reachable.contains(id));
        let removed = before - self.nodes.len();
        (changed || removed > 0, removed)
    }

    /// Delete a node and everything below it.
    ///
    /// Refuses the root and unknown ids (returns `false`). References to the
    /// deleted nodes are scrubbed and orphans are swept afterwards.
    pub fn delete_node_cascade(&mut self, node_id: &NodeId) -> Result<bool, SpecOpError> {
        if node_id == &self.root_id || !self.contains(node_id) {
            return Ok(false);
        }
        self.run_op(SpecOpKind::DeleteNodeCascade, |spec| {
            let closure = descendant_closure(spec, node_id);
            let _ = spec.scrub_references(&closure);
            spec.nodes.retain(|id, _| !closure.contains(id));
            let (_, swept) = spec.sweep_orphans();
            tracing::debug!(
                node_id = %node_id,
                deleted = closure.len(),
                swept,
                "node deleted with descendants"
            );
            Ok(true)
        })
    }

    /// Drop dangling references and unreachable nodes; returns how many nodes
    /// were removed. Running it twice changes nothing the second time.
    pub fn cleanup_orphans(&mut self) -> Result<usize, SpecOpError> {
        let (changed, removed) = self.sweep_orphans();
        if changed {
            self.commit(SpecOpKind::CleanupOrphans)?;
            tracing::debug!(removed, "orphans cleaned up");
        }
        Ok(removed)
    }
}
