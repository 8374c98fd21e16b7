//! Capability predicates and read-only traversal helpers.
//!
//! Traversal follows the two edge kinds of the node graph: a slot host's
//! slot reference, then a grid's items in `(y, x, itemId)` order.

use std::collections::BTreeSet;

use crate::id::{GridItemId, NodeId};
use crate::model::{ContainerNode, GridItem, Node, SlotContent, Spec};

#[must_use]
pub fn is_leaf(node: &Node) -> bool {
    matches!(node, Node::Leaf(_))
}

#[must_use]
pub fn is_container(node: &Node) -> bool {
    matches!(node, Node::Container(_))
}

/// True for every container type except `grid`.
#[must_use]
pub fn is_slot_host(node: &Node) -> bool {
    node.as_container().is_some_and(ContainerNode::is_slot_host)
}

#[must_use]
pub fn is_grid(node: &Node) -> bool {
    node.as_container().is_some_and(ContainerNode::is_grid)
}

/// All slot-host containers, in node-id order.
#[must_use]
pub fn slot_hosts(spec: &Spec) -> Vec<&ContainerNode> {
    spec.nodes
        .values()
        .filter_map(Node::as_container)
        .filter(|container| container.is_slot_host())
        .collect()
}

/// Grid items ordered top-to-bottom, left-to-right, then by item id.
#[must_use]
pub fn sorted_grid_items(items: &[GridItem]) -> Vec<&GridItem> {
    let mut sorted: Vec<&GridItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        a.y.cmp(&b.y)
            .then(a.x.cmp(&b.x))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    sorted
}

/// One outgoing edge of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEdge<'a> {
    pub child_id: &'a NodeId,
    /// Placement when the edge is a grid item.
    pub item: Option<&'a GridItem>,
}

/// Outgoing edges of `id` in traversal order. Empty for leaves and unknown ids.
#[must_use]
pub fn children_of<'a>(spec: &'a Spec, id: &NodeId) -> Vec<ChildEdge<'a>> {
    let Some(container) = spec.node(id).and_then(Node::as_container) else {
        return Vec::new();
    };
    let mut edges = Vec::new();
    if let Some(target) = container.slot.as_ref().and_then(SlotContent::target) {
        edges.push(ChildEdge {
            child_id: target,
            item: None,
        });
    }
    if container.is_grid() {
        edges.extend(
            sorted_grid_items(container.grid_items())
                .into_iter()
                .map(|item| ChildEdge {
                    child_id: &item.child_id,
                    item: Some(item),
                }),
        );
    }
    edges
}

/// Where a node is referenced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Referenced by a slot host's `single` or `grid` slot.
    Slot { host_id: NodeId },
    /// Referenced by a grid item.
    GridItem { grid_id: NodeId, item_id: GridItemId },
}

impl ParentRef {
    #[must_use]
    pub fn parent_id(&self) -> &NodeId {
        match self {
            Self::Slot { host_id } => host_id,
            Self::GridItem { grid_id, .. } => grid_id,
        }
    }
}

/// First reference to `id` in node-id order, if any.
#[must_use]
pub fn find_parent_ref(spec: &Spec, id: &NodeId) -> Option<ParentRef> {
    spec.nodes.values().filter_map(Node::as_container).find_map(|container| {
        if container.slot.as_ref().and_then(SlotContent::target) == Some(id) {
            return Some(ParentRef::Slot {
                host_id: container.id.clone(),
            });
        }
        container
            .grid_items()
            .iter()
            .find(|item| &item.child_id == id)
            .map(|item| ParentRef::GridItem {
                grid_id: container.id.clone(),
                item_id: item.item_id.clone(),
            })
    })
}

/// Slot host whose slot delegates to `grid_id`.
#[must_use]
pub fn find_host_by_grid_id<'a>(spec: &'a Spec, grid_id: &NodeId) -> Option<&'a ContainerNode> {
    slot_hosts(spec).into_iter().find(|host| {
        matches!(&host.slot, Some(SlotContent::Grid { grid_id: target }) if target == grid_id)
    })
}

/// Root-to-node id path, or `None` when `id` is unreachable.
#[must_use]
pub fn find_path(spec: &Spec, id: &NodeId) -> Option<Vec<NodeId>> {
    let mut visited = BTreeSet::new();
    let mut path: Vec<NodeId> = Vec::new();
    let mut stack = vec![(&spec.root_id, 0_usize)];
    while let Some((current, depth)) = stack.pop() {
        if !spec.contains(current) || !visited.insert(current) {
            continue;
        }
        path.truncate(depth);
        path.push(current.clone());
        if current == id {
            return Some(path);
        }
        stack.extend(
            children_of(spec, current)
                .into_iter()
                .rev()
                .map(|edge| (edge.child_id, depth + 1)),
        );
    }
    None
}

/// Ids reachable from `start` (inclusive) over slot and grid-item edges.
#[must_use]
pub fn descendant_closure(spec: &Spec, start: &NodeId) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![start.clone()];
    while let Some(node_id) = stack.pop() {
        if !spec.contains(&node_id) || !seen.insert(node_id.clone()) {
            continue;
        }
        stack.extend(
            children_of(spec, &node_id)
                .into_iter()
                .map(|edge| edge.child_id.clone()),
        );
    }
    seen
}

/// Ids reachable from the root.
#[must_use]
pub fn reachable_from_root(spec: &Spec) -> BTreeSet<NodeId> {
    descendant_closure(spec, &spec.root_id)
}
