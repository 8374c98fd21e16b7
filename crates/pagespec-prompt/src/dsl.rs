//! Region-coded DSL walk.
//!
//! ```text
//! [ROOT] container:page
//!   [A] container:grid colNum=12 rowHeight=30
//!     [A1] leaf:form componentRef=SearchForm geom=(0,0,12,3)
//!     [A2] leaf:table componentRef=DataTable geom=(0,3,8,10)
//! ```
//!
//! The walk is a depth-first pass from the root over
//! [`children_of`](pagespec_core::children_of): slot target first, then grid
//! items by `(y, x, itemId)`. A node reached twice is emitted once.

use std::collections::BTreeSet;

use pagespec_core::{GridRect, Node, NodeId, Spec, children_of};

/// Code of the root node.
pub const ROOT_CODE: &str = "ROOT";

/// One emitted DSL line and the node it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct DslEntry<'a> {
    pub code: String,
    pub node_id: NodeId,
    pub node: &'a Node,
    pub depth: usize,
    /// Placement when the node was reached through a grid item.
    pub geom: Option<GridRect>,
    pub line: String,
}

/// Region code for the `index`-th child (0-based) of a node at `depth`
/// carrying `parent_code`.
#[must_use]
pub fn region_code(parent_code: &str, depth: usize, index: usize) -> String {
    if depth == 0 {
        return alpha(index);
    }
    format!("{parent_code}{}", index + 1)
}

fn alpha(index: usize) -> String {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => char::from(b'A' + offset).to_string(),
        _ => format!("X{}", index + 1),
    }
}

/// `leaf:<type> componentRef=<ref>`, `container:grid colNum=<n> rowHeight=<n>`
/// or `container:<type>`.
#[must_use]
pub fn describe_node(node: &Node) -> String {
    match node {
        Node::Leaf(leaf) => format!(
            "leaf:{} componentRef={}",
            leaf.leaf_type, leaf.leaf_meta.component_ref
        ),
        Node::Container(container) if container.is_grid() => {
            let config = container.grid_config();
            format!(
                "container:grid colNum={} rowHeight={}",
                config.col_num, config.row_height
            )
        }
        Node::Container(container) => format!("container:{}", container.container_type),
    }
}

struct Frame<'a> {
    id: &'a NodeId,
    code: String,
    depth: usize,
    geom: Option<GridRect>,
}

/// Walk the spec and produce one entry per reachable node.
///
/// The walk keeps its own stack, so arbitrarily deep nesting is fine.
#[must_use]
pub fn build_dsl(spec: &Spec, include_geometry: bool) -> Vec<DslEntry<'_>> {
    let mut visited = BTreeSet::new();
    let mut entries = Vec::new();
    let mut stack = vec![Frame {
        id: &spec.root_id,
        code: ROOT_CODE.to_owned(),
        depth: 0,
        geom: None,
    }];
    while let Some(Frame {
        id,
        code,
        depth,
        geom,
    }) = stack.pop()
    {
        if !visited.insert(id) {
            continue;
        }
        let Some(node) = spec.node(id) else {
            continue;
        };
        let mut line = format!("{}[{code}] {}", "  ".repeat(depth), describe_node(node));
        if include_geometry && let Some(rect) = geom {
            line.push_str(&format!(" geom=({},{},{},{})", rect.x, rect.y, rect.w, rect.h));
        }
        stack.extend(
            children_of(spec, id)
                .into_iter()
                .enumerate()
                .rev()
                .map(|(index, edge)| Frame {
                    id: edge.child_id,
                    code: region_code(&code, depth, index),
                    depth: depth + 1,
                    geom: edge.item.map(GridRect::from),
                }),
        );
        entries.push(DslEntry {
            code,
            node_id: id.clone(),
            node,
            depth,
            geom,
            line,
        });
    }
    entries
}

/// DSL lines in walk order.
#[must_use]
pub fn dsl_lines(entries: &[DslEntry<'_>]) -> Vec<String> {
    entries.iter().map(|entry| entry.line.clone()).collect()
}
