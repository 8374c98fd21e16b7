use serde_json::Value;

use super::{LeafMetaPatch, SpecOpError, SpecOpFailure, SpecOpKind};
use crate::id::NodeId;
use crate::model::{Node, Props, Spec};

/// Split a comma-separated list, trimming blanks.
#[must_use]
pub fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

impl Spec {
    /// Merge a metadata patch into a leaf.
    pub fn update_leaf_meta(
        &mut self,
        node_id: &NodeId,
        patch: LeafMetaPatch,
    ) -> Result<(), SpecOpError> {
        self.run_op(SpecOpKind::UpdateLeafMeta, |spec| {
            let _ = spec.require_node(node_id)?;
            let leaf = spec
                .nodes
                .get_mut(node_id)
                .and_then(Node::as_leaf_mut)
                .ok_or_else(|| SpecOpFailure::NotLeaf {
                    node_id: node_id.clone(),
                })?;
            patch.apply(&mut leaf.leaf_meta);
            Ok(())
        })
    }

    /// Replace one named field list of a leaf from comma-separated input.
    pub fn set_leaf_field(
        &mut self,
        node_id: &NodeId,
        key: &str,
        csv: &str,
    ) -> Result<(), SpecOpError> {
        self.update_leaf_meta(
            node_id,
            LeafMetaPatch::default().with_field(key, split_csv(csv)),
        )
    }

    /// Shallow-merge `patch` into a node's props; `null` values remove keys.
    pub fn update_props(&mut self, node_id: &NodeId, patch: Props) -> Result<(), SpecOpError> {
        self.run_op(SpecOpKind::UpdateProps, |spec| {
            let _ = spec.require_node(node_id)?;
            if let Some(node) = spec.nodes.get_mut(node_id) {
                let props = node.props_mut();
                for (key, value) in patch {
                    if value == Value::Null {
                        let _ = props.remove(&key);
                    } else {
                        let _ = props.insert(key, value);
                    }
                }
            }
            Ok(())
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), SpecOpError> {
        let name = name.into();
        self.run_op(SpecOpKind::UpdateMeta, |spec| {
            spec.meta.name = name;
            Ok(())
        })
    }

    /// Replace the tag list; blanks and duplicates are dropped, order kept.
    pub fn set_tags<I, S>(&mut self, tags: I) -> Result<(), SpecOpError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into().trim().to_owned();
            if !tag.is_empty() && !cleaned.contains(&tag) {
                cleaned.push(tag);
            }
        }
        self.run_op(SpecOpKind::UpdateMeta, |spec| {
            spec.meta.tags = cleaned;
            Ok(())
        })
    }
}
