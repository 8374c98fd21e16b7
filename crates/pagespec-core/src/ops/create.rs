use std::collections::BTreeMap;

use super::{SpecOpError, SpecOpKind};
use crate::id::NodeId;
use crate::model::{
    ContainerNode, ContainerType, GridConfig, LeafMeta, LeafNode, LeafType, Node, Props, Spec,
};

/// Overrides applied to a leaf's metadata.
///
/// `fields` merge per key with the override winning; `recipes`, when given,
/// replace the whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafMetaPatch {
    pub component_ref: Option<String>,
    pub description: Option<String>,
    pub fields: BTreeMap<String, Vec<String>>,
    pub recipes: Option<Vec<String>>,
}

impl LeafMetaPatch {
    #[must_use]
    pub fn component(component_ref: impl Into<String>) -> Self {
        Self {
            component_ref: Some(component_ref.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_field<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _ = self
            .fields
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_recipes<I, S>(mut self, recipes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipes = Some(recipes.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn apply(self, meta: &mut LeafMeta) {
        if let Some(component_ref) = self.component_ref {
            meta.component_ref = component_ref;
        }
        if let Some(description) = self.description {
            meta.description = (!description.is_empty()).then_some(description);
        }
        meta.fields.extend(self.fields);
        if let Some(recipes) = self.recipes {
            meta.recipes = recipes;
        }
    }
}

impl Spec {
    pub(crate) fn insert_leaf(
        &mut self,
        leaf_type: LeafType,
        overrides: Option<LeafMetaPatch>,
    ) -> NodeId {
        let id = self.allocate_node_id();
        let mut leaf_meta = LeafMeta::for_type(leaf_type);
        if let Some(patch) = overrides {
            patch.apply(&mut leaf_meta);
        }
        let leaf = LeafNode {
            id: id.clone(),
            leaf_type,
            props: Props::new(),
            leaf_meta,
        };
        let _ = self.nodes.insert(id.clone(), Node::Leaf(leaf));
        id
    }

    pub(crate) fn insert_container(
        &mut self,
        container_type: ContainerType,
        props: Props,
    ) -> NodeId {
        let id = self.allocate_node_id();
        let container = ContainerNode::new(id.clone(), container_type, props);
        let _ = self.nodes.insert(id.clone(), Node::Container(container));
        id
    }

    pub(crate) fn insert_grid(&mut self, config: GridConfig) -> NodeId {
        let mut props = Props::new();
        config.write_props(&mut props);
        self.insert_container(ContainerType::Grid, props)
    }

    /// Allocate an unattached leaf. The component defaults by type.
    pub fn create_leaf(
        &mut self,
        leaf_type: LeafType,
        overrides: Option<LeafMetaPatch>,
    ) -> Result<NodeId, SpecOpError> {
        self.run_op(SpecOpKind::CreateLeaf, |spec| {
            let id = spec.insert_leaf(leaf_type, overrides);
            tracing::debug!(node_id = %id, leaf_type = leaf_type.as_str(), "leaf created");
            Ok(id)
        })
    }

    /// Allocate an unattached container. Slot hosts start with an empty slot;
    /// `grid` gets its geometry defaults with `props` merged over them.
    pub fn create_container(
        &mut self,
        container_type: ContainerType,
        props: Props,
    ) -> Result<NodeId, SpecOpError> {
        self.run_op(SpecOpKind::CreateContainer, |spec| {
            let id = if container_type == ContainerType::Grid {
                let id = spec.insert_grid(GridConfig::from_props(&props));
                if let Some(node) = spec.node_mut(&id) {
                    node.props_mut().extend(props);
                }
                id
            } else {
                spec.insert_container(container_type, props)
            };
            tracing::debug!(
                node_id = %id,
                container_type = container_type.as_str(),
                "container created"
            );
            Ok(id)
        })
    }

    /// Allocate an unattached grid container with empty items.
    pub fn create_grid_container(&mut self, config: GridConfig) -> Result<NodeId, SpecOpError> {
        self.run_op(SpecOpKind::CreateGridContainer, |spec| {
            let id = spec.insert_grid(config);
            tracing::debug!(node_id = %id, cols = config.col_num, "grid created");
            Ok(id)
        })
    }
}
