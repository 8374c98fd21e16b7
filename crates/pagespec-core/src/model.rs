//! Page spec schema.
//!
//! A [`Spec`] is a flat arena of [`Node`]s keyed by [`NodeId`]. Containers
//! reference their content by ID only (slot targets and grid item children),
//! so the whole page can be deep-copied, serialized, and re-keyed without
//! rewriting pointers.
//!
//! The serialized shape is the public import/export format:
//!
//! ```json
//! {
//!   "version": 1,
//!   "rootId": "n_0f3a9c1b2d",
//!   "nodes": {
//!     "n_0f3a9c1b2d": { "kind": "container", "type": "page", "props": {}, "slot": { "kind": "empty" } }
//!   },
//!   "meta": { "id": "spec_5e1d0a77c4", "name": "Orders", "tags": [], "updatedAt": 1700000000000, "isTemplate": false }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{GridItemId, NodeId, SpecId};

/// Current spec schema version.
pub const SPEC_VERSION: u32 = 1;

/// Default grid column count.
pub const DEFAULT_GRID_COLUMNS: u32 = 12;
/// Default grid row height in pixels.
pub const DEFAULT_GRID_ROW_HEIGHT: u32 = 30;
/// Default grid margin in pixels (both axes).
pub const DEFAULT_GRID_MARGIN: u32 = 12;
/// Default width of an auto-placed grid item, in columns.
pub const DEFAULT_ITEM_WIDTH: u32 = 6;
/// Default height of an auto-placed grid item, in rows.
pub const DEFAULT_ITEM_HEIGHT: u32 = 6;

/// Open presentational configuration bag.
pub type Props = BTreeMap<String, Value>;

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Container node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    Page,
    Section,
    Card,
    Tabs,
    Split,
    Grid,
    Dialog,
    Drawer,
}

impl ContainerType {
    pub const ALL: [Self; 8] = [
        Self::Page,
        Self::Section,
        Self::Card,
        Self::Tabs,
        Self::Split,
        Self::Grid,
        Self::Dialog,
        Self::Drawer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Section => "section",
            Self::Card => "card",
            Self::Tabs => "tabs",
            Self::Split => "split",
            Self::Grid => "grid",
            Self::Dialog => "dialog",
            Self::Drawer => "drawer",
        }
    }

    /// Every container type except `grid` hosts a slot.
    #[must_use]
    pub const fn is_slot_host(self) -> bool {
        !matches!(self, Self::Grid)
    }

    /// Dialogs and drawers render outside the page flow.
    #[must_use]
    pub const fn is_overlay(self) -> bool {
        matches!(self, Self::Dialog | Self::Drawer)
    }

    /// Parse a lowercase type name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == raw)
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafType {
    Table,
    Chart,
    List,
    Tree,
    Kpi,
    Form,
    Custom,
}

impl LeafType {
    pub const ALL: [Self; 7] = [
        Self::Table,
        Self::Chart,
        Self::List,
        Self::Tree,
        Self::Kpi,
        Self::Form,
        Self::Custom,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Chart => "chart",
            Self::List => "list",
            Self::Tree => "tree",
            Self::Kpi => "kpi",
            Self::Form => "form",
            Self::Custom => "custom",
        }
    }

    /// Component instantiated for a new leaf when the caller names none.
    #[must_use]
    pub const fn default_component_ref(self) -> &'static str {
        match self {
            Self::Table => "DataTable",
            Self::Chart => "ChartPanel",
            Self::List => "ListView",
            Self::Tree => "TreeView",
            Self::Kpi => "KpiCard",
            Self::Form => "FormPanel",
            Self::Custom => "CustomBlock",
        }
    }

    /// Parse a lowercase type name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == raw)
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of a slot host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotContent {
    Empty,
    Single {
        #[serde(rename = "childId")]
        child_id: NodeId,
    },
    Grid {
        #[serde(rename = "gridId")]
        grid_id: NodeId,
    },
}

impl SlotContent {
    /// Node referenced by this slot, if any.
    #[must_use]
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Self::Empty => None,
            Self::Single { child_id } => Some(child_id),
            Self::Grid { grid_id } => Some(grid_id),
        }
    }

    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Single { .. } => "single",
            Self::Grid { .. } => "grid",
        }
    }
}

/// One placed child of a grid container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub item_id: GridItemId,
    pub child_id: NodeId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl GridItem {
    /// Item with geometry only and no size bounds.
    #[must_use]
    pub fn new(item_id: GridItemId, child_id: NodeId, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            item_id,
            child_id,
            x,
            y,
            w,
            h,
            min_w: None,
            min_h: None,
            max_w: None,
            max_h: None,
            is_static: false,
        }
    }
}

/// Compaction direction used by the visual grid editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactType {
    Vertical,
    Horizontal,
}

impl CompactType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
        }
    }
}

/// Geometry defaults of a grid container, stored inside its `props`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub col_num: u32,
    pub row_height: u32,
    pub margin: [u32; 2],
    pub compact_type: Option<CompactType>,
    pub prevent_collision: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            col_num: DEFAULT_GRID_COLUMNS,
            row_height: DEFAULT_GRID_ROW_HEIGHT,
            margin: [DEFAULT_GRID_MARGIN, DEFAULT_GRID_MARGIN],
            compact_type: Some(CompactType::Vertical),
            prevent_collision: true,
        }
    }
}

impl GridConfig {
    /// Write the config into a props bag.
    pub fn write_props(&self, props: &mut Props) {
        props.insert("colNum".into(), Value::from(self.col_num));
        props.insert("rowHeight".into(), Value::from(self.row_height));
        props.insert(
            "margin".into(),
            Value::from(vec![self.margin[0], self.margin[1]]),
        );
        props.insert(
            "compactType".into(),
            self.compact_type
                .map_or(Value::Null, |compact| Value::from(compact.as_str())),
        );
        props.insert(
            "preventCollision".into(),
            Value::from(self.prevent_collision),
        );
    }

    /// Read a config back from props, falling back to defaults per field.
    #[must_use]
    pub fn from_props(props: &Props) -> Self {
        let defaults = Self::default();
        let read_u32 = |key: &str| {
            props
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|raw| u32::try_from(raw).ok())
        };
        let margin = props
            .get("margin")
            .and_then(Value::as_array)
            .and_then(|pair| match pair.as_slice() {
                [x, y] => Some([
                    u32::try_from(x.as_u64()?).ok()?,
                    u32::try_from(y.as_u64()?).ok()?,
                ]),
                _ => None,
            })
            .unwrap_or(defaults.margin);
        let compact_type = match props.get("compactType") {
            Some(Value::Null) => None,
            Some(Value::String(raw)) if raw == "horizontal" => Some(CompactType::Horizontal),
            Some(Value::String(raw)) if raw == "vertical" => Some(CompactType::Vertical),
            _ => defaults.compact_type,
        };
        Self {
            col_num: read_u32("colNum")
                .filter(|cols| *cols > 0)
                .unwrap_or(defaults.col_num),
            row_height: read_u32("rowHeight").unwrap_or(defaults.row_height),
            margin,
            compact_type,
            prevent_collision: props
                .get("preventCollision")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.prevent_collision),
        }
    }
}

/// Leaf binding to a concrete UI component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafMeta {
    pub component_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub recipes: Vec<String>,
}

impl LeafMeta {
    /// Metadata for a fresh leaf of the given type.
    #[must_use]
    pub fn for_type(leaf_type: LeafType) -> Self {
        Self {
            component_ref: leaf_type.default_component_ref().to_owned(),
            description: None,
            fields: BTreeMap::new(),
            recipes: Vec::new(),
        }
    }
}

/// Container node. Slot hosts carry `slot`; grids carry `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    #[serde(default)]
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<GridItem>>,
}

impl ContainerNode {
    /// Build a container with the content field its type requires.
    #[must_use]
    pub fn new(id: NodeId, container_type: ContainerType, props: Props) -> Self {
        let (slot, items) = if container_type.is_slot_host() {
            (Some(SlotContent::Empty), None)
        } else {
            (None, Some(Vec::new()))
        };
        Self {
            id,
            container_type,
            props,
            slot,
            items,
        }
    }

    #[must_use]
    pub const fn is_slot_host(&self) -> bool {
        self.container_type.is_slot_host()
    }

    #[must_use]
    pub fn is_grid(&self) -> bool {
        self.container_type == ContainerType::Grid
    }

    /// Grid items, empty for non-grid containers.
    #[must_use]
    pub fn grid_items(&self) -> &[GridItem] {
        self.items.as_deref().unwrap_or(&[])
    }

    /// Grid geometry read from props.
    #[must_use]
    pub fn grid_config(&self) -> GridConfig {
        GridConfig::from_props(&self.props)
    }
}

/// Leaf node bound to a UI component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub leaf_type: LeafType,
    #[serde(default)]
    pub props: Props,
    #[serde(rename = "leafMeta")]
    pub leaf_meta: LeafMeta,
}

/// Node payload variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Container(ContainerNode),
    Leaf(LeafNode),
}

impl Node {
    #[must_use]
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Container(container) => &container.id,
            Self::Leaf(leaf) => &leaf.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        match self {
            Self::Container(container) => container.id = id,
            Self::Leaf(leaf) => leaf.id = id,
        }
    }

    /// `"container"` or `"leaf"`.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::Leaf(_) => "leaf",
        }
    }

    /// Container or leaf type name.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::Container(container) => container.container_type.as_str(),
            Self::Leaf(leaf) => leaf.leaf_type.as_str(),
        }
    }

    #[must_use]
    pub fn props(&self) -> &Props {
        match self {
            Self::Container(container) => &container.props,
            Self::Leaf(leaf) => &leaf.props,
        }
    }

    pub fn props_mut(&mut self) -> &mut Props {
        match self {
            Self::Container(container) => &mut container.props,
            Self::Leaf(leaf) => &mut leaf.props,
        }
    }

    #[must_use]
    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            Self::Container(container) => Some(container),
            Self::Leaf(_) => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerNode> {
        match self {
            Self::Container(container) => Some(container),
            Self::Leaf(_) => None,
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Container(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Container(_) => None,
        }
    }
}

/// Spec metadata shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMeta {
    pub id: SpecId,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub updated_at: u64,
    #[serde(default)]
    pub is_template: bool,
}

/// Serializable page definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub version: u32,
    pub root_id: NodeId,
    pub nodes: BTreeMap<NodeId, Node>,
    pub meta: SpecMeta,
}

impl Spec {
    /// New spec holding a single root page container with an empty slot.
    #[must_use]
    pub fn new_empty(name: impl Into<String>) -> Self {
        let root_id = NodeId::fresh();
        let root = ContainerNode::new(root_id.clone(), ContainerType::Page, Props::new());
        let mut nodes = BTreeMap::new();
        nodes.insert(root_id.clone(), Node::Container(root));
        Self {
            version: SPEC_VERSION,
            root_id,
            nodes,
            meta: SpecMeta {
                id: SpecId::fresh(),
                name: name.into(),
                tags: Vec::new(),
                updated_at: now_millis(),
                is_template: false,
            },
        }
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Root node, if the root ID resolves.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&self.root_id)
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bump `meta.updatedAt`; never moves backwards.
    pub fn touch(&mut self) {
        self.meta.updated_at = now_millis().max(self.meta.updated_at);
    }

    /// Allocate a node ID not yet present in this spec.
    #[must_use]
    pub fn allocate_node_id(&self) -> NodeId {
        loop {
            let candidate = NodeId::fresh();
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Allocate a grid item ID not yet used by `items`.
#[must_use]
pub fn allocate_item_id(items: &[GridItem]) -> GridItemId {
    loop {
        let candidate = GridItemId::fresh();
        if items.iter().all(|item| item.item_id != candidate) {
            return candidate;
        }
    }
}
