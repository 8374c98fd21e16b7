//! Editor session: one open spec, one selection, one store.
//!
//! Every successful mutation queues a debounced save of the current spec.
//! The owner drives the debouncer with [`EditorSession::tick`] and forces it
//! with [`EditorSession::flush`]; dropping the session flushes as well.

use std::sync::Arc;
use std::time::Instant;

use pagespec_core::{
    ContainerType, GridConfig, GridItemId, LeafMetaPatch, LeafType, Node, NodeId, ParentRef,
    Placement, Props, SlotContent, Spec, SpecId, SpecOpError, SpecOpFailure, SpecOpKind,
    find_host_by_grid_id, find_parent_ref, find_path, sorted_grid_items,
};
use pagespec_prompt::{LintIssue, PromptResult, build_prompt, lint_spec};
use pagespec_store::{
    MemoryStorage, ScheduleOutcome, SpecStore, SpecSummary, StorageBackend, export_json,
    import_json,
};

use crate::config::EditorConfig;
use crate::error::{Error, Result};

/// What to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockPick {
    /// A leaf, optionally bound to a specific component.
    Leaf {
        leaf_type: LeafType,
        component_ref: Option<String>,
    },
    Container { container_type: ContainerType },
}

impl BlockPick {
    #[must_use]
    pub fn leaf(leaf_type: LeafType) -> Self {
        Self::Leaf {
            leaf_type,
            component_ref: None,
        }
    }

    #[must_use]
    pub fn component(leaf_type: LeafType, component_ref: impl Into<String>) -> Self {
        Self::Leaf {
            leaf_type,
            component_ref: Some(component_ref.into()),
        }
    }

    #[must_use]
    pub fn container(container_type: ContainerType) -> Self {
        Self::Container { container_type }
    }
}

/// How [`EditorSession::add_to_slot`] treats existing slot content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddMode {
    /// Keep what is there; a single child is upgraded to a grid.
    #[default]
    Append,
    /// Swap out the single child, or the first grid item's child.
    Replace,
}

pub struct EditorSession {
    config: EditorConfig,
    store: SpecStore,
    current: Option<Spec>,
    selected: Option<NodeId>,
}

impl EditorSession {
    /// Session over the storage named by `config`: a directory when
    /// `store_dir` is set, memory otherwise.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let backend = open_backend(&config);
        Self::with_backend(config, backend)
    }

    #[must_use]
    pub fn with_backend(config: EditorConfig, backend: Arc<dyn StorageBackend>) -> Self {
        let store = SpecStore::new(backend, config.store.clone());
        tracing::debug!(
            backend = store.backend().name(),
            auto_downgrade = config.auto_downgrade,
            "editor session opened"
        );
        Self {
            config,
            store,
            current: None,
            selected: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &SpecStore {
        &self.store
    }

    #[must_use]
    pub fn current(&self) -> Option<&Spec> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    fn spec(&self) -> Result<&Spec> {
        self.current.as_ref().ok_or(Error::NoCurrentSpec)
    }

    fn spec_mut(&mut self) -> Result<&mut Spec> {
        self.current.as_mut().ok_or(Error::NoCurrentSpec)
    }

    fn persist(&mut self) -> Option<ScheduleOutcome> {
        let spec = self.current.as_ref()?;
        Some(self.store.save_spec(spec))
    }

    fn set_current(&mut self, spec: Spec) -> SpecId {
        let id = spec.meta.id.clone();
        self.selected = Some(spec.root_id.clone());
        self.current = Some(spec);
        id
    }

    // ------------------------------------------------------------------
    // Spec lifecycle
    // ------------------------------------------------------------------

    /// Start a blank spec, make it current and queue its first save.
    pub fn new_spec(&mut self, name: impl Into<String>) -> SpecId {
        let id = self.set_current(Spec::new_empty(name));
        let _ = self.persist();
        tracing::info!(spec_id = %id, "spec created");
        id
    }

    /// Load a stored spec and make it current. Pending saves are written
    /// first so the load sees them.
    pub fn open(&mut self, id: &SpecId) -> Result<&Spec> {
        let _ = self.store.flush()?;
        let spec = self
            .store
            .load_spec(id)?
            .ok_or_else(|| Error::SpecNotFound(id.clone()))?;
        let _ = self.set_current(spec);
        tracing::debug!(spec_id = %id, "spec opened");
        self.spec()
    }

    /// Copy the current spec under a fresh identity and switch to the copy.
    pub fn duplicate_current(&mut self) -> Result<SpecId> {
        let copy = self.spec()?.duplicate();
        let id = self.set_current(copy);
        let _ = self.persist();
        tracing::info!(spec_id = %id, "spec duplicated");
        Ok(id)
    }

    /// Pretty JSON of the current spec.
    pub fn export_current(&self) -> Result<String> {
        Ok(export_json(self.spec()?)?)
    }

    /// Import an exported spec as a new current spec with fresh ids.
    pub fn import(&mut self, raw: &str) -> Result<SpecId> {
        let spec = import_json(raw)?;
        let id = self.set_current(spec);
        let _ = self.persist();
        tracing::info!(spec_id = %id, "spec imported");
        Ok(id)
    }

    /// History list, most recently updated first.
    pub fn list(&self) -> Result<Vec<SpecSummary>> {
        Ok(self.store.list_specs()?)
    }

    /// Delete a stored spec. Closes it when it is the current one.
    pub fn delete(&mut self, id: &SpecId) -> Result<bool> {
        let removed = self.store.delete_spec(id)?;
        if self.current.as_ref().is_some_and(|spec| &spec.meta.id == id) {
            self.current = None;
            self.selected = None;
        }
        Ok(removed)
    }

    /// Flag a stored spec as a template (or clear the flag).
    pub fn mark_template(&mut self, id: &SpecId, is_template: bool) -> Result<bool> {
        if let Some(spec) = self.current.as_mut().filter(|spec| &spec.meta.id == id) {
            spec.meta.is_template = is_template;
            let _ = self.persist();
        }
        Ok(self.store.mark_template(id, is_template)?)
    }

    /// Queue a save of the current spec.
    pub fn save(&mut self) -> Result<ScheduleOutcome> {
        self.save_at(Instant::now())
    }

    pub fn save_at(&mut self, now: Instant) -> Result<ScheduleOutcome> {
        let spec = self.current.as_ref().ok_or(Error::NoCurrentSpec)?;
        Ok(self.store.save_spec_at(spec, now))
    }

    /// Write saves whose debounce window has closed.
    pub fn tick(&mut self) -> Result<usize> {
        Ok(self.store.tick()?)
    }

    pub fn tick_at(&mut self, now: Instant) -> Result<usize> {
        Ok(self.store.tick_at(now)?)
    }

    /// Write every pending save now.
    pub fn flush(&mut self) -> Result<usize> {
        Ok(self.store.flush()?)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn select(&mut self, node_id: &NodeId) -> Result<()> {
        if !self.spec()?.contains(node_id) {
            return Err(Error::NodeNotFound(node_id.clone()));
        }
        self.selected = Some(node_id.clone());
        Ok(())
    }

    /// Root-to-selection id path (breadcrumbs).
    pub fn selected_path(&self) -> Result<Vec<NodeId>> {
        let spec = self.spec()?;
        let selected = self.selected.as_ref().ok_or(Error::NothingSelected)?;
        find_path(spec, selected).ok_or_else(|| Error::Detached(selected.clone()))
    }

    /// Nearest slot host at or above the selection: the selection itself
    /// when it hosts a slot, otherwise the host owning its parent grid.
    pub fn selected_slot_host(&self) -> Result<NodeId> {
        let spec = self.spec()?;
        let selected = self.selected.as_ref().ok_or(Error::NothingSelected)?;
        let node = spec
            .node(selected)
            .ok_or_else(|| Error::NodeNotFound(selected.clone()))?;
        if node.as_container().is_some_and(|c| c.is_slot_host()) {
            return Ok(selected.clone());
        }
        match find_parent_ref(spec, selected) {
            Some(ParentRef::Slot { host_id }) => Ok(host_id),
            Some(ParentRef::GridItem { grid_id, .. }) => find_host_by_grid_id(spec, &grid_id)
                .map(|host| host.id.clone())
                .ok_or(Error::Detached(grid_id)),
            None => Err(Error::Detached(selected.clone())),
        }
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Insert a new block into a slot host and select it.
    ///
    /// | Slot | `Append` | `Replace` |
    /// |------|----------|-----------|
    /// | empty | becomes `single` | becomes `single` |
    /// | single | upgraded to a grid | old child swapped out and deleted |
    /// | grid | new auto-placed item | first item's child swapped out and deleted |
    pub fn add_to_slot(&mut self, host_id: &NodeId, pick: BlockPick, mode: AddMode) -> Result<NodeId> {
        let slot = self.slot_of(host_id)?;
        let grid_config = self.config.grid;
        let spec = self.spec_mut()?;
        let new_id = create_block(spec, &pick, grid_config)?;

        let displaced = match (slot, mode) {
            (SlotContent::Empty, _) => {
                spec.set_slot_single(host_id, &new_id)?;
                None
            }
            (SlotContent::Single { .. }, AddMode::Replace) => {
                Some(spec.replace_single_child(host_id, &new_id)?)
            }
            (SlotContent::Single { .. }, AddMode::Append) => {
                let _ = spec.upgrade_slot_to_grid_with(host_id, &new_id, None, grid_config)?;
                None
            }
            (SlotContent::Grid { grid_id }, mode) => {
                let first = spec
                    .node(&grid_id)
                    .and_then(Node::as_container)
                    .and_then(|grid| {
                        sorted_grid_items(grid.grid_items())
                            .first()
                            .map(|item| (item.item_id.clone(), item.child_id.clone()))
                    });
                match (mode, first) {
                    (AddMode::Replace, Some((item_id, old_child))) => {
                        let _ = spec.replace_grid_item_child(&grid_id, &item_id, &new_id)?;
                        Some(old_child)
                    }
                    _ => {
                        let _ = spec.add_grid_item(&grid_id, &new_id, Placement::default())?;
                        None
                    }
                }
            }
        };
        if let Some(old) = displaced {
            let _ = spec.delete_node_cascade(&old)?;
        }

        tracing::debug!(host_id = %host_id, node_id = %new_id, ?mode, "block added");
        self.selected = Some(new_id.clone());
        let _ = self.persist();
        Ok(new_id)
    }

    /// Swap the selected node for a new block at the same position. The old
    /// subtree is deleted and the new node becomes the selection.
    pub fn replace_selected(&mut self, pick: BlockPick) -> Result<NodeId> {
        let selected = self.selected_non_root()?;
        let grid_config = self.config.grid;
        let spec = self.spec_mut()?;
        let parent =
            find_parent_ref(spec, &selected).ok_or_else(|| Error::Detached(selected.clone()))?;
        let new_id = create_block(spec, &pick, grid_config)?;
        match &parent {
            ParentRef::Slot { host_id } => spec.set_slot_single(host_id, &new_id)?,
            ParentRef::GridItem { grid_id, item_id } => {
                let _ = spec.replace_grid_item_child(grid_id, item_id, &new_id)?;
            }
        }
        let _ = spec.delete_node_cascade(&selected)?;

        tracing::debug!(old = %selected, node_id = %new_id, "selection replaced");
        self.selected = Some(new_id.clone());
        let _ = self.persist();
        Ok(new_id)
    }

    /// Delete the selected subtree and select the root. A grid left with a
    /// single item collapses when auto-downgrade is on.
    pub fn remove_selected(&mut self) -> Result<bool> {
        let selected = self.selected_non_root()?;
        let spec = self.spec_mut()?;
        let parent = find_parent_ref(spec, &selected);
        let removed = spec.delete_node_cascade(&selected)?;
        if let Some(ParentRef::GridItem { grid_id, .. }) = parent {
            self.auto_downgrade(&grid_id)?;
        }
        let root = self.spec()?.root_id.clone();
        self.selected = Some(root);
        if removed {
            let _ = self.persist();
        }
        Ok(removed)
    }

    /// Remove one grid item and the subtree it held.
    pub fn remove_grid_item(&mut self, grid_id: &NodeId, item_id: &GridItemId) -> Result<bool> {
        let spec = self.spec_mut()?;
        if !spec.remove_grid_item(grid_id, item_id)? {
            return Ok(false);
        }
        let swept = spec.cleanup_orphans()?;
        tracing::debug!(grid_id = %grid_id, item_id = %item_id, swept, "grid item removed");
        self.auto_downgrade(grid_id)?;
        if let Some(selected) = self.selected.clone()
            && !self.spec()?.contains(&selected)
        {
            self.selected = Some(self.spec()?.root_id.clone());
        }
        let _ = self.persist();
        Ok(true)
    }

    /// Patch leaf metadata.
    pub fn update_leaf_meta(&mut self, node_id: &NodeId, patch: LeafMetaPatch) -> Result<()> {
        self.spec_mut()?.update_leaf_meta(node_id, patch)?;
        let _ = self.persist();
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        self.spec_mut()?.set_name(name)?;
        let _ = self.persist();
        Ok(())
    }

    fn auto_downgrade(&mut self, grid_id: &NodeId) -> Result<bool> {
        if !self.config.auto_downgrade {
            return Ok(false);
        }
        let spec = self.spec_mut()?;
        let Some(host_id) = find_host_by_grid_id(spec, grid_id).map(|host| host.id.clone()) else {
            return Ok(false);
        };
        let collapsed = spec.downgrade_grid_to_single(&host_id)?;
        if collapsed {
            tracing::debug!(host_id = %host_id, grid_id = %grid_id, "grid collapsed to single");
        }
        Ok(collapsed)
    }

    fn selected_non_root(&self) -> Result<NodeId> {
        let spec = self.spec()?;
        let selected = self.selected.clone().ok_or(Error::NothingSelected)?;
        if selected == spec.root_id {
            return Err(Error::RootLocked);
        }
        if !spec.contains(&selected) {
            return Err(Error::NodeNotFound(selected));
        }
        Ok(selected)
    }

    fn slot_of(&self, host_id: &NodeId) -> Result<SlotContent> {
        let node = self
            .spec()?
            .node(host_id)
            .ok_or_else(|| Error::NodeNotFound(host_id.clone()))?;
        node.as_container()
            .and_then(|container| container.slot.clone())
            .ok_or_else(|| {
                Error::Op(SpecOpError::new(
                    SpecOpKind::AttachToSlot,
                    SpecOpFailure::NotSlotHost {
                        node_id: host_id.clone(),
                    },
                ))
            })
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Compile the current spec with the configured prompt options.
    pub fn compile(&self) -> Result<PromptResult> {
        Ok(build_prompt(self.spec()?, &self.config.prompt))
    }

    pub fn lint(&self) -> Result<Vec<LintIssue>> {
        Ok(lint_spec(self.spec()?))
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("store", &self.store)
            .field("current", &self.current.as_ref().map(|spec| &spec.meta.id))
            .field("selected", &self.selected)
            .finish()
    }
}

/// Create the node for `pick`. New slot hosts start out holding an empty grid.
fn create_block(spec: &mut Spec, pick: &BlockPick, grid: GridConfig) -> Result<NodeId> {
    let id = match pick {
        BlockPick::Leaf {
            leaf_type,
            component_ref,
        } => spec.create_leaf(
            *leaf_type,
            component_ref.as_deref().map(LeafMetaPatch::component),
        )?,
        BlockPick::Container {
            container_type: ContainerType::Grid,
        } => spec.create_grid_container(grid)?,
        BlockPick::Container { container_type } => {
            let id = spec.create_container(*container_type, Props::new())?;
            let _ = spec.ensure_container_grid_with(&id, grid)?;
            id
        }
    };
    Ok(id)
}

#[cfg(feature = "file-storage")]
fn open_backend(config: &EditorConfig) -> Arc<dyn StorageBackend> {
    match &config.store_dir {
        Some(dir) => Arc::new(pagespec_store::FileStorage::new(dir)),
        None => Arc::new(MemoryStorage::new()),
    }
}

#[cfg(not(feature = "file-storage"))]
fn open_backend(config: &EditorConfig) -> Arc<dyn StorageBackend> {
    if let Some(dir) = &config.store_dir {
        tracing::warn!(dir = %dir.display(), "file storage disabled, keeping specs in memory");
    }
    Arc::new(MemoryStorage::new())
}
