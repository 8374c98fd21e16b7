//! Spec store over a key-value backend.
//!
//! Layout inside the backend (`<ns>` defaults to `pagespec`):
//!
//! | Key | Value |
//! |-----|-------|
//! | `<ns>.index` | JSON array of [`SpecSummary`] (the history list) |
//! | `<ns>.spec.<spec id>` | JSON of one [`Spec`] |
//!
//! Saves go through a [`WriteDebouncer`]; the owner drives it with
//! [`SpecStore::tick`] and forces it with [`SpecStore::flush`]. Reads only
//! see what has reached the backend.
//!
//! A missing or corrupt index is rebuilt from the spec entries. Entries that
//! fail to decode are skipped with a warning, never surfaced as errors.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use pagespec_core::{Spec, SpecId};

use crate::codec::{decode_spec, export_json};
use crate::debounce::{DEFAULT_SAVE_DELAY, ScheduleOutcome, WriteDebouncer};
use crate::storage::{StorageBackend, StorageResult};

/// Default key namespace.
pub const DEFAULT_NAMESPACE: &str = "pagespec";

/// History-list entry for one stored spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecSummary {
    pub id: SpecId,
    pub name: String,
    pub updated_at: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_template: bool,
}

impl SpecSummary {
    #[must_use]
    pub fn of(spec: &Spec) -> Self {
        Self {
            id: spec.meta.id.clone(),
            name: spec.meta.name.clone(),
            updated_at: spec.meta.updated_at,
            tags: spec.meta.tags.clone(),
            is_template: spec.meta.is_template,
        }
    }
}

/// Store tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Debounce window for [`SpecStore::save_spec`].
    pub save_delay: Duration,
    /// Key namespace inside the backend.
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_delay: DEFAULT_SAVE_DELAY,
            namespace: DEFAULT_NAMESPACE.to_owned(),
        }
    }
}

/// Persistent collection of specs with debounced writes.
pub struct SpecStore {
    backend: Arc<dyn StorageBackend>,
    namespace: String,
    pending: WriteDebouncer<Spec>,
}

impl SpecStore {
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, config: StoreConfig) -> Self {
        Self {
            backend,
            namespace: config.namespace,
            pending: WriteDebouncer::new(config.save_delay),
        }
    }

    /// Store over `backend` with default settings.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self::new(backend, StoreConfig::default())
    }

    #[must_use]
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    fn index_key(&self) -> String {
        format!("{}.index", self.namespace)
    }

    fn spec_prefix(&self) -> String {
        format!("{}.spec.", self.namespace)
    }

    fn spec_key(&self, id: &SpecId) -> String {
        format!("{}{id}", self.spec_prefix())
    }

    /// Queue a snapshot of `spec` for writing.
    pub fn save_spec(&mut self, spec: &Spec) -> ScheduleOutcome {
        self.save_spec_at(spec, Instant::now())
    }

    pub fn save_spec_at(&mut self, spec: &Spec, now: Instant) -> ScheduleOutcome {
        self.pending.schedule_at(spec.meta.id.clone(), spec.clone(), now)
    }

    /// Write whatever is due now.
    pub fn tick(&mut self) -> StorageResult<usize> {
        self.tick_at(Instant::now())
    }

    /// Write every save whose debounce window closed at or before `now`.
    /// Returns the number of specs written.
    pub fn tick_at(&mut self, now: Instant) -> StorageResult<usize> {
        let due = self.pending.tick_at(now);
        self.write_batch(due, now)
    }

    /// Write everything pending immediately.
    pub fn flush(&mut self) -> StorageResult<usize> {
        let due = self.pending.drain();
        self.write_batch(due, Instant::now())
    }

    /// A failed write is re-queued so the next tick retries it.
    fn write_batch(&mut self, due: Vec<(SpecId, Spec)>, now: Instant) -> StorageResult<usize> {
        let mut written = 0;
        let mut first_error = None;
        for (id, spec) in due {
            match self.write_spec(&spec) {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(spec_id = %id, error = %e, "spec write failed, retrying later");
                    let _ = self.pending.schedule_at(id, spec, now);
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    fn write_spec(&self, spec: &Spec) -> StorageResult<()> {
        let text = export_json(spec)?;
        self.backend.put(&self.spec_key(&spec.meta.id), &text)?;
        let mut index = self.read_index()?;
        let summary = SpecSummary::of(spec);
        match index.iter_mut().find(|entry| entry.id == summary.id) {
            Some(entry) => *entry = summary,
            None => index.push(summary),
        }
        self.write_index(&index)?;
        tracing::debug!(
            backend = self.backend.name(),
            spec_id = %spec.meta.id,
            bytes = text.len(),
            "spec saved"
        );
        Ok(())
    }

    fn write_index(&self, index: &[SpecSummary]) -> StorageResult<()> {
        let text = serde_json::to_string(index)?;
        self.backend.put(&self.index_key(), &text)
    }

    fn read_index(&self) -> StorageResult<Vec<SpecSummary>> {
        let Some(raw) = self.backend.get(&self.index_key())? else {
            return self.rebuild_index();
        };
        match serde_json::from_str::<Vec<SpecSummary>>(&raw) {
            Ok(index) => Ok(index),
            Err(e) => {
                tracing::warn!(error = %e, "spec index unreadable, rebuilding from entries");
                self.rebuild_index()
            }
        }
    }

    fn rebuild_index(&self) -> StorageResult<Vec<SpecSummary>> {
        let prefix = self.spec_prefix();
        let mut index = Vec::new();
        for key in self.backend.keys()? {
            let Some(id) = key.strip_prefix(&prefix) else {
                continue;
            };
            if let Some(spec) = self.load_entry(&SpecId::new(id))? {
                index.push(SpecSummary::of(&spec));
            }
        }
        Ok(index)
    }

    fn load_entry(&self, id: &SpecId) -> StorageResult<Option<Spec>> {
        let Some(raw) = self.backend.get(&self.spec_key(id))? else {
            return Ok(None);
        };
        match decode_spec(&raw) {
            Ok(spec) => Ok(Some(spec)),
            Err(e) => {
                tracing::warn!(spec_id = %id, error = %e, "skipping unreadable spec entry");
                Ok(None)
            }
        }
    }

    /// Read a stored spec. Unreadable entries load as `None`.
    pub fn load_spec(&self, id: &SpecId) -> StorageResult<Option<Spec>> {
        self.load_entry(id)
    }

    /// Stored specs, most recently updated first.
    pub fn list_specs(&self) -> StorageResult<Vec<SpecSummary>> {
        let mut index = self.read_index()?;
        index.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(index)
    }

    /// Remove a spec and cancel its pending write. Returns whether anything
    /// was stored or pending.
    pub fn delete_spec(&mut self, id: &SpecId) -> StorageResult<bool> {
        let cancelled = self.pending.cancel(id).is_some();
        let key = self.spec_key(id);
        let stored = self.backend.get(&key)?.is_some();
        self.backend.remove(&key)?;
        let mut index = self.read_index()?;
        let before = index.len();
        index.retain(|entry| &entry.id != id);
        let indexed = index.len() != before;
        if indexed {
            self.write_index(&index)?;
        }
        tracing::debug!(spec_id = %id, stored, cancelled, "spec deleted");
        Ok(stored || cancelled || indexed)
    }

    /// Set the template flag of a stored spec. A pending write for it is
    /// flushed first so the flag lands on the latest state.
    pub fn mark_template(&mut self, id: &SpecId, is_template: bool) -> StorageResult<bool> {
        if let Some(spec) = self.pending.cancel(id) {
            self.write_spec(&spec)?;
        }
        let Some(mut spec) = self.load_entry(id)? else {
            return Ok(false);
        };
        spec.meta.is_template = is_template;
        self.write_spec(&spec)?;
        Ok(true)
    }

    #[must_use]
    pub fn is_pending(&self, id: &SpecId) -> bool {
        self.pending.is_pending(id)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.has_pending()
    }

    /// Time until the next queued save is due.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending.time_until_due(now)
    }
}

impl fmt::Debug for SpecStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecStore")
            .field("backend", &self.backend.name())
            .field("namespace", &self.namespace)
            .field("pending", &self.pending.pending_len())
            .finish()
    }
}

impl Drop for SpecStore {
    fn drop(&mut self) {
        if !self.pending.has_pending() {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "failed to flush pending specs on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store_with(delay_ms: u64) -> (Arc<MemoryStorage>, SpecStore) {
        let backend = Arc::new(MemoryStorage::new());
        let store = SpecStore::new(
            backend.clone(),
            StoreConfig {
                save_delay: Duration::from_millis(delay_ms),
                ..StoreConfig::default()
            },
        );
        (backend, store)
    }

    #[test]
    fn save_is_invisible_until_the_window_closes() {
        let (backend, mut store) = store_with(300);
        let t0 = Instant::now();
        let mut spec = Spec::demo("Orders");
        let _ = store.save_spec_at(&spec, t0);
        spec.meta.name = "Orders v2".into();
        assert_eq!(
            store.save_spec_at(&spec, t0 + Duration::from_millis(100)),
            ScheduleOutcome::Coalesced
        );
        assert_eq!(store.load_spec(&spec.meta.id).expect("load"), None);
        assert_eq!(store.tick_at(t0 + Duration::from_millis(300)).expect("tick"), 0);
        assert_eq!(store.tick_at(t0 + Duration::from_millis(400)).expect("tick"), 1);

        let loaded = store.load_spec(&spec.meta.id).expect("load").expect("stored");
        assert_eq!(loaded.meta.name, "Orders v2");
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn list_is_sorted_by_updated_at_desc() {
        let (_backend, mut store) = store_with(0);
        let mut old = Spec::new_empty("old");
        old.meta.updated_at = 10;
        let mut new = Spec::new_empty("new");
        new.meta.updated_at = 20;
        let _ = store.save_spec(&old);
        let _ = store.save_spec(&new);
        assert_eq!(store.flush().expect("flush"), 2);
        let names: Vec<_> = store
            .list_specs()
            .expect("list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["new", "old"]);
    }

    #[test]
    fn delete_cancels_pending_write() {
        let (backend, mut store) = store_with(1_000);
        let spec = Spec::new_empty("doomed");
        let _ = store.save_spec(&spec);
        assert!(store.delete_spec(&spec.meta.id).expect("delete"));
        assert_eq!(store.flush().expect("flush"), 0);
        assert!(backend.is_empty());
        assert!(!store.delete_spec(&spec.meta.id).expect("delete again"));
    }

    #[test]
    fn mark_template_updates_entry_and_index() {
        let (_backend, mut store) = store_with(1_000);
        let spec = Spec::new_empty("tpl");
        let _ = store.save_spec(&spec);
        assert!(store.mark_template(&spec.meta.id, true).expect("mark"));
        assert!(!store.has_pending());
        let loaded = store.load_spec(&spec.meta.id).expect("load").expect("stored");
        assert!(loaded.meta.is_template);
        assert!(store.list_specs().expect("list")[0].is_template);
        assert!(!store.mark_template(&SpecId::new("spec_none"), true).expect("missing"));
    }

    #[test]
    fn corrupt_entries_are_skipped_and_index_rebuilt() {
        let (backend, mut store) = store_with(0);
        let good = Spec::new_empty("good");
        let _ = store.save_spec(&good);
        let _ = store.flush().expect("flush");

        backend.put("pagespec.spec.spec_bad", "{not json").expect("put");
        backend.put("pagespec.index", "garbage").expect("put");

        let listed = store.list_specs().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, good.meta.id);
        assert_eq!(store.load_spec(&SpecId::new("spec_bad")).expect("load"), None);
    }

    #[test]
    fn drop_flushes_pending() {
        let backend = Arc::new(MemoryStorage::new());
        let spec = Spec::new_empty("late");
        {
            let mut store = SpecStore::with_backend(backend.clone());
            let _ = store.save_spec(&spec);
        }
        let store = SpecStore::with_backend(backend);
        assert!(store.load_spec(&spec.meta.id).expect("load").is_some());
    }
}
