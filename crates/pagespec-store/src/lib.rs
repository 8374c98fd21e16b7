#![forbid(unsafe_code)]

//! Persistence for page specs.
//!
//! - [`codec`]: JSON export, and import behind a version gate with id remap.
//! - [`storage`]: the key-value [`StorageBackend`] seam and its backends.
//! - [`debounce`]: latest-wins write coalescing keyed by spec id.
//! - [`store`]: [`SpecStore`], the history list and per-spec entries.

pub mod codec;
pub mod debounce;
pub mod storage;
pub mod store;

pub use codec::{ImportError, decode_spec, export_json, import_json, migrate};
pub use debounce::{DEFAULT_SAVE_DELAY, DebounceStats, ScheduleOutcome, WriteDebouncer};
#[cfg(feature = "file-storage")]
pub use storage::FileStorage;
pub use storage::{MemoryStorage, StorageBackend, StorageError, StorageResult};
pub use store::{DEFAULT_NAMESPACE, SpecStore, SpecSummary, StoreConfig};
