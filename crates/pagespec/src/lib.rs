#![forbid(unsafe_code)]

//! Low-code page spec editor.
//!
//! The facade ties the component crates together:
//!
//! - [`pagespec_core`]: the node model and structural operations.
//! - [`pagespec_store`]: JSON import/export and debounced persistence.
//! - [`pagespec_prompt`]: the prompt compiler and lint.
//!
//! [`EditorSession`] is the entry point for interactive editing. It is
//! configured through [`EditorConfig`], usually read with
//! [`EditorConfig::from_env`], and reports failures as [`Error`].
//!
//! ```ignore
//! use pagespec::{AddMode, BlockPick, EditorConfig, EditorSession, LeafType};
//!
//! pagespec::logging::init()?;
//! let mut session = EditorSession::new(EditorConfig::from_env());
//! session.new_spec("Orders");
//! let root = session.current().unwrap().root_id.clone();
//! session.add_to_slot(&root, BlockPick::component(LeafType::Table, "JrTable"), AddMode::Append)?;
//! println!("{}", session.compile()?.raw_text);
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::{EditorConfig, EditorConfigError, EditorConfigParse};
pub use error::{Error, Result};
pub use session::{AddMode, BlockPick, EditorSession};

pub use pagespec_core::{ContainerType, LeafMetaPatch, LeafType, NodeId, Spec, SpecId};
pub use pagespec_prompt::{LintIssue, PromptMode, PromptOptions, PromptResult};
pub use pagespec_store::{SpecSummary, StorageBackend};
