//! Facade error type.

use std::fmt;

use pagespec_core::{NodeId, SpecId, SpecOpError};
use pagespec_store::{ImportError, StorageError};

/// Any failure surfaced by [`EditorSession`](crate::EditorSession).
#[derive(Debug)]
pub enum Error {
    /// A structural operation was rejected.
    Op(SpecOpError),
    Import(ImportError),
    Storage(StorageError),
    Export(serde_json::Error),
    /// No stored spec with this id.
    SpecNotFound(SpecId),
    /// The current spec has no node with this id.
    NodeNotFound(NodeId),
    /// The node exists but is not reachable from the root.
    Detached(NodeId),
    /// The operation needs an open spec.
    NoCurrentSpec,
    /// The operation needs a selected node.
    NothingSelected,
    /// The root node cannot be replaced or removed.
    RootLocked,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(err) => write!(f, "{err}"),
            Self::Import(err) => write!(f, "import failed: {err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Export(err) => write!(f, "export failed: {err}"),
            Self::SpecNotFound(id) => write!(f, "spec {id} not found"),
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::Detached(id) => write!(f, "node {id} is not attached to the page"),
            Self::NoCurrentSpec => write!(f, "no spec is open"),
            Self::NothingSelected => write!(f, "no node is selected"),
            Self::RootLocked => write!(f, "the root node cannot be replaced or removed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Op(err) => Some(err),
            Self::Import(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Export(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SpecOpError> for Error {
    fn from(err: SpecOpError) -> Self {
        Self::Op(err)
    }
}

impl From<ImportError> for Error {
    fn from(err: ImportError) -> Self {
        Self::Import(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Export(err)
    }
}
