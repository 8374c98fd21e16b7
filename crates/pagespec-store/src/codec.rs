//! JSON import/export.
//!
//! Export is the pretty-printed serde shape of [`Spec`]. Import is stricter:
//!
//! 1. parse the text,
//! 2. gate on the schema version ([`migrate`]),
//! 3. decode into a [`Spec`],
//! 4. remap every node and grid item id, assign a new spec id and timestamp,
//! 5. validate with [`check_invariants`].
//!
//! Remapping means importing the same text twice yields two id-disjoint
//! specs that can live side by side in one store.

use std::fmt;

use serde_json::Value;

use pagespec_core::{InvariantViolation, SPEC_VERSION, Spec, SpecId, check_invariants, now_millis};

/// Why an import was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The text is not JSON.
    Parse(String),
    /// The payload declares a schema version this build cannot read.
    UnsupportedVersion { found: Option<Value> },
    /// The payload is JSON but not a spec.
    Malformed(String),
    /// The decoded spec fails structural validation.
    Invalid(Vec<InvariantViolation>),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(msg) => write!(f, "invalid JSON: {msg}"),
            ImportError::UnsupportedVersion { found: Some(found) } => {
                write!(f, "unsupported spec version {found}, expected {SPEC_VERSION}")
            }
            ImportError::UnsupportedVersion { found: None } => {
                write!(f, "spec version missing, expected {SPEC_VERSION}")
            }
            ImportError::Malformed(msg) => write!(f, "invalid spec payload: {msg}"),
            ImportError::Invalid(violations) => {
                write!(f, "import spec invariant failed")?;
                for violation in violations {
                    write!(f, "\n  {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ImportError {}

/// Serialize a spec as pretty-printed JSON.
pub fn export_json(spec: &Spec) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(spec)
}

/// Bring a raw payload up to the current schema version.
///
/// Version 1 is current and passes through; there are no older versions to
/// upgrade from, so every other value is rejected.
pub fn migrate(raw: Value) -> Result<Value, ImportError> {
    let Value::Object(map) = &raw else {
        return Err(ImportError::Malformed("payload is not an object".into()));
    };
    match map.get("version") {
        Some(version) if version.as_u64() == Some(u64::from(SPEC_VERSION)) => Ok(raw),
        found => Err(ImportError::UnsupportedVersion {
            found: found.cloned(),
        }),
    }
}

/// Decode a stored spec without remapping ids.
///
/// Used for the store's own entries, which already carry stable ids.
pub fn decode_spec(raw: &str) -> Result<Spec, ImportError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ImportError::Parse(e.to_string()))?;
    let value = migrate(value)?;
    serde_json::from_value(value).map_err(|e| ImportError::Malformed(e.to_string()))
}

/// Import a spec from JSON text under fresh ids.
pub fn import_json(raw: &str) -> Result<Spec, ImportError> {
    let decoded = decode_spec(raw)?;
    let mut spec = decoded.with_fresh_ids();
    spec.version = SPEC_VERSION;
    spec.meta.id = SpecId::fresh();
    spec.meta.updated_at = now_millis();

    let violations = check_invariants(&spec);
    if !violations.is_empty() {
        tracing::warn!(
            violations = violations.len(),
            first = %violations[0],
            "rejected spec import"
        );
        return Err(ImportError::Invalid(violations));
    }
    tracing::debug!(
        spec_id = %spec.meta.id,
        nodes = spec.nodes.len(),
        "spec imported"
    );
    Ok(spec)
}
