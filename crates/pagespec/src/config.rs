//! Editor configuration.
//!
//! Defaults come from the component crates. Environment overrides:
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `PAGESPEC_GRID_COLS` | `grid.col_num` | integer > 0 |
//! | `PAGESPEC_GRID_ROW_HEIGHT` | `grid.row_height` | integer > 0 |
//! | `PAGESPEC_SAVE_DEBOUNCE_MS` | `store.save_delay` | milliseconds |
//! | `PAGESPEC_STORE_DIR` | `store_dir` | path |
//! | `PAGESPEC_PROMPT_MODE` | `prompt.mode` | `short`, `long` or `batch` |
//! | `PAGESPEC_INCLUDE_GEOMETRY` | `prompt.include_geometry` | bool |
//! | `PAGESPEC_AUTO_DOWNGRADE` | `auto_downgrade` | bool |

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use pagespec_core::GridConfig;
use pagespec_prompt::{PromptMode, PromptOptions};
use pagespec_store::StoreConfig;

const ENV_GRID_COLS: &str = "PAGESPEC_GRID_COLS";
const ENV_GRID_ROW_HEIGHT: &str = "PAGESPEC_GRID_ROW_HEIGHT";
const ENV_SAVE_DEBOUNCE_MS: &str = "PAGESPEC_SAVE_DEBOUNCE_MS";
const ENV_STORE_DIR: &str = "PAGESPEC_STORE_DIR";
const ENV_PROMPT_MODE: &str = "PAGESPEC_PROMPT_MODE";
const ENV_INCLUDE_GEOMETRY: &str = "PAGESPEC_INCLUDE_GEOMETRY";
const ENV_AUTO_DOWNGRADE: &str = "PAGESPEC_AUTO_DOWNGRADE";

/// Upper bound for grid columns.
pub const MAX_GRID_COLUMNS: u32 = 48;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Geometry for grids the session creates.
    pub grid: GridConfig,
    pub store: StoreConfig,
    /// Directory for file storage. `None` keeps specs in memory.
    pub store_dir: Option<PathBuf>,
    pub prompt: PromptOptions,
    /// Collapse a grid back to a single slot when one item remains.
    pub auto_downgrade: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            store: StoreConfig::default(),
            store_dir: None,
            prompt: PromptOptions::default(),
            auto_downgrade: true,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct EditorConfigParse {
    pub config: EditorConfig,
    pub errors: Vec<EditorConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl EditorConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EditorConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for EditorConfigError {}

impl EditorConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> EditorConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> EditorConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<EditorConfigError>> {
        let mut errors = Vec::new();
        if self.grid.col_num == 0 || self.grid.col_num > MAX_GRID_COLUMNS {
            errors.push(EditorConfigError::new(
                "grid_cols",
                self.grid.col_num.to_string(),
                format!("expected 1..={MAX_GRID_COLUMNS}"),
            ));
        }
        if self.grid.row_height == 0 {
            errors.push(EditorConfigError::new(
                "grid_row_height",
                "0",
                "must be greater than 0",
            ));
        }
        if self.store.namespace.trim().is_empty() {
            errors.push(EditorConfigError::new(
                "store_namespace",
                self.store.namespace.clone(),
                "must not be empty",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn from_env_with<F>(mut get: F) -> EditorConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = EditorConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_GRID_COLS) {
        match parse_u32(&value) {
            Some(parsed) => config.grid.col_num = parsed,
            None => errors.push(EditorConfigError::new(
                "grid_cols",
                value,
                "expected unsigned integer",
            )),
        }
    }

    if let Some(value) = get(ENV_GRID_ROW_HEIGHT) {
        match parse_u32(&value) {
            Some(parsed) => config.grid.row_height = parsed,
            None => errors.push(EditorConfigError::new(
                "grid_row_height",
                value,
                "expected unsigned integer",
            )),
        }
    }

    if let Some(value) = get(ENV_SAVE_DEBOUNCE_MS) {
        match value.trim().parse::<u64>() {
            Ok(ms) => config.store.save_delay = Duration::from_millis(ms),
            Err(_) => errors.push(EditorConfigError::new(
                "save_debounce_ms",
                value,
                "expected milliseconds",
            )),
        }
    }

    if let Some(value) = get(ENV_STORE_DIR) {
        let trimmed = value.trim();
        config.store_dir = if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        };
    }

    if let Some(value) = get(ENV_PROMPT_MODE) {
        match PromptMode::parse(&value) {
            Some(parsed) => config.prompt.mode = parsed,
            None => errors.push(EditorConfigError::new(
                "prompt_mode",
                value,
                "expected short|long|batch",
            )),
        }
    }

    if let Some(value) = get(ENV_INCLUDE_GEOMETRY) {
        match parse_bool(&value) {
            Some(parsed) => config.prompt.include_geometry = parsed,
            None => errors.push(EditorConfigError::new(
                "include_geometry",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Some(value) = get(ENV_AUTO_DOWNGRADE) {
        match parse_bool(&value) {
            Some(parsed) => config.auto_downgrade = parsed,
            None => errors.push(EditorConfigError::new(
                "auto_downgrade",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Err(mut validation) = config.validate() {
        errors.append(&mut validation);
    }

    EditorConfigParse { config, errors }
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}
