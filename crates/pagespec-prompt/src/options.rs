use std::fmt;

use serde::{Deserialize, Serialize};

/// How much the Deliverables section asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Skeleton, components and wiring only.
    Short,
    /// Adds mock data and a self-check pass.
    #[default]
    Long,
    /// `Long` plus single-response packaging.
    Batch,
}

impl PromptMode {
    pub const ALL: [Self; 3] = [Self::Short, Self::Long, Self::Batch];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
            Self::Batch => "batch",
        }
    }

    /// Parse a mode name, ignoring ASCII case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    pub mode: PromptMode,
    /// Append ` geom=(x,y,w,h)` to DSL lines of grid-placed nodes.
    #[serde(default)]
    pub include_geometry: bool,
    /// Project constraints appended to the Hard Rules section.
    #[serde(default)]
    pub custom_rules: Vec<String>,
}

impl PromptOptions {
    #[must_use]
    pub fn new(mode: PromptMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_geometry(mut self, include: bool) -> Self {
        self.include_geometry = include;
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.custom_rules.push(rule.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_is_case_insensitive() {
        assert_eq!(PromptMode::parse(" Batch "), Some(PromptMode::Batch));
        assert_eq!(PromptMode::parse("SHORT"), Some(PromptMode::Short));
        assert_eq!(PromptMode::parse("medium"), None);
    }

    #[test]
    fn defaults_match_editor_settings() {
        let options = PromptOptions::default();
        assert_eq!(options.mode, PromptMode::Long);
        assert!(!options.include_geometry);
        assert!(options.custom_rules.is_empty());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: PromptOptions =
            serde_json::from_str(r#"{"mode":"short"}"#).expect("parse");
        assert_eq!(options, PromptOptions::new(PromptMode::Short));
    }
}
