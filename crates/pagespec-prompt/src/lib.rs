#![forbid(unsafe_code)]

//! Prompt compiler and lint for page specs.
//!
//! [`build_prompt`] turns a [`Spec`](pagespec_core::Spec) into five text
//! sections, always in this order:
//!
//! 1. **Deliverables**: what to hand back, scaled by [`PromptMode`].
//! 2. **Hard Rules**: fixed constraints plus project rules.
//! 3. **DSL**: the region-coded tree walk ([`dsl`]).
//! 4. **Leaf Details**: component bindings, field lists, expanded recipes.
//! 5. **Checklist**: acceptance items per leaf and recipe.
//!
//! Output depends only on the spec and the options, so compiling the same
//! snapshot twice yields identical text. [`lint_spec`] is an independent,
//! read-only pass producing advisory findings.

pub mod compile;
pub mod dsl;
pub mod lint;
pub mod options;
pub mod recipes;
pub mod sections;

pub use compile::{
    PromptResult, PromptSections, SECTION_TITLES, build_prompt, estimate_tokens, format_section,
};
pub use dsl::{DslEntry, ROOT_CODE, build_dsl, describe_node, region_code};
pub use lint::{LintCode, LintIssue, LintLevel, has_errors, lint_spec};
pub use options::{PromptMode, PromptOptions};
pub use recipes::{AppliedRecipe, RECIPES, RecipeTemplate, apply_recipe, find_recipe};
