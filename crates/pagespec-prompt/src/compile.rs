use pagespec_core::Spec;

use crate::dsl::{build_dsl, dsl_lines};
use crate::options::PromptOptions;
use crate::sections::{checklist, deliverables, hard_rules, leaf_details};

/// Section titles in output order.
pub const SECTION_TITLES: [&str; 5] = [
    "Deliverables",
    "Hard Rules",
    "DSL",
    "Leaf Details",
    "Checklist",
];

/// Section bodies, one line per entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptSections {
    pub deliverables: Vec<String>,
    pub hard_rules: Vec<String>,
    pub dsl: Vec<String>,
    pub leaf_details: Vec<String>,
    pub checklist: Vec<String>,
}

impl PromptSections {
    /// `(title, lines)` pairs in output order.
    #[must_use]
    pub fn ordered(&self) -> [(&'static str, &[String]); 5] {
        [
            (SECTION_TITLES[0], self.deliverables.as_slice()),
            (SECTION_TITLES[1], self.hard_rules.as_slice()),
            (SECTION_TITLES[2], self.dsl.as_slice()),
            (SECTION_TITLES[3], self.leaf_details.as_slice()),
            (SECTION_TITLES[4], self.checklist.as_slice()),
        ]
    }

    /// Render as `## <Title>` blocks separated by blank lines.
    #[must_use]
    pub fn render(&self) -> String {
        self.ordered()
            .iter()
            .map(|(title, lines)| format_section(title, lines))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// `## <title>` followed by the body lines.
#[must_use]
pub fn format_section(title: &str, lines: &[String]) -> String {
    let mut out = format!("## {title}");
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}

/// Compiled prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptResult {
    pub sections: PromptSections,
    pub raw_text: String,
    /// Rough LLM token count of `raw_text`.
    pub token_estimate: usize,
}

fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{3000}'..='\u{303F}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF00}'..='\u{FFEF}'
    )
}

/// One and a half tokens per CJK character plus one per four other
/// characters, rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    let (cjk, other) = text.chars().fold((0usize, 0usize), |(cjk, other), c| {
        if is_cjk(c) {
            (cjk + 1, other)
        } else {
            (cjk, other + 1)
        }
    });
    (cjk * 6 + other).div_ceil(4)
}

/// Compile a spec into the five-section prompt. Pure and deterministic.
#[must_use]
pub fn build_prompt(spec: &Spec, options: &PromptOptions) -> PromptResult {
    let entries = build_dsl(spec, options.include_geometry);
    let sections = PromptSections {
        deliverables: deliverables(spec, options.mode),
        hard_rules: hard_rules(options),
        dsl: dsl_lines(&entries),
        leaf_details: leaf_details(&entries),
        checklist: checklist(&entries),
    };
    let raw_text = sections.render();
    let token_estimate = estimate_tokens(&raw_text);
    tracing::debug!(
        spec_id = %spec.meta.id,
        mode = options.mode.as_str(),
        regions = entries.len(),
        bytes = raw_text.len(),
        token_estimate,
        "prompt compiled"
    );
    PromptResult {
        sections,
        raw_text,
        token_estimate,
    }
}
