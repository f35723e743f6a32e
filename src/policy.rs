//! Policy evaluation.
//!
//! The evaluator is a pure function over a compiled config section and a push
//! classification. It never touches the process: the CLI layer decides what a
//! failed verdict means for the exit status.
//!
//! Evaluation order is fixed: forbidden state flags first, then the ref-name
//! rules (exact, forbidden patterns, required patterns), each in config order.
//! All messages are collected; a violation never short-circuits the rest, so
//! the user sees the complete picture in one run.

use crate::classify::PushClassification;
use crate::config::{CompiledPolicy, CompiledSection};

/// The outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// True iff no rule produced a message.
    pub passed: bool,
    /// Violation messages, in evaluation order.
    pub violations: Vec<String>,
}

/// The config section applicable to this push. A kind with no configured
/// rules yields an empty section, never an error.
pub fn select_section<'a>(
    policy: &'a CompiledPolicy,
    push: &PushClassification,
) -> &'a CompiledSection {
    policy.section(push.ref_kind)
}

/// Check the push against one section's rules.
pub fn verify(section: &CompiledSection, push: &PushClassification) -> Verdict {
    let mut violations = Vec::new();

    for (state, message) in &section.forbidden {
        if push.is(*state) {
            violations.push(message.clone());
        }
    }

    if let Some(message) = section.name_forbidden.get(&push.ref_name) {
        violations.push(message.clone());
    }
    for (pattern, message) in &section.forbidden_patterns {
        if pattern.is_match(&push.ref_name) {
            violations.push(message.clone());
        }
    }
    for (pattern, message) in &section.required_patterns {
        if !pattern.is_match(&push.ref_name) {
            violations.push(message.clone());
        }
    }

    Verdict {
        passed: violations.is_empty(),
        violations,
    }
}

/// Informational messages to print once the push has been accepted.
pub fn notify(section: &CompiledSection, push: &PushClassification) -> Vec<String> {
    section
        .after_push
        .iter()
        .filter(|(state, _)| push.is(*state))
        .map(|(_, message)| message.clone())
        .collect()
}
