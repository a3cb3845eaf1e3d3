//! Feedback routing
//!
//! Reviewer feedback about a generated graph either concerns node identity
//! (ids, references) or content. Identity feedback turns into an
//! invalidation signal for the next planning cycle.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uco_planner::{Invalidation, SlotId, SlotTypeMap};

/// Case-insensitive markers of identity-related feedback
pub const IDENTITY_KEYWORDS: [&str; 4] = ["@id", "uuid", "identifier", "reference"];

static UUID_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
        .expect("uuid token regex")
});

/// Feedback category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Nothing to act on
    Clean,
    /// Content issues only; identifiers stay
    Content,
    /// Identifier or reference issues
    IdentityRelated,
}

/// Classify free-text feedback
#[must_use]
pub fn classify_feedback(text: &str) -> FeedbackKind {
    if text.trim().is_empty() {
        return FeedbackKind::Clean;
    }
    let lowered = text.to_lowercase();
    if IDENTITY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        FeedbackKind::IdentityRelated
    } else {
        FeedbackKind::Content
    }
}

/// Planned identifiers mentioned in the text, first mention first
#[must_use]
pub fn extract_identifier_targets(text: &str, known: &SlotTypeMap) -> Vec<SlotId> {
    let mut seen = HashSet::new();
    UUID_TOKEN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<SlotId>().ok())
        .filter(|id| known.contains(id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Invalidation implied by feedback, if any
///
/// Identity feedback naming known identifiers invalidates their rows;
/// identity feedback naming none invalidates everything.
#[must_use]
pub fn invalidation_for_feedback(text: &str, known: &SlotTypeMap) -> Option<Invalidation> {
    match classify_feedback(text) {
        FeedbackKind::Clean | FeedbackKind::Content => None,
        FeedbackKind::IdentityRelated => {
            let targets = extract_identifier_targets(text, known);
            if targets.is_empty() {
                tracing::info!("identity feedback without known identifiers, requesting full invalidation");
                Some(Invalidation::Full)
            } else {
                tracing::info!(targets = targets.len(), "identity feedback, requesting partial invalidation");
                Some(Invalidation::Targets(targets))
            }
        }
    }
}
