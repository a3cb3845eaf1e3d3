//! Plan invalidation
//!
//! Partial invalidation removes the rows holding the target identifiers so
//! the next cycle re-derives them. Full invalidation starts over.

use crate::id::SlotId;
use crate::plan::PlanState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// Invalidation signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "targets", rename_all = "snake_case")]
pub enum Invalidation {
    /// Clear the whole state
    Full,
    /// Remove rows holding any of these identifiers
    Targets(Vec<SlotId>),
}

impl Invalidation {
    /// `None` means full, `Some` means partial (possibly empty)
    #[must_use]
    pub fn from_targets(targets: Option<&[SlotId]>) -> Self {
        targets.map_or(Self::Full, |ids| Self::Targets(ids.to_vec()))
    }

    /// Apply to a state
    #[must_use]
    pub fn apply(&self, state: &PlanState) -> (PlanState, InvalidationReport) {
        match self {
            Self::Full => {
                let report = InvalidationReport {
                    full: true,
                    rows_removed: state.len(),
                    types_removed: state.type_map().len(),
                };
                info!(rows = report.rows_removed, "full invalidation");
                (PlanState::new(), report)
            }
            Self::Targets(targets) => remove_targets(state, targets),
        }
    }
}

/// What an invalidation removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Whole state cleared
    pub full: bool,
    /// Plan rows removed (with their fingerprints)
    pub rows_removed: usize,
    /// Type-map entries removed
    pub types_removed: usize,
}

/// Invalidate a state: `None` clears it, `Some(targets)` removes the rows
/// holding any target
#[must_use]
pub fn invalidate(state: &PlanState, targets: Option<&[SlotId]>) -> PlanState {
    Invalidation::from_targets(targets).apply(state).0
}

fn remove_targets(state: &PlanState, targets: &[SlotId]) -> (PlanState, InvalidationReport) {
    if targets.is_empty() {
        return (state.clone(), InvalidationReport::default());
    }

    let targets: HashSet<&SlotId> = targets.iter().collect();
    let mut plan = Vec::with_capacity(state.len());
    let mut fingerprints = Vec::with_capacity(state.fingerprints().len());
    let mut report = InvalidationReport::default();

    for (index, row) in state.plan().iter().enumerate() {
        if row.ids().any(|id| targets.contains(id)) {
            report.rows_removed += 1;
            continue;
        }
        plan.push(row.clone());
        if let Some(fp) = state.fingerprints().get(index) {
            fingerprints.push(*fp);
        }
    }

    let mut type_map = state.type_map().clone();
    type_map.retain(|id, _| !targets.contains(id));
    report.types_removed = state.type_map().len() - type_map.len();

    info!(
        targets = targets.len(),
        rows_removed = report.rows_removed,
        types_removed = report.types_removed,
        "partial invalidation"
    );

    (PlanState::from_parts(plan, type_map, fingerprints), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RecordId;
    use crate::plan::{PlanRow, SlotTypeMap};
    use uco_artifact::Fingerprint;
    use uco_ontology::SlotName;

    fn state() -> (PlanState, Vec<SlotId>) {
        let mut ids = Vec::new();
        let mut rows = Vec::new();
        let mut types = SlotTypeMap::new();
        let mut fps = Vec::new();
        for seed in ["a", "b", "c"] {
            let fp = Fingerprint::digest(seed.as_bytes());
            let record = RecordId::derive(&fp, 0);
            let mut row = PlanRow::new();
            for slot in ["file", "filefacet"] {
                let id = SlotId::derive(&record, &SlotName::new(slot));
                row.insert(SlotName::new(slot), id);
                types.record(id, "uco-observable:File").unwrap();
                ids.push(id);
            }
            rows.push(row);
            fps.push(fp);
        }
        (PlanState::from_parts(rows, types, fps), ids)
    }

    #[test]
    fn full_clears_everything() {
        let (state, _) = state();
        let (cleared, report) = Invalidation::Full.apply(&state);
        assert!(cleared.is_empty());
        assert!(report.full);
        assert_eq!(report.rows_removed, 3);
        assert_eq!(report.types_removed, 6);
        assert!(invalidate(&state, None).is_empty());
    }

    #[test]
    fn partial_removes_only_target_rows() {
        let (state, ids) = state();
        // facet of the middle row
        let target = ids[3];
        let (next, report) = Invalidation::Targets(vec![target]).apply(&state);

        assert_eq!(report.rows_removed, 1);
        assert_eq!(report.types_removed, 1);
        assert_eq!(next.len(), 2);
        assert!(next.is_aligned());
        assert_eq!(next.plan()[0], state.plan()[0]);
        assert_eq!(next.plan()[1], state.plan()[2]);
        assert_eq!(next.fingerprints(), &[state.fingerprints()[0], state.fingerprints()[2]]);
        assert!(!next.type_map().contains(&target));
        // the other slot of the removed row stays typed
        assert!(next.type_map().contains(&ids[2]));
    }

    #[test]
    fn empty_targets_is_noop() {
        let (state, _) = state();
        assert_eq!(invalidate(&state, Some(&[])), state);
    }

    #[test]
    fn unknown_targets_change_nothing() {
        let (state, _) = state();
        let stranger = SlotId::derive(&RecordId::derive(&Fingerprint::digest(b"zzz"), 0), &SlotName::new("file"));
        assert_eq!(invalidate(&state, Some(&[stranger])), state);
    }

    #[test]
    fn invalidation_serde() {
        let json = serde_json::to_value(Invalidation::Full).unwrap();
        assert_eq!(json, serde_json::json!({"scope": "full"}));
        let back: Invalidation = serde_json::from_value(json).unwrap();
        assert_eq!(back, Invalidation::Full);
    }
}
