//! Incremental plan builder
//!
//! Compares the current records against the previous cycle's fingerprints.
//! A record whose fingerprint was seen before takes over the previous row
//! verbatim; anything else is regenerated from its fingerprint. Rows come
//! out in input order.

use crate::config::{PlannerConfig, ReusePolicy, TypeMapRetention};
use crate::error::Result;
use crate::id::{RecordId, SlotId};
use crate::plan::{PlanRow, PlanState, TypeConflict};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};
use uco_artifact::{Fingerprint, Record, RecordSet};
use uco_ontology::{OntologyMap, SlotDeriver, SlotSet};

/// What happened to one output row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RowChange {
    /// Copied from the previous plan
    Reused {
        /// Row index in the previous plan
        previous_index: usize,
    },
    /// Derived afresh
    Regenerated {
        /// Root identifier that seeded the row
        record_id: RecordId,
    },
}

impl RowChange {
    /// True for reused rows
    #[inline]
    #[must_use]
    pub fn is_reused(&self) -> bool {
        matches!(self, Self::Reused { .. })
    }
}

/// Summary of one planning cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// One entry per output row, in input order
    pub changes: Vec<RowChange>,
    /// Previous rows nobody took over
    pub dropped: usize,
    /// Slot identifiers derived for regenerated rows
    pub minted: usize,
    /// Type-map entries removed by pruning
    pub pruned: usize,
    /// Regenerated identifiers whose existing type was kept over a new one
    pub type_conflicts: Vec<TypeConflict>,
}

impl PlanReport {
    /// Number of reused rows
    #[must_use]
    pub fn reused(&self) -> usize {
        self.changes.iter().filter(|c| c.is_reused()).count()
    }

    /// Number of regenerated rows
    #[must_use]
    pub fn regenerated(&self) -> usize {
        self.changes.len() - self.reused()
    }

    /// True when every row was reused and nothing was dropped
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.dropped == 0
            && self.pruned == 0
            && self.type_conflicts.is_empty()
            && self.changes.iter().all(RowChange::is_reused)
    }
}

/// Result of a planning cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    /// New state to persist
    pub state: PlanState,
    /// What changed
    pub report: PlanReport,
}

/// Incremental planner bound to one ontology and configuration
#[derive(Debug, Clone)]
pub struct IncrementalPlanner<'a> {
    deriver: SlotDeriver<'a>,
    config: &'a PlannerConfig,
    ontology_fingerprint: Option<Fingerprint>,
}

impl<'a> IncrementalPlanner<'a> {
    /// Create a planner
    #[must_use]
    pub fn new(ontology: &'a OntologyMap, config: &'a PlannerConfig) -> Self {
        let ontology_fingerprint = match config.reuse_policy {
            ReusePolicy::ContentOnly => None,
            ReusePolicy::OntologyAware => Some(ontology.fingerprint()),
        };
        Self {
            deriver: SlotDeriver::new(ontology, &config.aliases)
                .with_type_prefix(config.type_prefix.clone()),
            config,
            ontology_fingerprint,
        }
    }

    /// Fingerprint used for reuse decisions and id seeding
    #[must_use]
    pub fn fingerprint(&self, record: &Record) -> Fingerprint {
        let content = record.fingerprint();
        match &self.ontology_fingerprint {
            Some(ontology) => content.combine(ontology),
            None => content,
        }
    }

    /// Plan one cycle
    ///
    /// Empty input yields an empty state. A previous state whose plan and
    /// fingerprint lists differ in length contributes only its aligned
    /// prefix.
    ///
    /// # Type conflicts
    /// An identifier never changes type. When a regenerated identifier is
    /// already typed differently (an ontology re-cased a class after a
    /// partial invalidation, say) the existing type stays and the conflict
    /// is listed in [`PlanReport::type_conflicts`]. A full invalidation
    /// clears the old types.
    #[must_use]
    pub fn plan(&self, records: &[Record], previous: &PlanState) -> PlanOutcome {
        if records.is_empty() {
            warn!(previous_rows = previous.len(), "no records supplied, returning empty plan");
            return PlanOutcome {
                state: PlanState::new(),
                report: PlanReport {
                    dropped: previous.len(),
                    ..PlanReport::default()
                },
            };
        }

        let fingerprints: Vec<Fingerprint> = records.iter().map(|r| self.fingerprint(r)).collect();
        let aligned = aligned_len(previous);

        let mut lookup = reuse_lookup(&previous.fingerprints()[..aligned]);
        let reuse: Vec<Option<usize>> = fingerprints
            .iter()
            .map(|fp| lookup.get_mut(fp).and_then(VecDeque::pop_front))
            .collect();

        let mut taken: HashSet<SlotId> = reuse
            .iter()
            .flatten()
            .flat_map(|&i| previous.plan()[i].ids().copied())
            .collect();
        let mut next_ordinal: HashMap<Fingerprint, usize> = HashMap::new();
        let mut type_map = previous.type_map().clone();
        let mut rows = Vec::with_capacity(records.len());
        let mut report = PlanReport::default();

        for (index, (record, fp)) in records.iter().zip(&fingerprints).enumerate() {
            if let Some(previous_index) = reuse[index] {
                debug!(index, previous_index, "reusing row");
                rows.push(previous.plan()[previous_index].clone());
                report.changes.push(RowChange::Reused { previous_index });
                continue;
            }

            let slots = self.deriver.derive(record);
            let ordinal = next_ordinal.entry(*fp).or_insert(0);
            let (record_id, row) = loop {
                let record_id = RecordId::derive(fp, *ordinal);
                *ordinal += 1;
                let row = slot_row(&record_id, &slots);
                if row.ids().all(|id| !taken.contains(id)) {
                    break (record_id, row);
                }
                debug!(index, fingerprint = %fp.short(), "duplicate content, advancing ordinal");
            };

            for (requirement, id) in slots.iter().zip(row.ids()) {
                if let Err(conflict) = type_map.record(*id, requirement.type_name()) {
                    warn!(index, %conflict, "keeping existing type");
                    report.type_conflicts.push(conflict);
                }
            }
            debug!(index, %record_id, slots = row.len(), "regenerated row");

            taken.extend(row.ids().copied());
            report.minted += row.len();
            report.changes.push(RowChange::Regenerated { record_id });
            rows.push(row);
        }

        report.dropped = aligned - report.reused();

        let mut state = PlanState::from_parts(rows, type_map, fingerprints);
        if self.config.retention == TypeMapRetention::PruneUnreferenced {
            report.pruned = prune_unreferenced(&mut state);
        }

        info!(
            records = records.len(),
            reused = report.reused(),
            regenerated = report.regenerated(),
            dropped = report.dropped,
            pruned = report.pruned,
            type_conflicts = report.type_conflicts.len(),
            "plan built"
        );

        PlanOutcome { state, report }
    }

    /// Plan from any serializable record collection
    ///
    /// Accepts the same shapes as [`RecordSet::from_value`].
    ///
    /// # Errors
    /// Returns error if the input is not a record collection
    pub fn plan_serializable<T>(&self, records: &T, previous: &PlanState) -> Result<PlanOutcome>
    where
        T: Serialize + ?Sized,
    {
        let set = RecordSet::from_serializable(records)?;
        Ok(self.plan(set.records(), previous))
    }
}

/// Plan with the default configuration and return only the new state
#[must_use]
pub fn plan(records: &[Record], ontology: &OntologyMap, previous: &PlanState) -> PlanState {
    let config = PlannerConfig::default();
    IncrementalPlanner::new(ontology, &config).plan(records, previous).state
}

/// Drop type-map entries the plan no longer references; returns how many
pub fn prune_unreferenced(state: &mut PlanState) -> usize {
    let live = state.live_ids();
    let (plan, mut type_map, fingerprints) = std::mem::take(state).into_parts();
    let before = type_map.len();
    type_map.retain(|id, _| live.contains(id));
    let pruned = before - type_map.len();
    *state = PlanState::from_parts(plan, type_map, fingerprints);
    pruned
}

fn slot_row(record_id: &RecordId, slots: &SlotSet) -> PlanRow {
    slots
        .names()
        .map(|name| (name.clone(), SlotId::derive(record_id, name)))
        .collect()
}

fn aligned_len(previous: &PlanState) -> usize {
    if !previous.is_aligned() {
        warn!(
            rows = previous.plan().len(),
            fingerprints = previous.fingerprints().len(),
            "previous plan and fingerprints differ in length, using aligned prefix"
        );
    }
    previous.plan().len().min(previous.fingerprints().len())
}

fn reuse_lookup(fingerprints: &[Fingerprint]) -> HashMap<Fingerprint, VecDeque<usize>> {
    let mut lookup: HashMap<Fingerprint, VecDeque<usize>> = HashMap::new();
    for (index, fp) in fingerprints.iter().enumerate() {
        lookup.entry(*fp).or_default().push_back(index);
    }
    lookup
}
