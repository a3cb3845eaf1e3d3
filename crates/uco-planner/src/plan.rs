//! Plan data model
//!
//! [`PlanRow`], [`SlotTypeMap`] and [`PlanState`]: the persisted planning
//! state carried between cycles. Everything here is plain JSON on the wire.

use crate::id::SlotId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uco_artifact::Fingerprint;
use uco_ontology::SlotName;

/// Slot name → identifier for one record
///
/// Keys keep derivation order: class slots, then facets, then
/// relationships. There is no way to store a placeholder identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanRow(IndexMap<SlotName, SlotId>);

impl PlanRow {
    /// Empty row
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a slot; returns the previous identifier for that slot, if any
    pub fn insert(&mut self, slot: SlotName, id: SlotId) -> Option<SlotId> {
        self.0.insert(slot, id)
    }

    /// Identifier planned for a slot
    #[inline]
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&SlotId> {
        self.0.get(slot)
    }

    /// True if any slot of this row carries `id`
    #[must_use]
    pub fn contains_id(&self, id: &SlotId) -> bool {
        self.0.values().any(|v| v == id)
    }

    /// Slot owning `id`
    #[must_use]
    pub fn slot_of(&self, id: &SlotId) -> Option<&SlotName> {
        self.0.iter().find(|(_, v)| *v == id).map(|(k, _)| k)
    }

    /// Slot names in order
    pub fn slots(&self) -> impl Iterator<Item = &SlotName> {
        self.0.keys()
    }

    /// Identifiers in order
    pub fn ids(&self) -> impl Iterator<Item = &SlotId> {
        self.0.values()
    }

    /// `(slot, id)` pairs in order
    pub fn iter(&self) -> indexmap::map::Iter<'_, SlotName, SlotId> {
        self.0.iter()
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the row has no slots
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SlotName, SlotId)> for PlanRow {
    fn from_iter<I: IntoIterator<Item = (SlotName, SlotId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PlanRow {
    type Item = (&'a SlotName, &'a SlotId);
    type IntoIter = indexmap::map::Iter<'a, SlotName, SlotId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Identifier → fully qualified ontology type, accumulated across cycles
///
/// # Invariants
/// - An identifier maps to exactly one type, permanently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotTypeMap(BTreeMap<SlotId, String>);

impl SlotTypeMap {
    /// Empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type of an identifier
    ///
    /// Re-recording the same type is a no-op.
    ///
    /// # Errors
    /// Returns [`TypeConflict`] if the identifier already has a different type
    pub fn record(&mut self, id: SlotId, type_name: &str) -> Result<(), TypeConflict> {
        match self.0.get(&id) {
            Some(existing) if existing != type_name => Err(TypeConflict {
                id,
                existing: existing.clone(),
                requested: type_name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.0.insert(id, type_name.to_string());
                Ok(())
            }
        }
    }

    /// Type of an identifier
    #[inline]
    #[must_use]
    pub fn get(&self, id: &SlotId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// True if the identifier is known
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &SlotId) -> bool {
        self.0.contains_key(id)
    }

    /// Remove an identifier; returns its type
    pub fn remove(&mut self, id: &SlotId) -> Option<String> {
        self.0.remove(id)
    }

    /// Keep only identifiers matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&SlotId, &str) -> bool) {
        self.0.retain(|id, type_name| keep(id, type_name));
    }

    /// Known identifiers in order
    pub fn ids(&self) -> impl Iterator<Item = &SlotId> {
        self.0.keys()
    }

    /// `(id, type)` pairs in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (&SlotId, &str)> {
        self.0.iter().map(|(id, t)| (id, t.as_str()))
    }

    /// Number of identifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An identifier was asked to change type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("identifier {id} already typed {existing}, refusing {requested}")]
pub struct TypeConflict {
    /// Identifier in question
    pub id: SlotId,
    /// Type already recorded
    pub existing: String,
    /// Type that was requested
    pub requested: String,
}

/// Persisted planning state carried between cycles
///
/// `fingerprints[i]` is the fingerprint of the record that produced
/// `plan[i]`. Wire keys follow the session store: `uuidPlan`,
/// `slotTypeMap`, `recordFingerprints`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanState {
    #[serde(rename = "uuidPlan", default)]
    plan: Vec<PlanRow>,

    #[serde(rename = "slotTypeMap", default)]
    type_map: SlotTypeMap,

    #[serde(rename = "recordFingerprints", default)]
    fingerprints: Vec<Fingerprint>,
}

impl PlanState {
    /// Empty state (first run)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble from parts
    #[inline]
    #[must_use]
    pub fn from_parts(plan: Vec<PlanRow>, type_map: SlotTypeMap, fingerprints: Vec<Fingerprint>) -> Self {
        Self {
            plan,
            type_map,
            fingerprints,
        }
    }

    /// Split into parts
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Vec<PlanRow>, SlotTypeMap, Vec<Fingerprint>) {
        (self.plan, self.type_map, self.fingerprints)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if the JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plan rows, one per record, in record order
    #[inline]
    #[must_use]
    pub fn plan(&self) -> &[PlanRow] {
        &self.plan
    }

    /// Type map
    #[inline]
    #[must_use]
    pub fn type_map(&self) -> &SlotTypeMap {
        &self.type_map
    }

    /// Record fingerprints, index-aligned with [`Self::plan`]
    #[inline]
    #[must_use]
    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.plan.len()
    }

    /// True when nothing is planned and nothing is typed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty() && self.type_map.is_empty() && self.fingerprints.is_empty()
    }

    /// True when plan and fingerprint list have the same length
    #[inline]
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.plan.len() == self.fingerprints.len()
    }

    /// Identifiers referenced by the current plan
    #[must_use]
    pub fn live_ids(&self) -> HashSet<SlotId> {
        self.plan.iter().flat_map(PlanRow::ids).copied().collect()
    }

    /// Index of the row holding `id`
    #[must_use]
    pub fn row_of(&self, id: &SlotId) -> Option<usize> {
        self.plan.iter().position(|row| row.contains_id(id))
    }

    /// Every `(row index, slot, id)` in plan order
    pub fn slots(&self) -> impl Iterator<Item = (usize, &SlotName, &SlotId)> {
        self.plan
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |(slot, id)| (i, slot, id)))
    }
}
