//! Slot requirement derivation
//!
//! Maps a record's field keys onto the class, facet and relationship slots
//! it needs. Pure and deterministic given `(record, ontology, aliases)`.

use crate::ontology::OntologyMap;
use crate::slot::{
    SlotKind, SlotName, SlotRequirement, SlotSet, DEFAULT_TYPE_PREFIX, FALLBACK_CLASS_NAME,
    FALLBACK_CLASS_SLOT, RELATIONSHIP_SLOT_PREFIX, RELATIONSHIP_TYPE,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uco_artifact::Record;

/// Field-key aliases applied during property lookup
///
/// Maps an input field key (case-insensitive) to the property names it may
/// stand for, e.g. `sourcefilename` → `fileName`, `filePath`. A key is looked
/// up as itself and as every property it aliases. Owned by the caller and
/// passed explicitly; there is no shared alias table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, Vec<String>>")]
pub struct SlotAliases(IndexMap<String, Vec<String>>);

impl SlotAliases {
    /// No aliases
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With one alias target added
    #[must_use]
    pub fn with_alias(mut self, alias: impl AsRef<str>, property: impl Into<String>) -> Self {
        self.insert(alias, property);
        self
    }

    /// With several alias targets added
    #[must_use]
    pub fn with_aliases<I, S>(mut self, alias: impl AsRef<str>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for property in properties {
            self.insert(alias.as_ref(), property);
        }
        self
    }

    /// Add an alias target; repeated targets are ignored
    pub fn insert(&mut self, alias: impl AsRef<str>, property: impl Into<String>) {
        let property = property.into();
        let targets = self.0.entry(alias.as_ref().to_lowercase()).or_default();
        if !targets.contains(&property) {
            targets.push(property);
        }
    }

    /// Property names to look up for a field key: the key itself, then its
    /// alias targets in insertion order
    pub fn properties<'k>(&'k self, key: &'k str) -> impl Iterator<Item = &'k str> + 'k {
        let targets = self.0.get(&key.to_lowercase()).map(Vec::as_slice).unwrap_or_default();
        std::iter::once(key).chain(targets.iter().map(String::as_str))
    }

    /// Number of aliased keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no alias is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, Vec<String>>> for SlotAliases {
    fn from(table: IndexMap<String, Vec<String>>) -> Self {
        table
            .into_iter()
            .fold(Self::new(), |aliases, (alias, properties)| aliases.with_aliases(alias, properties))
    }
}

/// Reverse index: property name (case-folded) → owning class or facet
///
/// Owners are visited in declared order and the first owner of a property
/// wins.
#[derive(Debug, Clone, Default)]
pub struct PropertyIndex {
    owners: HashMap<String, String>,
}

impl PropertyIndex {
    /// Build from an ontology map
    #[must_use]
    pub fn build(ontology: &OntologyMap) -> Self {
        let mut owners = HashMap::new();
        for (owner, properties) in &ontology.properties {
            for property in properties {
                owners
                    .entry(property.to_lowercase())
                    .or_insert_with(|| owner.clone());
            }
        }
        Self { owners }
    }

    /// Owner of a property (case-insensitive)
    #[must_use]
    pub fn owner(&self, property: &str) -> Option<&str> {
        self.owners.get(&property.to_lowercase()).map(String::as_str)
    }

    /// Number of indexed properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True when no property is indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Derives the slots a record requires
///
/// Build once per ontology map and reuse for every record of a cycle.
///
/// # Rules
/// 1. A class is required when any field key contains the class name as a
///    case-insensitive substring. Matching is permissive: `Log` matches
///    `Login`.
/// 2. No class matched → the `observableobject` fallback class slot.
/// 3. A facet is required when a field key, or any property it aliases, is
///    owned by a declared facet.
/// 4. One relationship slot per declared relationship, always.
#[derive(Debug, Clone)]
pub struct SlotDeriver<'a> {
    ontology: &'a OntologyMap,
    aliases: &'a SlotAliases,
    index: PropertyIndex,
    type_prefix: String,
}

impl<'a> SlotDeriver<'a> {
    /// Create a deriver with the default `uco-observable:` type prefix
    #[must_use]
    pub fn new(ontology: &'a OntologyMap, aliases: &'a SlotAliases) -> Self {
        Self {
            ontology,
            aliases,
            index: PropertyIndex::build(ontology),
            type_prefix: DEFAULT_TYPE_PREFIX.to_string(),
        }
    }

    /// With a different prefix for class and facet types
    #[must_use]
    pub fn with_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_prefix = prefix.into();
        self
    }

    /// Property index in use
    #[inline]
    #[must_use]
    pub fn index(&self) -> &PropertyIndex {
        &self.index
    }

    /// Required slots for one record; never empty
    #[must_use]
    pub fn derive(&self, record: &Record) -> SlotSet {
        let keys: Vec<String> = record.keys().map(str::to_lowercase).collect();
        let mut slots = SlotSet::new();

        for class in &self.ontology.classes {
            let needle = class.to_lowercase();
            if needle.is_empty() {
                continue;
            }
            if keys.iter().any(|key| key.contains(&needle)) {
                slots.insert(SlotRequirement::new(
                    SlotName::new(&needle),
                    SlotKind::Class,
                    self.qualify(class),
                ));
            }
        }

        if slots.is_empty() {
            slots.insert(SlotRequirement::new(
                SlotName::new(FALLBACK_CLASS_SLOT),
                SlotKind::Class,
                self.qualify(FALLBACK_CLASS_NAME),
            ));
        }

        let needed_facets: HashSet<String> = record
            .keys()
            .flat_map(|key| self.aliases.properties(key))
            .filter_map(|property| self.index.owner(property))
            .filter(|owner| self.ontology.is_facet(owner))
            .map(str::to_lowercase)
            .collect();

        // Declared facet order keeps the row layout independent of field order
        for facet in &self.ontology.facets {
            let slug = facet.to_lowercase();
            if needed_facets.contains(&slug) {
                slots.insert(SlotRequirement::new(
                    SlotName::new(&slug),
                    SlotKind::Facet,
                    self.qualify(facet),
                ));
            }
        }

        for (index, relationship) in self.ontology.relationships.iter().enumerate() {
            slots.insert(SlotRequirement::new(
                relationship_slot_name(index, relationship.label()),
                SlotKind::Relationship,
                RELATIONSHIP_TYPE,
            ));
        }

        tracing::trace!(slots = slots.len(), "derived slot requirements");
        slots
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}{}", self.type_prefix, name)
    }
}

/// Required slots for one record, with no aliases and the default type prefix
#[must_use]
pub fn derive_slots(record: &Record, ontology: &OntologyMap) -> SlotSet {
    let aliases = SlotAliases::new();
    SlotDeriver::new(ontology, &aliases).derive(record)
}

/// `relationship_{index}_{label}` with the label lower-cased and spaces or
/// hyphens turned into underscores; `relationship_{index}` without a label
#[must_use]
pub fn relationship_slot_name(index: usize, label: Option<&str>) -> SlotName {
    match label {
        Some(label) => {
            let slug: String = label
                .trim()
                .chars()
                .map(|c| if c == ' ' || c == '-' { '_' } else { c })
                .collect();
            SlotName::new(format!("{RELATIONSHIP_SLOT_PREFIX}{index}_{slug}"))
        }
        None => SlotName::new(format!("{RELATIONSHIP_SLOT_PREFIX}{index}")),
    }
}
