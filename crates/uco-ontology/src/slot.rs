//! Slots: named roles within one record's planned node set

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

/// Slot used when a record matches no declared class
pub const FALLBACK_CLASS_SLOT: &str = "observableobject";

/// Class name behind [`FALLBACK_CLASS_SLOT`]
pub const FALLBACK_CLASS_NAME: &str = "ObservableObject";

/// Qualified type of every relationship slot
pub const RELATIONSHIP_TYPE: &str = "uco-core:Relationship";

/// Prefix for class and facet types
pub const DEFAULT_TYPE_PREFIX: &str = "uco-observable:";

/// Prefix of relationship slot names
pub const RELATIONSHIP_SLOT_PREFIX: &str = "relationship_";

/// Role a slot plays in the record's node set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Observable object (the thing described)
    Class,
    /// Property bundle attached to the object
    Facet,
    /// Relationship node
    Relationship,
}

impl Display for SlotKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Class => "class",
            Self::Facet => "facet",
            Self::Relationship => "relationship",
        })
    }
}

/// Slot name (lower-cased slug), e.g. `file`, `filefacet`, `relationship_0_contained_within`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotName(String);

impl SlotName {
    /// Create a slot name, lower-casing the input
    #[inline]
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    /// String form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for relationship slot names
    #[inline]
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.0.starts_with(RELATIONSHIP_SLOT_PREFIX)
    }
}

impl Display for SlotName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SlotName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SlotName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One slot a record requires
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotRequirement {
    name: SlotName,
    kind: SlotKind,
    type_name: String,
}

impl SlotRequirement {
    /// Create a requirement
    #[inline]
    #[must_use]
    pub fn new(name: SlotName, kind: SlotKind, type_name: impl Into<String>) -> Self {
        Self {
            name,
            kind,
            type_name: type_name.into(),
        }
    }

    /// Slot name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &SlotName {
        &self.name
    }

    /// Slot kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// Fully qualified ontology type, e.g. `uco-observable:FileFacet`
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Ordered, duplicate-free set of slot requirements
///
/// Class slots come first, then facets, then relationships. When two
/// requirements share a name the first one inserted is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSet {
    requirements: Vec<SlotRequirement>,
}

impl SlotSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless a slot with the same name exists; returns true if inserted
    pub fn insert(&mut self, requirement: SlotRequirement) -> bool {
        if self.contains(requirement.name.as_str()) {
            return false;
        }
        self.requirements.push(requirement);
        true
    }

    /// True if a slot with this name is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.requirements.iter().any(|r| r.name.as_str() == name)
    }

    /// Requirement by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SlotRequirement> {
        self.requirements.iter().find(|r| r.name.as_str() == name)
    }

    /// Slot names in order
    pub fn names(&self) -> impl Iterator<Item = &SlotName> {
        self.requirements.iter().map(SlotRequirement::name)
    }

    /// Requirements of one kind, in order
    pub fn of_kind(&self, kind: SlotKind) -> impl Iterator<Item = &SlotRequirement> {
        self.requirements.iter().filter(move |r| r.kind == kind)
    }

    /// Iterate requirements
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, SlotRequirement> {
        self.requirements.iter()
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// True when empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl<'a> IntoIterator for &'a SlotSet {
    type Item = &'a SlotRequirement;
    type IntoIter = std::slice::Iter<'a, SlotRequirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.iter()
    }
}
