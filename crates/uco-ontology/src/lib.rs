//! UCO Ontology
//!
//! Typed CASE/UCO ontology maps and slot requirement derivation.
//!
//! # Overview
//!
//! - **OntologyMap**: classes, facets, property ownership, relationships
//! - **SlotDeriver**: record field keys → required class/facet/relationship slots
//! - **SlotAliases**: caller-owned field-key aliases applied during lookup
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use uco_artifact::Record;
//! use uco_ontology::{derive_slots, OntologyMap};
//!
//! let ontology = OntologyMap::new()
//!     .with_classes(["File"])
//!     .with_facets(["FileFacet"])
//!     .with_properties("FileFacet", ["fileName"]);
//!
//! let record = Record::from_value(json!({"fileName": "a.txt"})).unwrap();
//! let slots = derive_slots(&record, &ontology);
//!
//! let names: Vec<&str> = slots.names().map(|n| n.as_str()).collect();
//! assert_eq!(names, vec!["file", "filefacet"]);
//! ```

#![warn(missing_docs)]

pub mod derive;
pub mod ontology;
pub mod slot;

// Re-exports
pub use derive::{derive_slots, relationship_slot_name, PropertyIndex, SlotAliases, SlotDeriver};
pub use ontology::{OntologyError, OntologyMap, RelationshipDescriptor};
pub use slot::{
    SlotKind, SlotName, SlotRequirement, SlotSet, DEFAULT_TYPE_PREFIX, FALLBACK_CLASS_NAME,
    FALLBACK_CLASS_SLOT, RELATIONSHIP_TYPE,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for slot derivation
    pub use crate::{
        derive_slots, OntologyMap, RelationshipDescriptor, SlotAliases, SlotDeriver, SlotKind,
        SlotName, SlotSet,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
