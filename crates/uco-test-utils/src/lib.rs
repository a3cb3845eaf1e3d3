//! Testing utilities for UCO planner workspace
//!
//! Shared fixtures: ontologies, records and one-shot planning helpers.

#![allow(missing_docs)]

use serde_json::{json, Value};
use uco_artifact::{Record, RecordSet};
use uco_ontology::{OntologyMap, RelationshipDescriptor};
use uco_planner::{IncrementalPlanner, PlanOutcome, PlanState, PlannerConfig};

/// `File` class, `FileFacet` owning `fileName` and `sizeInBytes`
pub fn file_ontology() -> OntologyMap {
    OntologyMap::new()
        .with_classes(["File"])
        .with_facets(["FileFacet"])
        .with_properties("FileFacet", ["fileName", "sizeInBytes"])
}

/// Files, URLs and email messages with their facets and two relationships
pub fn forensic_ontology() -> OntologyMap {
    OntologyMap::new()
        .with_classes(["File", "URL", "EmailMessage"])
        .with_facets(["FileFacet", "URLFacet", "EmailMessageFacet", "ContentDataFacet"])
        .with_properties("FileFacet", ["fileName", "filePath", "extension", "sizeInBytes"])
        .with_properties("URLFacet", ["fullValue", "host"])
        .with_properties("EmailMessageFacet", ["subject", "from", "to", "sentTime"])
        .with_properties("ContentDataFacet", ["hash", "mimeType"])
        .with_relationship(RelationshipDescriptor::of_type("Contained_Within"))
        .with_relationship(RelationshipDescriptor::of_kind("Attached_To"))
}

/// Record from a JSON object literal
pub fn record(value: Value) -> Record {
    Record::from_value(value).unwrap()
}

/// Records from JSON object literals
pub fn records(values: impl IntoIterator<Item = Value>) -> Vec<Record> {
    values.into_iter().map(record).collect()
}

/// The two-record scenario used throughout the docs
pub fn sample_records() -> Vec<Record> {
    records([
        json!({"name": "record1", "value": "A"}),
        json!({"name": "record2", "value": "B"}),
    ])
}

/// A handful of varied forensic records
pub fn forensic_records() -> Vec<Record> {
    RecordSet::from_value(json!([
        {"fileName": "report.pdf", "sizeInBytes": 48213, "hash": "9f86d081"},
        {"url": "https://example.org/a", "fullValue": "https://example.org/a", "host": "example.org"},
        {"emailMessage": true, "subject": "Quarterly", "from": "a@example.org", "to": "b@example.org"},
        {"note": "free text without a class"},
    ]))
    .unwrap()
    .into_records()
}

/// Plan with the default configuration
pub fn plan_with(records: &[Record], ontology: &OntologyMap, previous: &PlanState) -> PlanOutcome {
    let config = PlannerConfig::default();
    IncrementalPlanner::new(ontology, &config).plan(records, previous)
}

/// First-run plan with the default configuration
pub fn plan_fresh(records: &[Record], ontology: &OntologyMap) -> PlanState {
    plan_with(records, ontology, &PlanState::new()).state
}
