//! Identity conformance
//!
//! Checks a filled-in JSON-LD graph against the plan it was built from:
//! every planned node present with its planned type, no invented or
//! repeated identifiers, no empty facets and no null values.

use crate::skeleton::{SkeletonConfig, SlotRoles, HAS_FACET};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};
use uco_ontology::{OntologyMap, SlotKind, SlotName};
use uco_planner::{PlanState, SlotId};

/// One conformance violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// A planned node is absent from the graph
    MissingPlannedNode {
        /// Expected node id
        node_id: String,
        /// Planned identifier
        id: SlotId,
    },
    /// A node id of the planned form whose identifier or slot is not planned
    UnplannedIdentifier {
        /// Offending node id
        node_id: String,
    },
    /// The same node id appears on more than one node
    DuplicateIdentifier {
        /// Repeated node id
        node_id: String,
        /// Number of nodes carrying it
        count: usize,
    },
    /// A planned node carries a different type
    TypeMismatch {
        /// Node id
        node_id: String,
        /// Planned type
        expected: String,
        /// Type found, if any
        found: Option<String>,
    },
    /// A facet linked via `uco-core:hasFacet` has no properties
    EmptyFacet {
        /// Facet node id
        node_id: String,
    },
    /// A property holds `null` or an empty string
    NullValue {
        /// Node id
        node_id: String,
        /// Property name
        property: String,
    },
}

impl Violation {
    /// Node id the violation concerns
    #[must_use]
    pub fn node_id(&self) -> &str {
        match self {
            Self::MissingPlannedNode { node_id, .. }
            | Self::UnplannedIdentifier { node_id }
            | Self::DuplicateIdentifier { node_id, .. }
            | Self::TypeMismatch { node_id, .. }
            | Self::EmptyFacet { node_id }
            | Self::NullValue { node_id, .. } => node_id,
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPlannedNode { node_id, .. } => write!(f, "planned node {node_id} is missing"),
            Self::UnplannedIdentifier { node_id } => write!(f, "node {node_id} was not planned"),
            Self::DuplicateIdentifier { node_id, count } => {
                write!(f, "node id {node_id} used {count} times")
            }
            Self::TypeMismatch {
                node_id,
                expected,
                found,
            } => write!(
                f,
                "node {node_id} should be {expected}, found {}",
                found.as_deref().unwrap_or("no type")
            ),
            Self::EmptyFacet { node_id } => write!(f, "facet {node_id} has no properties"),
            Self::NullValue { node_id, property } => {
                write!(f, "node {node_id} has empty value for {property}")
            }
        }
    }
}

/// Result of a conformance check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConformanceReport {
    violations: Vec<Violation>,
    #[serde(skip)]
    implicated: Vec<SlotId>,
}

impl ConformanceReport {
    /// All violations in discovery order
    #[inline]
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True when nothing was found
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Planned identifiers implicated by violations, ready for a partial
    /// invalidation
    #[inline]
    #[must_use]
    pub fn planned_targets(&self) -> &[SlotId] {
        &self.implicated
    }

    fn push(&mut self, violation: Violation, implicated: Option<SlotId>) {
        if let Some(id) = implicated {
            if !self.implicated.contains(&id) {
                self.implicated.push(id);
            }
        }
        self.violations.push(violation);
    }
}

/// Check a graph against a plan derived from `ontology`
///
/// Planned facets are checked for emptiness whether or not anything links
/// them; other nodes are checked when reached through `uco-core:hasFacet`.
#[must_use]
pub fn check_graph(
    graph: &Value,
    state: &PlanState,
    ontology: &OntologyMap,
    config: &SkeletonConfig,
) -> ConformanceReport {
    let nodes = graph_nodes(graph);
    let roles = SlotRoles::from_ontology(ontology);
    let mut report = ConformanceReport::default();

    let planned: HashMap<SlotId, &SlotName> = state
        .plan()
        .iter()
        .flat_map(|row| row.iter().map(|(slot, id)| (*id, slot)))
        .collect();
    let planned_id = |node_id: &str| -> Option<SlotId> {
        config
            .parse_node_id(node_id)
            .and_then(|(slot, id)| (planned.get(&id).map(|s| s.as_str()) == Some(slot)).then_some(id))
    };

    let mut by_id: HashMap<&str, Vec<&Map<String, Value>>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for node in &nodes {
        if let Some(node_id) = node.get("@id").and_then(Value::as_str) {
            let entry = by_id.entry(node_id).or_default();
            if entry.is_empty() {
                order.push(node_id);
            }
            entry.push(*node);
        }
    }

    for &node_id in &order {
        let count = by_id[node_id].len();
        if count > 1 {
            report.push(
                Violation::DuplicateIdentifier {
                    node_id: node_id.to_string(),
                    count,
                },
                planned_id(node_id),
            );
        }
        if config.parse_node_id(node_id).is_some() && planned_id(node_id).is_none() {
            report.push(
                Violation::UnplannedIdentifier {
                    node_id: node_id.to_string(),
                },
                None,
            );
        }
    }

    let mut checked_facets: HashSet<String> = HashSet::new();
    for (_, slot, id) in state.slots() {
        let role = roles.role(slot);
        if role == SlotKind::Relationship && !config.include_relationships {
            continue;
        }
        let node_id = config.node_id(slot, id);
        let Some(found) = by_id.get(node_id.as_str()).and_then(|n| n.first()) else {
            report.push(Violation::MissingPlannedNode { node_id, id: *id }, Some(*id));
            continue;
        };
        if let Some(expected) = state.type_map().get(id) {
            if !has_type(found, expected) {
                let found_type = found.get("@type").map(type_text);
                report.push(
                    Violation::TypeMismatch {
                        node_id: node_id.clone(),
                        expected: expected.to_string(),
                        found: found_type,
                    },
                    Some(*id),
                );
            }
        }
        if role == SlotKind::Facet && is_bare(found) && checked_facets.insert(node_id.clone()) {
            report.push(Violation::EmptyFacet { node_id }, Some(*id));
        }
    }

    for node in &nodes {
        let Some(Value::Array(refs)) = node.get(HAS_FACET) else {
            continue;
        };
        for facet_id in refs.iter().filter_map(|r| r.get("@id").and_then(Value::as_str)) {
            if !checked_facets.insert(facet_id.to_string()) {
                continue;
            }
            let Some(facet) = by_id.get(facet_id).and_then(|n| n.first()) else {
                continue;
            };
            if is_bare(facet) {
                report.push(
                    Violation::EmptyFacet {
                        node_id: facet_id.to_string(),
                    },
                    planned_id(facet_id),
                );
            }
        }
    }

    for node in &nodes {
        let node_id = node.get("@id").and_then(Value::as_str).unwrap_or_default();
        for (property, value) in *node {
            if is_empty_value(value) {
                report.push(
                    Violation::NullValue {
                        node_id: node_id.to_string(),
                        property: property.clone(),
                    },
                    planned_id(node_id),
                );
            }
        }
    }

    if report.is_clean() {
        tracing::debug!(nodes = nodes.len(), "graph conforms to plan");
    } else {
        tracing::warn!(
            violations = report.violations.len(),
            implicated = report.implicated.len(),
            "graph does not conform to plan"
        );
    }
    report
}

fn graph_nodes(graph: &Value) -> Vec<&Map<String, Value>> {
    let items = match graph {
        Value::Object(map) => map.get("@graph").and_then(Value::as_array),
        Value::Array(items) => Some(items),
        _ => None,
    };
    items
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn is_bare(node: &Map<String, Value>) -> bool {
    node.keys().all(|k| k == "@id" || k == "@type")
}

fn has_type(node: &Map<String, Value>, expected: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == expected,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(expected)),
        _ => false,
    }
}

fn type_text(value: &Value) -> String {
    match value {
        Value::String(t) => t.clone(),
        other => other.to_string(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().any(is_empty_value),
        _ => false,
    }
}
