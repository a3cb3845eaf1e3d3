//! Skeleton JSON-LD graphs
//!
//! Turns a [`PlanState`] into a JSON-LD document holding only planned node
//! identities, types and facet links. Content is filled in downstream; the
//! skeleton pins what the identifiers must be.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use uco_ontology::{OntologyMap, SlotKind, SlotName};
use uco_planner::{PlanRow, PlanState, SlotId, SlotTypeMap};

/// Facet link property
pub const HAS_FACET: &str = "uco-core:hasFacet";

/// Type used when the type map has no entry for an identifier
pub const DEFAULT_NODE_TYPE: &str = "uco-core:UcoObject";

/// Default node id prefix
pub const DEFAULT_ID_PREFIX: &str = "kb:";

/// Skeleton configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonConfig {
    /// Prefix of every node id, e.g. `kb:`
    pub id_prefix: String,
    /// Emit relationship slots as nodes
    pub include_relationships: bool,
    /// JSON-LD `@context`
    pub context: Map<String, Value>,
}

impl SkeletonConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With id prefix
    #[inline]
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// With relationship nodes included
    #[inline]
    #[must_use]
    pub fn with_relationships(mut self, include: bool) -> Self {
        self.include_relationships = include;
        self
    }

    /// With one context term added or replaced
    #[must_use]
    pub fn with_context_term(mut self, term: impl Into<String>, iri: impl Into<String>) -> Self {
        self.context.insert(term.into(), Value::String(iri.into()));
        self
    }

    /// Node id for a planned slot: `{prefix}{slot}-{uuid}`
    #[must_use]
    pub fn node_id(&self, slot: &SlotName, id: &SlotId) -> String {
        format!("{}{slot}-{id}", self.id_prefix)
    }

    /// Split a node id of the planned form into slot and identifier
    #[must_use]
    pub fn parse_node_id<'a>(&self, node_id: &'a str) -> Option<(&'a str, SlotId)> {
        let rest = node_id.strip_prefix(self.id_prefix.as_str())?;
        // 36-character uuid plus the separating hyphen
        let split = rest.len().checked_sub(37)?;
        if !rest.is_char_boundary(split) {
            return None;
        }
        let (slot, tail) = rest.split_at(split);
        let id = tail.strip_prefix('-')?.parse().ok()?;
        (!slot.is_empty()).then_some((slot, id))
    }
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        let context = [
            ("kb", "http://example.org/kb/"),
            ("uco-core", "https://ontology.unifiedcyberontology.org/uco/core/"),
            ("uco-observable", "https://ontology.unifiedcyberontology.org/uco/observable/"),
            ("uco-types", "https://ontology.unifiedcyberontology.org/uco/types/"),
            ("xsd", "http://www.w3.org/2001/XMLSchema#"),
        ]
        .into_iter()
        .map(|(term, iri)| (term.to_string(), Value::String(iri.to_string())))
        .collect();

        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            include_relationships: false,
            context,
        }
    }
}

/// Roles of planned slots, resolved against the ontology a plan was built with
///
/// Relationship slots carry the `relationship_` prefix. A slot named after a
/// declared facet is a facet unless a declared class shares its name, since
/// class slots are derived first. Everything else is a class slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRoles {
    classes: HashSet<SlotName>,
    facets: HashSet<SlotName>,
}

impl SlotRoles {
    /// Collect the declared class and facet slot names
    #[must_use]
    pub fn from_ontology(ontology: &OntologyMap) -> Self {
        Self {
            classes: ontology.classes.iter().map(SlotName::new).collect(),
            facets: ontology.facets.iter().map(SlotName::new).collect(),
        }
    }

    /// Role of one slot
    #[must_use]
    pub fn role(&self, slot: &SlotName) -> SlotKind {
        if slot.is_relationship() {
            SlotKind::Relationship
        } else if self.facets.contains(slot) && !self.classes.contains(slot) {
            SlotKind::Facet
        } else {
            SlotKind::Class
        }
    }
}

/// Builds skeleton graphs
#[derive(Debug, Clone)]
pub struct SkeletonBuilder<'a> {
    config: &'a SkeletonConfig,
    roles: SlotRoles,
}

impl<'a> SkeletonBuilder<'a> {
    /// Create a builder for plans derived from `ontology`
    #[must_use]
    pub fn new(config: &'a SkeletonConfig, ontology: &OntologyMap) -> Self {
        Self {
            config,
            roles: SlotRoles::from_ontology(ontology),
        }
    }

    /// Slot roles in use
    #[inline]
    #[must_use]
    pub fn roles(&self) -> &SlotRoles {
        &self.roles
    }

    /// `{"@context": ..., "@graph": [...]}` for the whole plan
    #[must_use]
    pub fn build(&self, state: &PlanState) -> Value {
        let graph: Vec<Value> = state
            .plan()
            .iter()
            .flat_map(|row| self.row_nodes(row, state.type_map()))
            .collect();

        tracing::debug!(rows = state.len(), nodes = graph.len(), "built skeleton graph");

        json!({
            "@context": Value::Object(self.config.context.clone()),
            "@graph": graph,
        })
    }

    /// Nodes for one row in slot order; the first class slot links the facets
    #[must_use]
    pub fn row_nodes(&self, row: &PlanRow, types: &SlotTypeMap) -> Vec<Value> {
        let facet_refs: Vec<Value> = row
            .iter()
            .filter(|(slot, _)| self.roles.role(slot) == SlotKind::Facet)
            .map(|(slot, id)| json!({"@id": self.config.node_id(slot, id)}))
            .collect();

        let mut nodes = Vec::with_capacity(row.len());
        let mut primary_seen = false;
        for (slot, id) in row {
            let role = self.roles.role(slot);
            if role == SlotKind::Relationship && !self.config.include_relationships {
                continue;
            }

            let mut node = Map::new();
            node.insert("@id".to_string(), Value::String(self.config.node_id(slot, id)));
            node.insert(
                "@type".to_string(),
                Value::String(types.get(id).unwrap_or(DEFAULT_NODE_TYPE).to_string()),
            );
            if role == SlotKind::Class && !primary_seen {
                primary_seen = true;
                if !facet_refs.is_empty() {
                    node.insert(HAS_FACET.to_string(), Value::Array(facet_refs.clone()));
                }
            }
            nodes.push(Value::Object(node));
        }
        nodes
    }
}

/// Skeleton graph with the default configuration
#[must_use]
pub fn skeleton(state: &PlanState, ontology: &OntologyMap) -> Value {
    let config = SkeletonConfig::default();
    SkeletonBuilder::new(&config, ontology).build(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uco_artifact::Record;
    use uco_ontology::RelationshipDescriptor;
    use uco_planner::plan;

    fn ontology() -> OntologyMap {
        OntologyMap::new()
            .with_classes(["File"])
            .with_facets(["FileFacet", "ContentDataFacet"])
            .with_properties("FileFacet", ["fileName"])
            .with_properties("ContentDataFacet", ["hash"])
            .with_relationship(RelationshipDescriptor::of_type("Contained_Within"))
    }

    fn planned() -> PlanState {
        let records = vec![
            Record::from_value(json!({"fileName": "a", "hash": "00"})).unwrap(),
            Record::from_value(json!({"note": "x"})).unwrap(),
        ];
        plan(&records, &ontology(), &PlanState::new())
    }

    #[test]
    fn node_ids_round_trip() {
        let config = SkeletonConfig::default();
        let state = planned();
        let (slot, id) = state.plan()[0].iter().next().unwrap();
        let node_id = config.node_id(slot, id);
        assert!(node_id.starts_with("kb:file-"));
        assert_eq!(config.parse_node_id(&node_id), Some(("file", *id)));
        assert_eq!(config.parse_node_id("kb:file-not-a-uuid"), None);
        assert_eq!(config.parse_node_id("other:file-6ba7b810-9dad-51d1-80b4-00c04fd430c8"), None);
        assert_eq!(config.parse_node_id("kb:-6ba7b810-9dad-51d1-80b4-00c04fd430c8"), None);
    }

    #[test]
    fn primary_node_links_facets() {
        let state = planned();
        let graph = skeleton(&state, &ontology());
        let nodes = graph["@graph"].as_array().unwrap();

        // file, filefacet, contentdatafacet, then observableobject; no relationships
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0]["@type"], "uco-observable:File");
        let refs = nodes[0][HAS_FACET].as_array().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0]["@id"], nodes[1]["@id"]);
        assert_eq!(refs[1]["@id"], nodes[2]["@id"]);
        assert_eq!(nodes[1]["@type"], "uco-observable:FileFacet");
        assert!(nodes[3].get(HAS_FACET).is_none());
        assert_eq!(graph["@context"]["kb"], "http://example.org/kb/");
    }

    #[test]
    fn relationships_on_request() {
        let state = planned();
        let config = SkeletonConfig::default().with_relationships(true);
        let graph = SkeletonBuilder::new(&config, &ontology()).build(&state);
        let nodes = graph["@graph"].as_array().unwrap();
        assert_eq!(nodes.len(), 6);
        assert!(nodes
            .iter()
            .any(|n| n["@type"] == "uco-core:Relationship"
                && n["@id"].as_str().unwrap().starts_with("kb:relationship_0_contained_within-")));
    }

    #[test]
    fn unknown_types_default() {
        let state = planned();
        let (plan, _, fps) = state.into_parts();
        let untyped = PlanState::from_parts(plan, SlotTypeMap::new(), fps);
        let graph = skeleton(&untyped, &ontology());
        assert_eq!(graph["@graph"][0]["@type"], DEFAULT_NODE_TYPE);
    }

    #[test]
    fn skeleton_is_deterministic() {
        assert_eq!(skeleton(&planned(), &ontology()), skeleton(&planned(), &ontology()));
    }

    #[test]
    fn slot_roles_follow_the_ontology() {
        let roles = SlotRoles::from_ontology(
            &OntologyMap::new()
                .with_classes(["File", "Archive"])
                .with_facets(["ContentData", "FileFacet", "Archive"]),
        );
        assert_eq!(roles.role(&SlotName::new("contentdata")), SlotKind::Facet);
        assert_eq!(roles.role(&SlotName::new("filefacet")), SlotKind::Facet);
        assert_eq!(roles.role(&SlotName::new("file")), SlotKind::Class);
        assert_eq!(roles.role(&SlotName::new("archive")), SlotKind::Class);
        assert_eq!(roles.role(&SlotName::new("observableobject")), SlotKind::Class);
        assert_eq!(roles.role(&SlotName::new("relationship_0")), SlotKind::Relationship);
        // Undeclared names are never facets, whatever they end in
        assert_eq!(roles.role(&SlotName::new("otherfacet")), SlotKind::Class);
    }

    #[test]
    fn facet_without_suffix_is_linked() {
        let ontology = OntologyMap::new()
            .with_facets(["ContentData"])
            .with_properties("ContentData", ["hash"]);
        let records = vec![Record::from_value(json!({"hash": "00"})).unwrap()];
        let state = plan(&records, &ontology, &PlanState::new());

        let graph = skeleton(&state, &ontology);
        let nodes = graph["@graph"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["@type"], "uco-observable:ObservableObject");
        assert_eq!(nodes[0][HAS_FACET], json!([{"@id": nodes[1]["@id"].clone()}]));
        assert_eq!(nodes[1]["@type"], "uco-observable:ContentData");
    }
}
