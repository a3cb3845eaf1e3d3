use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use uco_core::{
    check_graph, classify_feedback, FeedbackKind, PlanningSession, SessionRegistry, SkeletonBuilder,
    SkeletonConfig, Violation,
};
use uco_planner::{Invalidation, PlanState, PlannerConfig};
use uco_test_utils::{forensic_ontology, forensic_records};

/// Give every node at least one property so facets are not empty
fn fill(mut graph: Value) -> Value {
    for node in graph["@graph"].as_array_mut().unwrap() {
        node["rdfs:comment"] = json!("filled");
    }
    graph
}

#[test]
fn test_feedback_cycle_replans_only_implicated_rows() {
    let ontology = forensic_ontology();
    let config = PlannerConfig::default();
    let records = forensic_records();
    let skeleton_config = SkeletonConfig::default();
    let mut session = PlanningSession::new("case-42");

    session.plan(&records, &ontology, &config);
    let first = session.state().clone();

    // Downstream drops the URL node; the checker points at it
    let mut graph = fill(SkeletonBuilder::new(&skeleton_config, &ontology).build(&first));
    let url_id = *first.plan()[1].get("url").unwrap();
    let url_node = skeleton_config.node_id(&"url".into(), &url_id);
    graph["@graph"]
        .as_array_mut()
        .unwrap()
        .retain(|n| n["@id"] != url_node.as_str());

    let report = check_graph(&graph, &first, &ontology, &skeleton_config);
    assert_eq!(
        report.violations(),
        &[Violation::MissingPlannedNode {
            node_id: url_node.clone(),
            id: url_id
        }]
    );

    let feedback = format!("Missing @id reference {url_id}");
    assert_eq!(classify_feedback(&feedback), FeedbackKind::IdentityRelated);
    session.route_feedback(&feedback);
    assert_eq!(session.pending(), Some(&Invalidation::Targets(vec![url_id])));

    let cycle = session.plan(&records, &ontology, &config);
    assert_eq!(cycle.regenerated(), 1);
    assert!(!cycle.changes[1].is_reused());
    assert!(session.pending().is_none());

    // Re-derivation is deterministic, so the same identifiers come back
    assert_eq!(session.state(), &first);

    let graph = fill(SkeletonBuilder::new(&skeleton_config, &ontology).build(session.state()));
    assert!(check_graph(&graph, session.state(), &ontology, &skeleton_config).is_clean());
}

#[test]
fn test_conformance_targets_feed_partial_invalidation() {
    let ontology = forensic_ontology();
    let config = PlannerConfig::default();
    let records = forensic_records();
    let skeleton_config = SkeletonConfig::default();
    let mut session = PlanningSession::new("s");
    session.plan(&records, &ontology, &config);

    // Bare skeleton: every facet is empty
    let graph = SkeletonBuilder::new(&skeleton_config, &ontology).build(session.state());
    let report = check_graph(&graph, session.state(), &ontology, &skeleton_config);
    assert!(!report.is_clean());
    assert!(report
        .violations()
        .iter()
        .all(|v| matches!(v, Violation::EmptyFacet { .. })));

    let targets = report.planned_targets().to_vec();
    let removed = session.invalidate_now(&Invalidation::Targets(targets));
    // Only the last record has no facet
    assert_eq!(removed.rows_removed, records.len() - 1);
    assert_eq!(session.state().len(), 1);
}

#[test]
fn test_content_feedback_keeps_plan() {
    let ontology = forensic_ontology();
    let config = PlannerConfig::default();
    let records = forensic_records();
    let mut session = PlanningSession::new("s");
    session.plan(&records, &ontology, &config);

    assert_eq!(session.route_feedback("subject text is truncated"), FeedbackKind::Content);
    let cycle = session.plan(&records, &ontology, &config);
    assert!(cycle.is_noop());
}

#[test]
fn test_registry_sessions_plan_concurrently() {
    let registry = SessionRegistry::new();
    let ontology = forensic_ontology();
    let config = PlannerConfig::default();
    let records = forensic_records();

    std::thread::scope(|scope| {
        for i in 0..4 {
            let registry = &registry;
            let ontology = &ontology;
            let config = &config;
            let records = &records;
            scope.spawn(move || {
                let id = format!("session-{i}");
                registry.plan(&id, &records[..=i], ontology, config);
            });
        }
    });

    assert_eq!(registry.len(), 4);
    let full = registry.state("session-3").unwrap();
    for i in 0..4 {
        let state = registry.state(&format!("session-{i}")).unwrap();
        assert_eq!(state.len(), i + 1);
        // Same content plans to the same identifiers in every session
        assert_eq!(state.plan(), &full.plan()[..=i]);
    }
}

proptest! {
    #[test]
    fn prop_skeleton_of_any_plan_has_one_node_per_non_relationship_slot(take in 0usize..=4) {
        let ontology = forensic_ontology();
        let records = forensic_records();
        let mut session = PlanningSession::new("p");
        session.plan(&records[..take], &ontology, &PlannerConfig::default());

        let state: &PlanState = session.state();
        let graph = SkeletonBuilder::new(&SkeletonConfig::default(), &ontology).build(state);
        let expected = state
            .slots()
            .filter(|(_, slot, _)| !slot.is_relationship())
            .count();
        prop_assert_eq!(graph["@graph"].as_array().unwrap().len(), expected);
    }
}
