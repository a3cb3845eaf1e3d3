use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use uco_ontology::{OntologyMap, SlotName};
use uco_planner::{
    invalidate, IncrementalPlanner, PlanState, PlannerConfig, ReusePolicy, RowChange, SlotId,
    TypeMapRetention,
};
use uco_test_utils::{
    file_ontology, forensic_ontology, forensic_records, plan_fresh, plan_with, records,
    sample_records,
};

fn all_ids(state: &PlanState) -> Vec<SlotId> {
    state.slots().map(|(_, _, id)| *id).collect()
}

#[test]
fn test_example_scenario_changes_only_first_row() {
    let ontology = file_ontology();
    let first = plan_fresh(&sample_records(), &ontology);

    let row0: Vec<&str> = first.plan()[0].slots().map(SlotName::as_str).collect();
    assert_eq!(row0, vec!["observableobject"]);
    assert_eq!(
        first.type_map().get(first.plan()[0].get("observableobject").unwrap()),
        Some("uco-observable:ObservableObject")
    );

    let changed = records([
        json!({"name": "record1", "value": "A_changed"}),
        json!({"name": "record2", "value": "B"}),
    ]);
    let second = plan_with(&changed, &ontology, &first);

    assert_ne!(second.state.plan()[0], first.plan()[0]);
    assert_eq!(second.state.plan()[1], first.plan()[1]);
    assert_ne!(second.state.fingerprints()[0], first.fingerprints()[0]);
    assert_eq!(second.state.fingerprints()[1], first.fingerprints()[1]);
    assert_eq!(second.report.changes[1], RowChange::Reused { previous_index: 1 });
    assert_eq!(second.report.dropped, 1);

    // Old identifiers stay typed under the default retention
    for id in first.plan()[0].ids() {
        assert!(second.state.type_map().contains(id));
    }
}

#[test]
fn test_addition_keeps_existing_rows() {
    let ontology = forensic_ontology();
    let base = forensic_records();
    let first = plan_fresh(&base, &ontology);

    let mut grown = vec![uco_test_utils::record(json!({"fileName": "new.bin"}))];
    grown.extend(base.iter().cloned());
    let second = plan_with(&grown, &ontology, &first);

    assert_eq!(&second.state.plan()[1..], first.plan());
    assert_eq!(second.report.regenerated(), 1);
    assert!(!second.report.changes[0].is_reused());
}

#[test]
fn test_deletion_drops_row_only() {
    let ontology = forensic_ontology();
    let base = forensic_records();
    let first = plan_fresh(&base, &ontology);

    let shrunk: Vec<_> = base.iter().skip(1).cloned().collect();
    let second = plan_with(&shrunk, &ontology, &first);

    assert_eq!(second.state.plan(), &first.plan()[1..]);
    assert_eq!(second.report.dropped, 1);
    assert_eq!(second.report.minted, 0);
}

#[test]
fn test_reordering_reuses_every_row() {
    let ontology = forensic_ontology();
    let base = forensic_records();
    let first = plan_fresh(&base, &ontology);

    let mut reversed = base.clone();
    reversed.reverse();
    let second = plan_with(&reversed, &ontology, &first);

    assert_eq!(second.report.reused(), base.len());
    let mut expected: Vec<_> = first.plan().to_vec();
    expected.reverse();
    assert_eq!(second.state.plan(), expected.as_slice());
}

#[test]
fn test_forensic_rows_have_expected_slots() {
    let state = plan_fresh(&forensic_records(), &forensic_ontology());
    let slots = |i: usize| -> Vec<String> {
        state.plan()[i].slots().map(ToString::to_string).collect()
    };

    assert_eq!(
        slots(0),
        vec![
            "file",
            "filefacet",
            "contentdatafacet",
            "relationship_0_contained_within",
            "relationship_1_attached_to",
        ]
    );
    assert_eq!(slots(1)[..2].to_vec(), vec!["url", "urlfacet"]);
    assert_eq!(slots(3)[0], "observableobject");
}

#[test]
fn test_duplicate_content_pairs_positionally() {
    let ontology = file_ontology();
    let dupes = records([
        json!({"fileName": "same"}),
        json!({"fileName": "same"}),
        json!({"fileName": "same"}),
    ]);
    let first = plan_fresh(&dupes[..2], &ontology);
    let second = plan_with(&dupes, &ontology, &first);

    assert_eq!(second.report.changes[0], RowChange::Reused { previous_index: 0 });
    assert_eq!(second.report.changes[1], RowChange::Reused { previous_index: 1 });
    assert!(!second.report.changes[2].is_reused());

    let ids = all_ids(&second.state);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn test_regeneration_after_partial_invalidation_stays_unique() {
    let ontology = file_ontology();
    let dupes = records([json!({"fileName": "same"}), json!({"fileName": "same"})]);
    let first = plan_fresh(&dupes, &ontology);

    // Drop the first duplicate; the survivor holds the ordinal-1 identifiers
    let target = *first.plan()[0].get("file").unwrap();
    let trimmed = invalidate(&first, Some(&[target]));
    assert_eq!(trimmed.len(), 1);

    let second = plan_with(&dupes, &ontology, &trimmed);
    let ids = all_ids(&second.state);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(second.state.plan()[0], first.plan()[1]);
}

#[test]
fn test_recased_class_after_partial_invalidation_keeps_existing_type() {
    let ontology = OntologyMap::new()
        .with_classes(["URL"])
        .with_facets(["URLFacet"])
        .with_properties("URLFacet", ["host"]);
    let input = records([json!({"url": "https://example.org/a", "host": "example.org"})]);
    let first = plan_fresh(&input, &ontology);
    let url_id = *first.plan()[0].get("url").unwrap();
    let facet_id = *first.plan()[0].get("urlfacet").unwrap();

    // The class id stays typed after the facet's row is invalidated
    let trimmed = invalidate(&first, Some(&[facet_id]));
    assert!(trimmed.is_empty());
    assert_eq!(trimmed.type_map().get(&url_id), Some("uco-observable:URL"));

    let recased = ontology.clone().with_classes(["Url"]);
    let second = plan_with(&input, &recased, &trimmed);

    assert_eq!(second.state.plan(), first.plan());
    assert_eq!(second.state.type_map().get(&url_id), Some("uco-observable:URL"));
    assert_eq!(second.state.type_map().get(&facet_id), Some("uco-observable:URLFacet"));
    assert_eq!(second.report.type_conflicts.len(), 1);
    assert_eq!(second.report.type_conflicts[0].id, url_id);
    assert_eq!(second.report.type_conflicts[0].requested, "uco-observable:Url");

    // Full invalidation clears the old type
    let fresh = plan_with(&input, &recased, &invalidate(&second.state, None));
    assert!(fresh.report.type_conflicts.is_empty());
    assert_eq!(fresh.state.type_map().get(&url_id), Some("uco-observable:Url"));
}

#[test]
fn test_full_invalidation_rederives_same_ids() {
    let ontology = forensic_ontology();
    let base = forensic_records();
    let first = plan_fresh(&base, &ontology);

    let cleared = invalidate(&first, None);
    assert!(cleared.is_empty());

    let again = plan_with(&base, &ontology, &cleared);
    assert_eq!(again.state, first);
    assert_eq!(again.report.reused(), 0);
}

#[test]
fn test_ontology_aware_policy_regenerates_on_ontology_change() {
    let base = forensic_records();
    let before = forensic_ontology();
    let after = forensic_ontology().with_classes(["File", "URL", "EmailMessage", "Host"]);

    let content_only = PlannerConfig::default();
    let aware = PlannerConfig::default().with_reuse_policy(ReusePolicy::OntologyAware);

    let first = IncrementalPlanner::new(&before, &content_only)
        .plan(&base, &PlanState::new());
    let reused = IncrementalPlanner::new(&after, &content_only)
        .plan(&base, &first.state);
    assert_eq!(reused.report.reused(), base.len());

    let first = IncrementalPlanner::new(&before, &aware)
        .plan(&base, &PlanState::new());
    let regenerated = IncrementalPlanner::new(&after, &aware)
        .plan(&base, &first.state);
    assert_eq!(regenerated.report.reused(), 0);
    assert_ne!(regenerated.state.fingerprints(), first.state.fingerprints());
}

#[test]
fn test_prune_retention_drops_unreferenced_types() {
    let ontology = file_ontology();
    let config = PlannerConfig::default().with_retention(TypeMapRetention::PruneUnreferenced);
    let planner = IncrementalPlanner::new(&ontology, &config);

    let first = planner.plan(&sample_records(), &PlanState::new());
    let changed = records([
        json!({"name": "record1", "value": "A_changed"}),
        json!({"name": "record2", "value": "B"}),
    ]);
    let second = planner.plan(&changed, &first.state);

    assert_eq!(second.report.pruned, 1);
    assert_eq!(second.state.type_map().len(), 2);
    for id in second.state.type_map().ids() {
        assert!(second.state.live_ids().contains(id));
    }
}

#[test]
fn test_state_survives_json_round_trip_between_cycles() {
    let ontology = forensic_ontology();
    let base = forensic_records();
    let first = plan_fresh(&base, &ontology);

    let stored = serde_json::to_string(&first).unwrap();
    let loaded = PlanState::from_json(&stored).unwrap();
    let second = plan_with(&base, &ontology, &loaded);
    assert!(second.report.is_noop());
    assert_eq!(second.state, first);
}

#[test]
fn test_empty_ontology_falls_back() {
    let state = plan_fresh(&forensic_records(), &OntologyMap::new());
    for row in state.plan() {
        let slots: Vec<&str> = row.slots().map(SlotName::as_str).collect();
        assert_eq!(slots, vec!["observableobject"]);
    }
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ]
}

fn record_value() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map(
        prop_oneof![
            Just("fileName".to_string()),
            Just("sizeInBytes".to_string()),
            Just("host".to_string()),
            Just("subject".to_string()),
            "[a-z]{1,6}",
        ],
        scalar(),
        0..5,
    )
    .prop_map(|m| Value::Object(m.into_iter().collect()))
}

fn record_list() -> impl Strategy<Value = Vec<Value>> {
    proptest::collection::vec(record_value(), 0..8)
}

proptest! {
    #[test]
    fn prop_planning_is_deterministic(values in record_list()) {
        let ontology = forensic_ontology();
        let input = records(values);
        prop_assert_eq!(plan_fresh(&input, &ontology), plan_fresh(&input, &ontology));
    }

    #[test]
    fn prop_replanning_is_stable(values in record_list()) {
        let ontology = forensic_ontology();
        let input = records(values);
        let first = plan_fresh(&input, &ontology);
        let second = plan_with(&input, &ontology, &first);
        prop_assert_eq!(&second.state, &first);
    }

    #[test]
    fn prop_ids_unique_and_every_row_has_a_class(values in record_list()) {
        let ontology = forensic_ontology();
        let state = plan_fresh(&records(values), &ontology);
        let ids = all_ids(&state);
        let unique: HashSet<_> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
        for row in state.plan() {
            prop_assert!(!row.is_empty());
        }
        for id in &ids {
            prop_assert!(state.type_map().contains(id));
        }
        prop_assert!(state.is_aligned());
    }

    #[test]
    fn prop_update_touches_only_changed_row(
        values in proptest::collection::vec(record_value(), 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let ontology = forensic_ontology();
        let first = plan_fresh(&records(values.clone()), &ontology);

        let changed_at = pick.index(values.len());
        let mut updated = values.clone();
        if let Value::Object(map) = &mut updated[changed_at] {
            map.insert("__edited".to_string(), json!(true));
        }
        let second = plan_with(&records(updated), &ontology, &first);

        for (i, change) in second.report.changes.iter().enumerate() {
            if i != changed_at {
                prop_assert!(change.is_reused());
            }
        }
        prop_assert!(!second.report.changes[changed_at].is_reused());
    }
}
