use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uco_cli::{command, load_state, run, CliOutcome};
use uco_planner::PlanState;
use uco_test_utils::{file_ontology, plan_fresh, records};

fn run_args(args: &[&str]) -> CliOutcome {
    let matches = command()
        .try_get_matches_from(std::iter::once("uco-plan").chain(args.iter().copied()))
        .unwrap();
    run(&matches).unwrap()
}

fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

struct Fixture {
    dir: TempDir,
    records: PathBuf,
    ontology: PathBuf,
    state: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let records = write(
        dir.path(),
        "records.json",
        &json!({"records": [
            {"fileName": "a.txt", "sizeInBytes": 10},
            {"name": "record2", "value": "B"}
        ]}),
    );
    let ontology = write(
        dir.path(),
        "ontology.json",
        &serde_json::to_value(file_ontology()).unwrap(),
    );
    let state = dir.path().join("state.json");
    Fixture {
        dir,
        records,
        ontology,
        state,
    }
}

fn plan_into_state(f: &Fixture) -> PlanState {
    let outcome = run_args(&[
        "plan",
        "--records",
        arg(&f.records),
        "--ontology",
        arg(&f.ontology),
        "--out",
        arg(&f.state),
    ]);
    assert_eq!(outcome.output, None);
    load_state(Some(&f.state)).unwrap()
}

#[test]
fn test_plan_writes_state_and_replan_is_stable() {
    let f = fixture();
    let first = plan_into_state(&f);
    assert_eq!(first.len(), 2);
    // Same ids as planning in-process
    let in_process = plan_fresh(
        &records([
            json!({"fileName": "a.txt", "sizeInBytes": 10}),
            json!({"name": "record2", "value": "B"}),
        ]),
        &file_ontology(),
    );
    assert_eq!(first, in_process);

    let outcome = run_args(&[
        "plan",
        "--records",
        arg(&f.records),
        "--ontology",
        arg(&f.ontology),
        "--state",
        arg(&f.state),
    ]);
    let printed: PlanState = serde_json::from_str(&outcome.output.unwrap()).unwrap();
    assert_eq!(printed, first);
}

#[test]
fn test_yaml_ontology_is_accepted() {
    let f = fixture();
    let yaml = f.dir.path().join("ontology.yaml");
    fs::write(
        &yaml,
        "classes: [File]\nfacets: [FileFacet]\nproperties:\n  FileFacet: [fileName]\n",
    )
    .unwrap();

    let outcome = run_args(&["plan", "--records", arg(&f.records), "--ontology", arg(&yaml)]);
    let state: PlanState = serde_json::from_str(&outcome.output.unwrap()).unwrap();
    let slots: Vec<String> = state.plan()[0].slots().map(ToString::to_string).collect();
    assert_eq!(slots, vec!["file", "filefacet"]);
}

#[test]
fn test_invalidate_targets_and_full() {
    let f = fixture();
    let state = plan_into_state(&f);
    let target = state.plan()[0].get("filefacet").unwrap().to_string();

    let outcome = run_args(&["invalidate", "--state", arg(&f.state), "--target", target.as_str()]);
    let partial: PlanState = serde_json::from_str(&outcome.output.unwrap()).unwrap();
    assert_eq!(partial.len(), 1);
    assert_eq!(partial.plan()[0], state.plan()[1]);

    let outcome = run_args(&["invalidate", "--state", arg(&f.state)]);
    let full: PlanState = serde_json::from_str(&outcome.output.unwrap()).unwrap();
    assert!(full.is_empty());
}

#[test]
fn test_invalid_target_is_rejected_by_parser() {
    let result = command().try_get_matches_from(["uco-plan", "invalidate", "--state", "s.json", "--target", "nope"]);
    assert!(result.is_err());
}

#[test]
fn test_skeleton_then_check() {
    let f = fixture();
    plan_into_state(&f);

    let outcome = run_args(&["skeleton", "--state", arg(&f.state), "--ontology", arg(&f.ontology)]);
    let mut graph: Value = serde_json::from_str(&outcome.output.unwrap()).unwrap();
    assert_eq!(graph["@graph"].as_array().unwrap().len(), 3);

    // Bare skeleton: the file facet is empty
    let bare = write(f.dir.path(), "bare.json", &graph);
    let outcome = run_args(&[
        "check",
        "--graph",
        arg(&bare),
        "--state",
        arg(&f.state),
        "--ontology",
        arg(&f.ontology),
    ]);
    assert!(!outcome.success);
    let report: Value = serde_json::from_str(&outcome.output.unwrap()).unwrap();
    assert_eq!(report["clean"], json!(false));
    assert_eq!(report["violations"][0]["violation"], json!("empty_facet"));
    assert_eq!(report["plannedTargets"].as_array().unwrap().len(), 1);

    graph["@graph"][1]["uco-observable:fileName"] = json!("a.txt");
    let filled = write(f.dir.path(), "filled.json", &graph);
    let outcome = run_args(&[
        "check",
        "--graph",
        arg(&filled),
        "--state",
        arg(&f.state),
        "--ontology",
        arg(&f.ontology),
    ]);
    assert!(outcome.success);
}

#[test]
fn test_missing_file_is_an_error() {
    let f = fixture();
    let matches = command()
        .try_get_matches_from([
            "uco-plan",
            "plan",
            "--records",
            arg(&f.dir.path().join("absent.json")),
            "--ontology",
            arg(&f.ontology),
        ])
        .unwrap();
    let err = run(&matches).unwrap_err();
    assert!(format!("{err:#}").contains("cannot read"));
}
