//! `uco-plan` command-line front end
//!
//! Thin file-based wrapper: read records, ontology and state as JSON (YAML
//! for ontologies), call the planner, write JSON back.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uco_artifact::RecordSet;
use uco_core::{check_graph, SkeletonBuilder, SkeletonConfig};
use uco_ontology::OntologyMap;
use uco_planner::{
    IncrementalPlanner, Invalidation, PlanState, PlannerConfig, ReusePolicy, SlotId,
    TypeMapRetention,
};

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutcome {
    /// Text for stdout, if any
    pub output: Option<String>,
    /// Exit status
    pub success: bool,
}

impl CliOutcome {
    fn printed(value: &Value) -> Result<Self> {
        Ok(Self {
            output: Some(serde_json::to_string_pretty(value)?),
            success: true,
        })
    }

    fn written() -> Self {
        Self {
            output: None,
            success: true,
        }
    }
}

/// Command-line definition
#[must_use]
pub fn command() -> Command {
    Command::new("uco-plan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Deterministic identifier planning for CASE/UCO JSON-LD graphs")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("plan")
                .about("Plan identifiers for a record set")
                .arg(path_arg("records", "Records JSON (array, {\"records\": [...]}, or one object)").required(true))
                .arg(path_arg("ontology", "Ontology map (JSON, or YAML by extension)").required(true))
                .arg(path_arg("state", "Previous plan state"))
                .arg(path_arg("out", "Write the new state here instead of stdout"))
                .arg(
                    Arg::new("ontology-aware")
                        .long("ontology-aware")
                        .action(ArgAction::SetTrue)
                        .help("Regenerate every row when the ontology changes"),
                )
                .arg(
                    Arg::new("prune")
                        .long("prune")
                        .action(ArgAction::SetTrue)
                        .help("Drop type-map entries the new plan no longer references"),
                ),
        )
        .subcommand(
            Command::new("invalidate")
                .about("Invalidate a plan fully, or only the rows holding some identifiers")
                .arg(path_arg("state", "Plan state").required(true))
                .arg(
                    Arg::new("target")
                        .long("target")
                        .action(ArgAction::Append)
                        .value_parser(|s: &str| s.parse::<SlotId>())
                        .help("Identifier whose row to invalidate (repeatable); none means full"),
                )
                .arg(path_arg("out", "Write the new state here instead of stdout")),
        )
        .subcommand(
            Command::new("skeleton")
                .about("Print the skeleton JSON-LD graph of a plan")
                .arg(path_arg("state", "Plan state").required(true))
                .arg(path_arg("ontology", "Ontology map the plan was built with").required(true))
                .arg(
                    Arg::new("relationships")
                        .long("relationships")
                        .action(ArgAction::SetTrue)
                        .help("Include relationship nodes"),
                )
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .default_value("kb:")
                        .help("Node id prefix"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check a JSON-LD graph against a plan")
                .arg(path_arg("graph", "JSON-LD graph").required(true))
                .arg(path_arg("state", "Plan state").required(true))
                .arg(path_arg("ontology", "Ontology map the plan was built with").required(true))
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .default_value("kb:")
                        .help("Node id prefix"),
                ),
        )
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

/// Install the stderr log subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A second init (tests) keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Dispatch parsed arguments
///
/// # Errors
/// Returns error on unreadable input files or planning failure
pub fn run(matches: &ArgMatches) -> Result<CliOutcome> {
    match matches.subcommand() {
        Some(("plan", args)) => plan(args),
        Some(("invalidate", args)) => invalidate(args),
        Some(("skeleton", args)) => skeleton(args),
        Some(("check", args)) => check(args),
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

fn plan(args: &ArgMatches) -> Result<CliOutcome> {
    let records = load_records(required_path(args, "records")?)?;
    let ontology = load_ontology(required_path(args, "ontology")?)?;
    let previous = load_state(args.get_one::<PathBuf>("state"))?;

    let mut config = PlannerConfig::default();
    if args.get_flag("ontology-aware") {
        config = config.with_reuse_policy(ReusePolicy::OntologyAware);
    }
    if args.get_flag("prune") {
        config = config.with_retention(TypeMapRetention::PruneUnreferenced);
    }

    let outcome = IncrementalPlanner::new(&ontology, &config).plan(records.records(), &previous);
    for conflict in &outcome.report.type_conflicts {
        warn!(%conflict, "kept existing type; a full invalidation clears it");
    }
    info!(
        reused = outcome.report.reused(),
        regenerated = outcome.report.regenerated(),
        dropped = outcome.report.dropped,
        "plan complete"
    );

    emit_state(&outcome.state, args.get_one::<PathBuf>("out"))
}

fn invalidate(args: &ArgMatches) -> Result<CliOutcome> {
    let state = load_state(Some(required_path(args, "state")?))?;
    let targets: Vec<SlotId> = args
        .get_many::<SlotId>("target")
        .map(|ids| ids.copied().collect())
        .unwrap_or_default();

    let invalidation = if targets.is_empty() {
        Invalidation::Full
    } else {
        Invalidation::Targets(targets)
    };
    let (next, report) = invalidation.apply(&state);
    info!(
        rows_removed = report.rows_removed,
        types_removed = report.types_removed,
        "invalidation complete"
    );

    emit_state(&next, args.get_one::<PathBuf>("out"))
}

fn skeleton(args: &ArgMatches) -> Result<CliOutcome> {
    let state = load_state(Some(required_path(args, "state")?))?;
    let ontology = load_ontology(required_path(args, "ontology")?)?;
    let config = skeleton_config(args).with_relationships(args.get_flag("relationships"));
    CliOutcome::printed(&SkeletonBuilder::new(&config, &ontology).build(&state))
}

fn check(args: &ArgMatches) -> Result<CliOutcome> {
    let graph_path = required_path(args, "graph")?;
    let graph: Value = serde_json::from_str(&read(graph_path)?)
        .with_context(|| format!("invalid JSON in {}", graph_path.display()))?;
    let state = load_state(Some(required_path(args, "state")?))?;
    let ontology = load_ontology(required_path(args, "ontology")?)?;

    let report = check_graph(&graph, &state, &ontology, &skeleton_config(args));
    let mut outcome = CliOutcome::printed(&serde_json::json!({
        "clean": report.is_clean(),
        "violations": report.violations(),
        "plannedTargets": report.planned_targets(),
    }))?;
    outcome.success = report.is_clean();
    Ok(outcome)
}

fn skeleton_config(args: &ArgMatches) -> SkeletonConfig {
    let config = SkeletonConfig::default();
    match args.get_one::<String>("prefix") {
        Some(prefix) => config.with_id_prefix(prefix.as_str()),
        None => config,
    }
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing --{name}"))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Read a record file
///
/// # Errors
/// Returns error if the file is unreadable or not a record collection
pub fn load_records(path: &Path) -> Result<RecordSet> {
    RecordSet::from_json(&read(path)?).with_context(|| format!("invalid records in {}", path.display()))
}

/// Read an ontology map; `.yaml`/`.yml` files are parsed as YAML
///
/// # Errors
/// Returns error if the file is unreadable or malformed
pub fn load_ontology(path: &Path) -> Result<OntologyMap> {
    let text = read(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let ontology = if is_yaml {
        OntologyMap::from_yaml(&text)
    } else {
        OntologyMap::from_json(&text)
    };
    ontology.with_context(|| format!("invalid ontology in {}", path.display()))
}

/// Read a plan state; no path means a first run
///
/// # Errors
/// Returns error if the file is unreadable or malformed
pub fn load_state(path: Option<&PathBuf>) -> Result<PlanState> {
    match path {
        Some(path) => PlanState::from_json(&read(path)?)
            .with_context(|| format!("invalid plan state in {}", path.display())),
        None => Ok(PlanState::new()),
    }
}

fn emit_state(state: &PlanState, out: Option<&PathBuf>) -> Result<CliOutcome> {
    let value = serde_json::to_value(state)?;
    match out {
        Some(path) => {
            fs::write(path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("cannot write {}", path.display()))?;
            info!(path = %path.display(), rows = state.len(), "state written");
            Ok(CliOutcome::written())
        }
        None => CliOutcome::printed(&value),
    }
}
