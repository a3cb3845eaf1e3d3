//! UCO Planner
//!
//! Deterministic, incremental identifier planning for CASE/UCO graph nodes.
//!
//! # Core Concepts
//!
//! - [`IncrementalPlanner`]: records + previous state → new state
//! - [`PlanState`]: plan rows, type map and record fingerprints
//! - [`SlotId`]: version-5 identifier derived from `(record fingerprint, slot)`
//! - [`Invalidation`]: full or targeted removal of planned rows
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use uco_artifact::RecordSet;
//! use uco_ontology::OntologyMap;
//! use uco_planner::{IncrementalPlanner, PlanState, PlannerConfig};
//!
//! let ontology = OntologyMap::new()
//!     .with_classes(["File"])
//!     .with_facets(["FileFacet"])
//!     .with_properties("FileFacet", ["fileName"]);
//! let config = PlannerConfig::default();
//! let planner = IncrementalPlanner::new(&ontology, &config);
//!
//! let records = RecordSet::from_value(json!([{"fileName": "a.txt"}])).unwrap();
//! let first = planner.plan(records.records(), &PlanState::new());
//!
//! // Unchanged input keeps every identifier
//! let second = planner.plan(records.records(), &first.state);
//! assert_eq!(first.state, second.state);
//! assert!(second.report.is_noop());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod builder;
mod config;
mod error;
mod id;
mod invalidate;
mod plan;

// Re-exports
pub use builder::{plan, prune_unreferenced, IncrementalPlanner, PlanOutcome, PlanReport, RowChange};
pub use config::{PlannerConfig, ReusePolicy, TypeMapRetention};
pub use error::{PlannerError, Result};
pub use id::{derive_id, RecordId, SlotId, RECORD_NAMESPACE, SLOT_NAMESPACE};
pub use invalidate::{invalidate, Invalidation, InvalidationReport};
pub use plan::{PlanRow, PlanState, SlotTypeMap, TypeConflict};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for planning
    pub use crate::{
        invalidate, IncrementalPlanner, Invalidation, PlanState, PlannerConfig, PlannerError,
        ReusePolicy, SlotId, TypeMapRetention,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
