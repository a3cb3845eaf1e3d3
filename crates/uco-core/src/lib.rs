//! UCO Core
//!
//! Session-level orchestration around the planner: stateful planning
//! sessions, feedback routing, skeleton graphs and identity conformance.
//!
//! # Overview
//!
//! - **PlanningSession**: state + pending invalidation, one per conversation
//! - **SessionRegistry**: concurrent session map, serialised per session
//! - **Feedback routing**: identity feedback → invalidation signal
//! - **SkeletonBuilder**: plan → JSON-LD `@graph` of planned nodes
//! - **check_graph**: filled graph vs plan → conformance violations
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use uco_artifact::RecordSet;
//! use uco_core::{check_graph, skeleton, PlanningSession, SkeletonConfig};
//! use uco_ontology::OntologyMap;
//! use uco_planner::PlannerConfig;
//!
//! let ontology = OntologyMap::new().with_classes(["File"]);
//! let records = RecordSet::from_value(json!([{"file": "a.txt"}])).unwrap();
//!
//! let mut session = PlanningSession::new("demo");
//! session.plan(records.records(), &ontology, &PlannerConfig::default());
//!
//! let graph = skeleton(session.state(), &ontology);
//! assert!(check_graph(&graph, session.state(), &ontology, &SkeletonConfig::default()).is_clean());
//! ```

#![warn(missing_docs)]

pub mod conformance;
pub mod error;
pub mod feedback;
pub mod session;
pub mod skeleton;

// Re-exports
pub use conformance::{check_graph, ConformanceReport, Violation};
pub use error::{CoreError, Result};
pub use feedback::{
    classify_feedback, extract_identifier_targets, invalidation_for_feedback, FeedbackKind,
    IDENTITY_KEYWORDS,
};
pub use session::{PlanningSession, SessionHandle, SessionRegistry};
pub use skeleton::{
    skeleton, SkeletonBuilder, SkeletonConfig, SlotRoles, DEFAULT_ID_PREFIX, DEFAULT_NODE_TYPE,
    HAS_FACET,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for session-level planning
    pub use crate::{
        check_graph, classify_feedback, CoreError, FeedbackKind, PlanningSession,
        SessionRegistry, SkeletonBuilder, SkeletonConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
