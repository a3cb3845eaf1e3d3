//! UCO Artifact Records
//!
//! Forensic input records with canonical, content-addressed fingerprints.
//!
//! # Core Concepts
//!
//! - [`Record`]: One forensic observation (a JSON object)
//! - [`RecordSet`]: Ordered records normalised from raw caller input
//! - [`Fingerprint`]: 32-byte Blake3 digest of a record's canonical form
//!
//! # Example
//!
//! ```rust
//! use uco_artifact::{Fingerprint, RecordSet};
//!
//! let set = RecordSet::from_json(r#"[{"name":"record1","value":"A"}]"#).unwrap();
//! let fp = set.records()[0].fingerprint();
//!
//! // Key order is irrelevant
//! let same = RecordSet::from_json(r#"[{"value":"A","name":"record1"}]"#).unwrap();
//! assert_eq!(fp, same.records()[0].fingerprint());
//! assert_eq!(fp.to_hex().len(), 64);
//! # let _: Fingerprint = fp;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod canonical;
mod fingerprint;
mod record;

// Re-exports
pub use canonical::{canonical_json, canonical_object};
pub use fingerprint::{Fingerprint, FingerprintError};
pub use record::{Record, RecordError, RecordSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
