//! Deterministic identifiers
//!
//! Name-based (RFC 4122 version 5) identifiers: the same namespace and seed
//! always give the same identifier, so re-planning unchanged content never
//! mints new ids.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uco_artifact::Fingerprint;
use uco_ontology::SlotName;
use uuid::Uuid;

/// Namespace for per-record root identifiers (seeded by fingerprint)
pub const RECORD_NAMESPACE: Uuid = Uuid::from_u128(0x3c8f_1d2a_6b4e_5a07_9e1c_2f6d_8a4b_0c13);

/// Namespace for per-slot identifiers (seeded by `"{record_id}:{slot}"`)
pub const SLOT_NAMESPACE: Uuid = Uuid::from_u128(0x7a52_e9c4_0d31_5f8b_a6e2_4b7c_19d0_f35e);

/// Version-5 identifier for `seed` within `namespace`
#[inline]
#[must_use]
pub fn derive_id(namespace: &Uuid, seed: &str) -> Uuid {
    Uuid::new_v5(namespace, seed.as_bytes())
}

/// Root identifier of one record's planned node set
///
/// Never emitted in the plan itself; it only seeds slot identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Derive from a fingerprint
    ///
    /// `ordinal` counts earlier records with the same fingerprint in the same
    /// input. The first occurrence is seeded by the fingerprint alone; later
    /// duplicates append `#{ordinal}` so their slot ids stay distinct.
    #[must_use]
    pub fn derive(fingerprint: &Fingerprint, ordinal: usize) -> Self {
        let seed = if ordinal == 0 {
            fingerprint.to_hex()
        } else {
            format!("{}#{ordinal}", fingerprint.to_hex())
        };
        Self(derive_id(&RECORD_NAMESPACE, &seed))
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Identifier of one planned slot (one graph node)
///
/// Text form is the canonical lowercase hyphenated 36-character UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(Uuid);

impl SlotId {
    /// Derive from the owning record and the slot name
    #[must_use]
    pub fn derive(record: &RecordId, slot: &SlotName) -> Self {
        Self(derive_id(&SLOT_NAMESPACE, &format!("{record}:{slot}")))
    }

    /// Wrap an existing UUID
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for SlotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for SlotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for SlotId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
