//! Content fingerprints
//!
//! Provides [`Fingerprint`], a strongly-typed 32-byte digest of a record's
//! canonical form, used as the change-detection key between planning cycles.

use crate::canonical::{canonical_json, canonical_object};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content fingerprint (Blake3 over canonical JSON)
///
/// Two records with the same fields and values produce the same fingerprint
/// regardless of key order. Any change to a key, a value, or a value's JSON
/// type produces a different fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Create a fingerprint from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create fingerprint from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let arr = <[u8; 32]>::try_from(bytes).map_err(|_| FingerprintError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Digest raw bytes
    #[inline]
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Fingerprint a JSON value via its canonical form
    #[inline]
    #[must_use]
    pub fn of_value(value: &Value) -> Self {
        Self::digest(canonical_json(value).as_bytes())
    }

    /// Fingerprint a JSON object via its canonical form
    #[inline]
    #[must_use]
    pub fn of_object(map: &Map<String, Value>) -> Self {
        Self::digest(canonical_object(map).as_bytes())
    }

    /// Fingerprint any serializable value
    ///
    /// # Errors
    /// Returns error if the value cannot be represented as JSON
    /// (for example a map with non-string keys)
    pub fn of<T>(value: &T) -> Result<Self, FingerprintError>
    where
        T: serde::Serialize + ?Sized,
    {
        let json = serde_json::to_value(value).map_err(FingerprintError::Unserializable)?;
        Ok(Self::of_value(&json))
    }

    /// Derive a fingerprint that depends on both `self` and `other`
    ///
    /// Order matters: `a.combine(&b) != b.combine(&a)` in general.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.0);
        hasher.update(&other.0);
        Self(*hasher.finalize().as_bytes())
    }

    /// Full lowercase hex form (64 chars)
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; 32]> for Fingerprint {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FingerprintVisitor;

        impl<'de> serde::de::Visitor<'de> for FingerprintVisitor {
            type Value = Fingerprint;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 32-byte fingerprint as hex string or byte array")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Fingerprint::from_slice(value).map_err(serde::de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(FingerprintVisitor)
        } else {
            deserializer.deserialize_bytes(FingerprintVisitor)
        }
    }
}

/// Errors that can occur when working with fingerprints
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// Invalid digest length
    #[error("invalid fingerprint length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Input has no JSON representation
    #[error("value cannot be fingerprinted: {0}")]
    Unserializable(#[source] serde_json::Error),
}
