//! Planner configuration

use serde::{Deserialize, Serialize};
use uco_ontology::{SlotAliases, DEFAULT_TYPE_PREFIX};

/// When a previous row may be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReusePolicy {
    /// Reuse on identical record content; ontology changes are ignored
    #[default]
    ContentOnly,
    /// Fold the ontology fingerprint into every record fingerprint, so any
    /// ontology change regenerates every row
    OntologyAware,
}

/// What happens to type-map entries no longer referenced by the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMapRetention {
    /// Keep every identifier ever typed
    #[default]
    Accumulate,
    /// Keep only identifiers referenced by the new plan
    PruneUnreferenced,
}

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Reuse policy
    pub reuse_policy: ReusePolicy,
    /// Type-map retention
    pub retention: TypeMapRetention,
    /// Prefix for class and facet types
    pub type_prefix: String,
    /// Field-key aliases applied before property lookup
    pub aliases: SlotAliases,
}

impl PlannerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With reuse policy
    #[inline]
    #[must_use]
    pub fn with_reuse_policy(mut self, policy: ReusePolicy) -> Self {
        self.reuse_policy = policy;
        self
    }

    /// With type-map retention
    #[inline]
    #[must_use]
    pub fn with_retention(mut self, retention: TypeMapRetention) -> Self {
        self.retention = retention;
        self
    }

    /// With type prefix
    #[inline]
    #[must_use]
    pub fn with_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_prefix = prefix.into();
        self
    }

    /// With field-key aliases
    #[inline]
    #[must_use]
    pub fn with_aliases(mut self, aliases: SlotAliases) -> Self {
        self.aliases = aliases;
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            reuse_policy: ReusePolicy::default(),
            retention: TypeMapRetention::default(),
            type_prefix: DEFAULT_TYPE_PREFIX.to_string(),
            aliases: SlotAliases::default(),
        }
    }
}
