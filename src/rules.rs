//! Immutable rule store mapping resource types to patch operations.

use json_patch::PatchOperation;
use kube::core::GroupVersionKind;

use crate::config::{Config, Mutation};

/// Ordered, read-only set of mutation rules.
///
/// Built once at startup from [`Config`] and shared with every request
/// handler. Concurrent lookups need no locking because nothing writes after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    mutations: Vec<Mutation>,
}

impl RuleStore {
    /// Build a store from mutation rules, preserving declaration order.
    pub fn new(mutations: Vec<Mutation>) -> Self {
        Self { mutations }
    }

    /// Number of configured rules.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the store holds no rules at all.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Collect the patch operations of every rule whose selector matches
    /// `target`, concatenated in rule declaration order.
    ///
    /// Returns an empty vector (not an error) when nothing matches. Cost is
    /// linear in the number of configured rules.
    pub fn matching_patches(&self, target: &GroupVersionKind) -> Vec<PatchOperation> {
        self.mutations
            .iter()
            .filter(|m| m.resource.matches(target))
            .flat_map(|m| m.patches.iter().cloned())
            .collect()
    }
}

impl From<Config> for RuleStore {
    fn from(config: Config) -> Self {
        Self::new(config.mutations)
    }
}
