//! The reconciliation seam.

use templar_core::{DefinitionSet, Failure, Namespace, PrunePolicy, ReconciliationResult};

/// Make the remote namespace match `definitions`.
///
/// One call is one all-or-nothing request: either the whole set is applied
/// (including pruning under [`PrunePolicy::Prune`]) or nothing is. Calls are
/// never retried here; callers may retry failures for which
/// [`Failure::is_retryable`] holds.
pub trait ReconciliationClient {
    fn reconcile(
        &self,
        namespace: &Namespace,
        definitions: &DefinitionSet,
        prune: PrunePolicy,
    ) -> Result<ReconciliationResult, Failure>;
}

impl<T: ReconciliationClient + ?Sized> ReconciliationClient for &T {
    fn reconcile(
        &self,
        namespace: &Namespace,
        definitions: &DefinitionSet,
        prune: PrunePolicy,
    ) -> Result<ReconciliationResult, Failure> {
        (**self).reconcile(namespace, definitions, prune)
    }
}
