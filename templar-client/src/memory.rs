//! An in-process template store with the server's reconciliation semantics.
//!
//! Each namespace holds an ordered list of definitions. A reconciliation runs
//! entirely under one lock, so concurrent readers never see a half-applied set.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use templar_core::{
    Definition, DefinitionSet, Failure, Identifier, Namespace, PrunePolicy,
    ReconciliationResult, StatusClass, Violation,
};

use crate::client::ReconciliationClient;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    namespaces: Mutex<BTreeMap<Namespace, Vec<Definition>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a namespace, replacing whatever it held.
    pub fn with_namespace(self, namespace: impl Into<Namespace>, definitions: Vec<Definition>) -> Self {
        self.lock().insert(namespace.into(), definitions);
        self
    }

    /// Current members of `namespace`, in store order.
    pub fn members(&self, namespace: &Namespace) -> Vec<Definition> {
        self.lock().get(namespace).cloned().unwrap_or_default()
    }

    /// Identifiers currently held in `namespace`, in store order.
    pub fn identifiers(&self, namespace: &Namespace) -> Vec<Identifier> {
        self.members(namespace)
            .iter()
            .map(|d| d.identifier().clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Namespace, Vec<Definition>>> {
        // Entries are replaced in one assignment, so a poisoned map is still whole.
        self.namespaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReconciliationClient for InMemoryStore {
    fn reconcile(
        &self,
        namespace: &Namespace,
        definitions: &DefinitionSet,
        prune: PrunePolicy,
    ) -> Result<ReconciliationResult, Failure> {
        let violations: Vec<Violation> = definitions
            .iter()
            .filter(|d| d.namespace() != namespace)
            .map(|d| {
                Violation::new(
                    d.qualified_name(),
                    "namespace",
                    format!("must be '{namespace}'"),
                )
            })
            .collect();
        if !violations.is_empty() {
            return Err(Failure::Transport {
                class: StatusClass::ClientError,
                code: Some(422),
                detail: format!("{} definition(s) outside namespace '{namespace}'", violations.len()),
                violations,
            });
        }

        let mut namespaces = self.lock();
        let existing = namespaces.get(namespace).cloned().unwrap_or_default();

        let mut next: Vec<Definition> = Vec::with_capacity(existing.len() + definitions.len());
        let mut deleted = Vec::new();
        for current in &existing {
            match definitions
                .iter()
                .find(|d| d.identifier() == current.identifier())
            {
                Some(updated) => next.push(updated.clone()),
                None if prune.deletes_absent() => deleted.push(current.identifier().clone()),
                None => next.push(current.clone()),
            }
        }
        for submitted in definitions {
            if !existing
                .iter()
                .any(|d| d.identifier() == submitted.identifier())
            {
                next.push(submitted.clone());
            }
        }

        namespaces.insert(namespace.clone(), next);
        Ok(ReconciliationResult {
            definitions: definitions.as_slice().to_vec(),
            deleted: Some(deleted),
        })
    }
}
