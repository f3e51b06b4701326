//! Shared update pipeline used by `templar update` and embedders.
//!
//! Loader → Validator → ReconciliationClient, strictly in order, stopping at
//! the first stage that fails. Nothing is submitted unless every file parsed
//! and every definition validated.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use templar_client::ReconciliationClient;
use templar_core::{
    validate::{collect_violations, namespace_violations},
    DefinitionSet, Failure, Namespace, PrunePolicy, ReconciliationResult,
};
use templar_loader::{load_definitions, DocumentFormat};

/// Cooperative cancellation, checked before loading and right before the
/// request is issued. Once the request is on the wire it runs to completion
/// or to the transport timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One reconciliation: which directory, which namespace, which policy.
pub struct UpdateRequest<'a> {
    pub root: PathBuf,
    pub namespace: Namespace,
    pub prune: PrunePolicy,
    pub formats: &'a [&'a dyn DocumentFormat],
}

/// Everything the reporter needs about one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub root: PathBuf,
    pub namespace: Namespace,
    /// Number of definitions discovered, `None` if loading failed.
    pub discovered: Option<usize>,
    /// Set when the run stopped on a [`CancelFlag`] before the request.
    pub cancelled: bool,
    pub outcome: Result<ReconciliationResult, Failure>,
}

/// Run the full update pipeline against `client`.
pub fn run<C>(client: &C, request: &UpdateRequest<'_>, cancel: &CancelFlag) -> PipelineRun
where
    C: ReconciliationClient + ?Sized,
{
    let mut run = PipelineRun {
        root: request.root.clone(),
        namespace: request.namespace.clone(),
        discovered: None,
        cancelled: false,
        outcome: Err(cancelled()),
    };
    if cancel.is_cancelled() {
        run.cancelled = true;
        return run;
    }

    let set = match check(&request.root, Some(&request.namespace), request.formats) {
        Ok(set) => set,
        Err((discovered, failure)) => {
            run.discovered = discovered;
            run.outcome = Err(failure);
            return run;
        }
    };
    run.discovered = Some(set.len());

    if set.is_empty() {
        tracing::info!(
            "no definitions under {}; submitting empty set",
            request.root.display()
        );
    }
    for def in &set {
        if def.namespace() != &request.namespace {
            tracing::warn!(
                "{} declares namespace '{}' but targets '{}'",
                def.qualified_name(),
                def.namespace(),
                request.namespace
            );
        }
    }

    if cancel.is_cancelled() {
        run.cancelled = true;
        return run;
    }

    run.outcome = client.reconcile(&request.namespace, &set, request.prune);
    match &run.outcome {
        Ok(result) => tracing::info!(
            "reconciled namespace '{}': {} definition(s)",
            request.namespace,
            result.definitions.len()
        ),
        Err(failure) => tracing::warn!("reconciliation of '{}' failed: {failure}", request.namespace),
    }
    run
}

/// Load and validate without contacting the server.
///
/// When `namespace` is given it is checked as a reconciliation target too.
pub fn validate_only(
    root: &Path,
    namespace: Option<&Namespace>,
    formats: &[&dyn DocumentFormat],
) -> Result<DefinitionSet, Failure> {
    check(root, namespace, formats).map_err(|(_, failure)| failure)
}

fn check(
    root: &Path,
    namespace: Option<&Namespace>,
    formats: &[&dyn DocumentFormat],
) -> Result<DefinitionSet, (Option<usize>, Failure)> {
    let set = load_definitions(root, formats).map_err(|failures| (None, Failure::Parse(failures)))?;

    let mut violations = namespace.map(namespace_violations).unwrap_or_default();
    violations.extend(collect_violations(&set));
    if violations.is_empty() {
        Ok(set)
    } else {
        Err((Some(set.len()), Failure::Validation { violations }))
    }
}

fn cancelled() -> Failure {
    Failure::transport_other("cancelled before the request was issued")
}
