//! # templar-sync
//!
//! Update pipeline and result reporting.
//!
//! Call [`pipeline::run`] to load, validate and reconcile a directory of
//! templates, then [`report::report`] to print the run and get its exit status.

pub mod pipeline;
pub mod report;

pub use pipeline::{run, validate_only, CancelFlag, PipelineRun, UpdateRequest};
pub use report::{display_root, print_failure, report, Outcome};
