//! templar core library — domain types, validation, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, [`Definition`], [`DefinitionSet`], [`ReconciliationResult`]
//! - [`error`] — [`Failure`] taxonomy and [`ConfigError`]
//! - [`validate`] — local structural checks
//! - [`config`] — template server connection settings

pub mod config;
pub mod error;
pub mod types;
pub mod validate;

pub use config::ClientConfig;
pub use error::{ConfigError, Failure, ParseFailure, StatusClass};
pub use types::{
    Definition, DefinitionSet, Identifier, Namespace, PrunePolicy, ReconciliationResult,
    Violation,
};
