pub mod update;
pub mod validate;

use templar_loader::{DocumentFormat, JsonFormat, YamlFormat};

/// Formats recognised by every subcommand.
pub const FORMATS: &[&dyn DocumentFormat] = &[&YamlFormat, &JsonFormat];
