//! `templar validate` — local parse and validation only.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use templar_core::Namespace;
use templar_sync::{display_root, print_failure, validate_only};

use super::FORMATS;

/// Arguments for `templar validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory scanned recursively for template files.
    pub directory: PathBuf,

    /// Also check the namespace that would be targeted by `update`.
    #[arg(long)]
    pub namespace: Option<String>,
}

impl ValidateArgs {
    pub fn run(self) -> Result<ExitCode> {
        let namespace = self.namespace.map(Namespace::from);
        match validate_only(&self.directory, namespace.as_ref(), FORMATS) {
            Ok(set) => {
                let mut out = io::stdout().lock();
                if set.is_empty() {
                    writeln!(out, "No template found in '{}'", display_root(&self.directory))?;
                }
                for def in &set {
                    writeln!(out, "✓ {}", def.qualified_name())?;
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(failure) => {
                print_failure(&failure, &mut io::stderr().lock())
                    .context("failed to write report")?;
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
