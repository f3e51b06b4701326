//! Human-readable rendering of a [`PipelineRun`] and its exit status.
//!
//! Success text goes to `out`, failure text to `err`. Every failure prints
//! enough detail to act on before the failure outcome is returned.

use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;

use templar_core::{Failure, ParseFailure, ReconciliationResult, StatusClass, Violation};

use crate::pipeline::PipelineRun;

/// Process outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
        }
    }
}

/// Print `run` and return its outcome.
pub fn report(run: &PipelineRun, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<Outcome> {
    if run.discovered == Some(0) {
        writeln!(out, "No template found in '{}'", display_root(&run.root))?;
    }
    if run.cancelled {
        writeln!(
            err,
            "{} Update of namespace '{}' cancelled before the request was issued",
            "✗".red(),
            run.namespace
        )?;
        return Ok(Outcome::Failure);
    }

    match &run.outcome {
        Ok(result) => {
            print_success(&run.namespace.0, result, out)?;
            Ok(Outcome::Success)
        }
        Err(failure) => {
            print_failure(failure, err)?;
            Ok(Outcome::Failure)
        }
    }
}

fn print_success(namespace: &str, result: &ReconciliationResult, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{} {} template(s) for namespace '{namespace}' successfully updated",
        "✓".green(),
        result.definitions.len()
    )?;
    for def in &result.definitions {
        writeln!(out, "- {}", def.qualified_name())?;
    }
    if let Some(deleted) = &result.deleted {
        for id in deleted {
            writeln!(out, "- {namespace}.{id} (deleted)")?;
        }
    }
    Ok(())
}

/// Print a failure of any class.
pub fn print_failure(failure: &Failure, err: &mut dyn Write) -> io::Result<()> {
    let mark = "✗".red();
    match failure {
        Failure::Parse(failures) => {
            writeln!(err, "{mark} Unable to parse {} file(s):", failures.len())?;
            print_parse_failures(failures, err)
        }
        Failure::Validation { violations } => {
            writeln!(err, "{mark} Invalid template(s), {} violation(s):", violations.len())?;
            print_violations(violations, err)
        }
        Failure::Transport {
            class: StatusClass::ClientError,
            code,
            detail,
            violations,
        } => {
            match code {
                Some(code) => writeln!(err, "{mark} Server rejected the templates (HTTP {code}):")?,
                None => writeln!(err, "{mark} Server rejected the templates:")?,
            }
            if !violations.is_empty() {
                print_violations(violations, err)
            } else if detail.trim().is_empty() {
                writeln!(err, "(empty response body)")
            } else {
                writeln!(err, "{detail}")
            }
        }
        Failure::Transport {
            class: StatusClass::Other,
            detail,
            ..
        } => writeln!(err, "{mark} Unable to reach template server: {detail}"),
    }
}

fn print_parse_failures(failures: &[ParseFailure], err: &mut dyn Write) -> io::Result<()> {
    for failure in failures {
        writeln!(err, "- {failure}")?;
    }
    Ok(())
}

fn print_violations(violations: &[Violation], err: &mut dyn Write) -> io::Result<()> {
    for violation in violations {
        writeln!(err, "- {violation}")?;
    }
    Ok(())
}

/// `root` made absolute against the working directory, for display.
pub fn display_root(root: &Path) -> String {
    std::path::absolute(root)
        .unwrap_or_else(|_| root.to_path_buf())
        .display()
        .to_string()
}
