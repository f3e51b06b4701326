//! Structural validation of definitions before submission.
//!
//! Every rule runs against every definition; the caller gets the complete list
//! of violations in one pass. No network access.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::Failure;
use crate::types::{Definition, DefinitionSet, Namespace, Violation};

const MAX_ID_LEN: usize = 100;
const MAX_NAMESPACE_LEN: usize = 150;

/// Return `set` unchanged if every definition is well formed, otherwise a
/// [`Failure::Validation`] carrying every violation found.
pub fn validate(set: DefinitionSet) -> Result<DefinitionSet, Failure> {
    let violations = collect_violations(&set);
    if violations.is_empty() {
        Ok(set)
    } else {
        Err(Failure::Validation { violations })
    }
}

/// All violations across the set, in definition order.
pub fn collect_violations(set: &DefinitionSet) -> Vec<Violation> {
    let mut violations = Vec::new();
    for def in set {
        violations.extend(definition_violations(def));
    }

    // The whole set lands in one target namespace, whatever each file declares.
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for def in set {
        let key = def.identifier().0.as_str();
        if key.is_empty() {
            continue;
        }
        *seen.entry(key).or_default() += 1;
    }
    let mut reported = HashSet::new();
    for def in set {
        let key = def.identifier().0.as_str();
        if seen.get(key).copied().unwrap_or(0) > 1 && reported.insert(key) {
            violations.push(Violation::new(
                def.qualified_name(),
                "id",
                format!("defined {} times in the set", seen[key]),
            ));
        }
    }

    violations
}

/// Violations for the namespace a reconciliation targets.
pub fn namespace_violations(namespace: &Namespace) -> Vec<Violation> {
    check_namespace(&namespace.0)
        .map(|message| vec![Violation::new("", "namespace", message)])
        .unwrap_or_default()
}

/// Violations for a single definition.
pub fn definition_violations(def: &Definition) -> Vec<Violation> {
    let subject = def.qualified_name();
    let mut out = Vec::new();

    if let Some(message) = check_identifier(&def.identifier().0) {
        out.push(Violation::new(&subject, "id", message));
    }
    if let Some(message) = check_namespace(&def.namespace().0) {
        out.push(Violation::new(&subject, "namespace", message));
    }

    match def.body().get("tasks") {
        None | Some(Value::Null) => {
            out.push(Violation::new(&subject, "tasks", "must not be empty"));
        }
        Some(Value::Array(tasks)) if tasks.is_empty() => {
            out.push(Violation::new(&subject, "tasks", "must not be empty"));
        }
        Some(Value::Array(tasks)) => check_tasks(&subject, "tasks", tasks, &mut out),
        Some(_) => out.push(Violation::new(&subject, "tasks", "must be a list")),
    }

    match def.body().get("errors") {
        None | Some(Value::Null) => {}
        Some(Value::Array(tasks)) => check_tasks(&subject, "errors", tasks, &mut out),
        Some(_) => out.push(Violation::new(&subject, "errors", "must be a list")),
    }

    out
}

fn check_tasks(subject: &str, field: &str, tasks: &[Value], out: &mut Vec<Violation>) {
    let mut ids: HashSet<&str> = HashSet::new();
    for (index, task) in tasks.iter().enumerate() {
        let path = format!("{field}[{index}]");
        let Value::Object(task) = task else {
            out.push(Violation::new(subject, path, "must be a mapping"));
            continue;
        };

        match task.get("id").and_then(Value::as_str) {
            Some(id) if !id.trim().is_empty() => {
                if !ids.insert(id) {
                    out.push(Violation::new(
                        subject,
                        format!("{path}.id"),
                        format!("duplicate task id '{id}'"),
                    ));
                }
            }
            _ => out.push(Violation::new(subject, format!("{path}.id"), "must not be empty")),
        }

        match task.get("type").and_then(Value::as_str) {
            Some(kind) if !kind.trim().is_empty() => {}
            _ => out.push(Violation::new(subject, format!("{path}.type"), "must not be empty")),
        }
    }
}

fn check_identifier(id: &str) -> Option<String> {
    if id.is_empty() {
        return Some("must not be empty".to_string());
    }
    if id.chars().count() > MAX_ID_LEN {
        return Some(format!("must be at most {MAX_ID_LEN} characters"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Some("must match [a-zA-Z0-9._-]+".to_string());
    }
    None
}

fn check_namespace(namespace: &str) -> Option<String> {
    if namespace.is_empty() {
        return Some("must not be empty".to_string());
    }
    if namespace.chars().count() > MAX_NAMESPACE_LEN {
        return Some(format!("must be at most {MAX_NAMESPACE_LEN} characters"));
    }
    if !namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Some("must match [a-z0-9._-]+".to_string());
    }
    None
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
