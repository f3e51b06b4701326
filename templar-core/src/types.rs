//! Domain types for template reconciliation.
//!
//! A [`Definition`] is the parsed form of one template file. Its JSON form is
//! the flattened document, `{"id": …, "namespace": …, …}`, which is also what
//! the template server accepts and returns.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a definition, unique within its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(pub String);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A named partition of the template server's resource space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(pub String);

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// One declaratively specified template.
///
/// Fields are only reachable through accessors: once parsed, a definition is
/// never mutated. Missing `id` / `namespace` keys deserialize to empty values
/// so that the validator can report them alongside every other problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(rename = "id", default)]
    identifier: Identifier,
    #[serde(default)]
    namespace: Namespace,
    #[serde(flatten)]
    body: Map<String, Value>,
}

impl Definition {
    pub fn new(
        identifier: impl Into<Identifier>,
        namespace: impl Into<Namespace>,
        mut body: Map<String, Value>,
    ) -> Self {
        body.remove("id");
        body.remove("namespace");
        Self {
            identifier: identifier.into(),
            namespace: namespace.into(),
            body,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Every document key other than `id` and `namespace`.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// `namespace.identifier`, the form used in all user-facing output.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.identifier)
    }
}

// ---------------------------------------------------------------------------
// DefinitionSet
// ---------------------------------------------------------------------------

/// Definitions discovered by one directory walk, in traversal order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionSet(Vec<Definition>);

impl DefinitionSet {
    pub fn new(definitions: Vec<Definition>) -> Self {
        Self(definitions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Definition> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Definition] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Definition> {
        self.0
    }
}

impl From<Vec<Definition>> for DefinitionSet {
    fn from(definitions: Vec<Definition>) -> Self {
        Self(definitions)
    }
}

impl<'a> IntoIterator for &'a DefinitionSet {
    type Item = &'a Definition;
    type IntoIter = std::slice::Iter<'a, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// PrunePolicy
// ---------------------------------------------------------------------------

/// Whether the server deletes namespace members missing from the submitted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrunePolicy {
    /// Delete every member not named in the set.
    #[default]
    Prune,
    /// Upsert only; extra members are left untouched.
    Retain,
}

impl PrunePolicy {
    /// Build the policy from a `--no-delete` style flag.
    pub fn from_no_delete(no_delete: bool) -> Self {
        if no_delete {
            Self::Retain
        } else {
            Self::Prune
        }
    }

    /// The boolean sent on the wire.
    pub fn deletes_absent(self) -> bool {
        matches!(self, Self::Prune)
    }
}

impl fmt::Display for PrunePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrunePolicy::Prune => write!(f, "prune"),
            PrunePolicy::Retain => write!(f, "retain"),
        }
    }
}

// ---------------------------------------------------------------------------
// ReconciliationResult
// ---------------------------------------------------------------------------

/// The server's view of a namespace after a reconciliation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Definitions created or updated, in the order the server reported them.
    pub definitions: Vec<Definition>,
    /// Pruned identifiers. `None` when the server does not report deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<Identifier>>,
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// A single broken constraint, local or reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Qualified name of the offending definition, or a file path.
    pub subject: String,
    /// Field path inside the definition, e.g. `tasks[1].type`. Empty when the
    /// violation concerns the whole definition.
    #[serde(default)]
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        subject: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.subject.is_empty(), self.path.is_empty()) {
            (true, true) => write!(f, "{}", self.message),
            (true, false) => write!(f, "{}: {}", self.path, self.message),
            (false, true) => write!(f, "{}: {}", self.subject, self.message),
            (false, false) => write!(f, "{}.{}: {}", self.subject, self.path, self.message),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
