//! Soft anomalies collected while compiling
//!
//! None of these stop the run. They are returned alongside the model so the
//! caller can decide whether the result is good enough.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A `$ref` named a definition the schema never provides
    UndefinedClass { key: String },

    /// A parameter or response refers to a type from another API version
    /// than the path it belongs to
    VersionMismatch {
        operation_id: String,
        reference: String,
        path_version: String,
        class_version: String,
    },

    /// No owning class could be found; kept as a free query operation
    UnassignedOperation { operation_id: String, path: String },

    /// No transport method name could be derived; not emitted
    UnmappableBinding { operation_id: String, path: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UndefinedClass { key } => {
                write!(f, "reference to undefined type {key}")
            }
            Diagnostic::VersionMismatch {
                operation_id,
                reference,
                path_version,
                class_version,
            } => write!(
                f,
                "{operation_id}: {reference} is {class_version} but the path is {path_version}"
            ),
            Diagnostic::UnassignedOperation { operation_id, path } => {
                write!(f, "{operation_id} ({path}) has no owning class")
            }
            Diagnostic::UnmappableBinding { operation_id, path } => {
                write!(f, "{operation_id} ({path}) has no transport method; not emitted")
            }
        }
    }
}

/// Ordered list of diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unassigned(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnassignedOperation { .. }))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
