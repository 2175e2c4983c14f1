//! Version-scoped compilation units

use crate::model::ClassId;
use crate::naming::VersionTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classes that share one API version (or have none)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// `None` for the unversioned unit
    pub version: Option<VersionTag>,
    /// Members in definition-key order
    pub classes: Vec<ClassId>,
    /// Versioned units this one imports from
    pub external_dependencies: BTreeSet<VersionTag>,
    /// Whether any member refers to an unversioned class
    pub uses_unversioned: bool,
}

impl CompilationUnit {
    pub fn new(version: Option<VersionTag>) -> Self {
        Self {
            version,
            classes: Vec::new(),
            external_dependencies: BTreeSet::new(),
            uses_unversioned: false,
        }
    }

    /// Module name for emission, e.g. `v1beta1` or `unversioned`
    pub fn module_name(&self) -> String {
        match &self.version {
            Some(version) => version.to_string(),
            None => "unversioned".to_string(),
        }
    }

    pub fn contains(&self, id: ClassId) -> bool {
        self.classes.contains(&id)
    }
}
