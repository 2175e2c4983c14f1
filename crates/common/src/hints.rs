//! Schema hints loaded from YAML
//!
//! The Kubernetes schema defines some kinds more than once across groups
//! (`Scale` in `apps` and `autoscaling`, `Event` in core and `events`).
//! A hint file names the `(version, group)` combinations that should be
//! treated as canonical for such kinds, and lists the API groups whose
//! token stays in derived method names.

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Groups whose token is kept when deriving method names from operation ids
pub const DEFAULT_UNSTRIPPED_GROUPS: &[&str] = &["Storage"];

/// One canonical `(version, group)` pair for a kind
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct PreferredVersion {
    pub version: String,
    /// GVK group; empty or `core` for the core group
    #[serde(default)]
    pub group: String,
}

/// Root structure of a hint file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelHints {
    /// Kind name -> canonical combinations. A kind with no entry accepts
    /// every combination.
    #[serde(default)]
    pub preferred_versions: BTreeMap<String, Vec<PreferredVersion>>,

    /// Group tokens (e.g. `Storage`) left in place when stripping API tokens
    #[serde(default = "default_unstripped_groups")]
    pub unstripped_groups: Vec<String>,
}

fn default_unstripped_groups() -> Vec<String> {
    DEFAULT_UNSTRIPPED_GROUPS
        .iter()
        .map(|g| g.to_string())
        .collect()
}

impl Default for ModelHints {
    fn default() -> Self {
        Self {
            preferred_versions: BTreeMap::new(),
            unstripped_groups: default_unstripped_groups(),
        }
    }
}

impl ModelHints {
    /// Load hints from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Parse(format!("Failed to read hints file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            GeneratorError::Parse(format!("Failed to parse hints YAML from {:?}: {}", path, e))
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Whether `(version, group)` is acceptable for `kind`
    pub fn is_preferred(&self, kind: &str, version: Option<&str>, group: &str) -> bool {
        let Some(preferred) = self.preferred_versions.get(kind) else {
            return true;
        };
        preferred.iter().any(|p| {
            Some(p.version.as_str()) == version && same_group(&p.group, group)
        })
    }

    pub fn has_preference(&self, kind: &str) -> bool {
        self.preferred_versions.contains_key(kind)
    }

    pub fn keeps_group(&self, group_token: &str) -> bool {
        self.unstripped_groups.iter().any(|g| g == group_token)
    }
}

fn same_group(a: &str, b: &str) -> bool {
    let normalize = |g: &str| match g {
        "" | "core" => String::new(),
        other => other.split('.').next().unwrap_or_default().to_string(),
    };
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HINTS: &str = r#"
preferred_versions:
  Scale:
    - version: v1
      group: autoscaling
  Event:
    - version: v1
      group: ""
unstripped_groups: [Storage, Events]
"#;

    #[test]
    fn test_parse_hints() {
        let hints = ModelHints::from_yaml(HINTS).unwrap();
        assert_eq!(hints.preferred_versions.len(), 2);
        assert!(hints.keeps_group("Events"));
        assert!(!hints.keeps_group("Core"));
    }

    #[test]
    fn test_preference_lookup() {
        let hints = ModelHints::from_yaml(HINTS).unwrap();
        assert!(hints.is_preferred("Scale", Some("v1"), "autoscaling"));
        assert!(!hints.is_preferred("Scale", Some("v1beta2"), "apps"));
        assert!(hints.is_preferred("Event", Some("v1"), "core"));
        assert!(!hints.is_preferred("Event", Some("v1"), "events.k8s.io"));
        // No entry: everything is acceptable
        assert!(hints.is_preferred("Pod", Some("v1"), ""));
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let hints = ModelHints::from_yaml("preferred_versions: {}").unwrap();
        assert_eq!(hints.unstripped_groups, vec!["Storage".to_string()]);
        assert_eq!(ModelHints::default().unstripped_groups, hints.unstripped_groups);
    }

    #[test]
    fn test_load_missing_file_is_parse_error() {
        let err = ModelHints::load(Path::new("/nonexistent/hints.yaml")).unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)));
    }
}
