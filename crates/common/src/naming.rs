//! Qualified names, API version tags and identifier normalization
//!
//! Kubernetes definition keys look like `io.k8s.api.apps.v1.Deployment`: a
//! dotted group prefix, an optional version segment and a trailing type name.
//! This module splits and re-joins those keys, orders version tags, and
//! derives the method-name tokens the association heuristic works on.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VERSION_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(\d+)(?:([a-z]+)(\d+)?)?$").expect("version grammar is a valid regex")
});

/// An API version such as `v1`, `v1beta1` or `v2alpha3`
///
/// Ordering: a GA tag (no stage) is greater than every non-GA tag. GA tags
/// order by major number. Non-GA tags order by stage, then major, then minor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag {
    pub major: u32,
    pub stage: Option<String>,
    pub minor: Option<u32>,
}

impl VersionTag {
    /// Parse a version segment, returning `None` if it does not match the
    /// `v<major>[<stage>[<minor>]]` grammar
    ///
    /// # Examples
    /// ```
    /// use kubemodel_common::VersionTag;
    ///
    /// let tag = VersionTag::parse("v1beta2").unwrap();
    /// assert_eq!(tag.major, 1);
    /// assert_eq!(tag.stage.as_deref(), Some("beta"));
    /// assert_eq!(tag.minor, Some(2));
    /// assert!(VersionTag::parse("apps").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = VERSION_GRAMMAR.captures(raw)?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let stage = caps.get(2).map(|m| m.as_str().to_string());
        let minor = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            major,
            stage,
            minor,
        })
    }

    /// GA versions carry no alpha/beta/rc stage
    pub fn is_ga(&self) -> bool {
        self.stage.is_none()
    }

    /// Token used inside operation ids, e.g. `v1beta1` -> `V1beta1`
    pub fn token(&self) -> String {
        capitalize(&self.to_string())
    }
}

impl Ord for VersionTag {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.stage, &other.stage) {
            (None, None) => self.major.cmp(&other.major),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a
                .cmp(b)
                .then(self.major.cmp(&other.major))
                .then(self.minor.cmp(&other.minor)),
        }
    }
}

impl PartialOrd for VersionTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major)?;
        if let Some(stage) = &self.stage {
            write!(f, "{stage}")?;
        }
        if let Some(minor) = self.minor {
            write!(f, "{minor}")?;
        }
        Ok(())
    }
}

/// Canonical identity of a schema type: `(group, version, name)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    pub group: Option<String>,
    pub version: Option<VersionTag>,
    pub name: String,
}

impl QualifiedName {
    /// Split a dotted definition key. Never fails: keys without a version
    /// segment keep every leading segment in `group`, and a bare name has
    /// neither group nor version.
    ///
    /// # Examples
    /// ```
    /// use kubemodel_common::QualifiedName;
    ///
    /// let qn = QualifiedName::parse("io.k8s.api.apps.v1.Deployment");
    /// assert_eq!(qn.group.as_deref(), Some("io.k8s.api.apps"));
    /// assert_eq!(qn.version.unwrap().to_string(), "v1");
    /// assert_eq!(qn.name, "Deployment");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let segments: Vec<&str> = raw.split('.').collect();
        let (name, prefix) = match segments.split_last() {
            Some((name, prefix)) => (name.to_string(), prefix),
            None => (String::new(), &[][..]),
        };

        let (version, group_segments) = match prefix.split_last() {
            Some((candidate, rest)) => match VersionTag::parse(candidate) {
                Some(version) => (Some(version), rest),
                None => (None, prefix),
            },
            None => (None, prefix),
        };

        let group = if group_segments.is_empty() {
            None
        } else {
            Some(group_segments.join("."))
        };

        Self {
            group,
            version,
            name,
        }
    }

    /// Re-join into a dotted key, the left inverse of [`QualifiedName::parse`]
    pub fn join(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if let Some(group) = &self.group {
            parts.push(group.clone());
        }
        if let Some(version) = &self.version {
            parts.push(version.to_string());
        }
        parts.push(self.name.clone());
        parts.join(".")
    }

    /// Last segment of the dotted group, e.g. `io.k8s.api.apps` -> `apps`
    pub fn short_group(&self) -> Option<&str> {
        self.group.as_deref().and_then(|g| g.rsplit('.').next())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

/// Rust keywords that cannot be used as field identifiers
const RESERVED_WORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "final", "fn", "for", "if", "impl", "in", "let", "loop", "macro", "match",
    "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "self", "static", "struct",
    "super", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual",
    "where", "while", "yield",
];

/// Append `_` to identifiers that collide with a reserved word
pub fn escape_keyword(ident: &str) -> String {
    if RESERVED_WORDS.contains(&ident) {
        format!("{ident}_")
    } else {
        ident.to_string()
    }
}

/// Normalize a wire property name into a field identifier
///
/// `$ref` -> `ref_`, `apiVersion` -> `api_version`, `x-kubernetes-foo` ->
/// `x_kubernetes_foo`.
pub fn normalize_property_name(wire_name: &str) -> String {
    let trimmed = wire_name.trim_start_matches('$');
    escape_keyword(&to_snake_case(trimmed))
}

/// Convert PascalCase or camelCase to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            // Break before an uppercase letter that follows a lowercase letter
            // or digit, or that starts a new word after an acronym
            // (HTTPServer -> http_server).
            let should_add_underscore = i > 0
                && (chars[i - 1].is_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (i + 1 < chars.len() && chars[i + 1].is_lowercase()));

            if should_add_underscore && !result.ends_with('_') {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' || ch == '.' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else {
            result.push(ch);
        }
    }

    while result.contains("__") {
        result = result.replace("__", "_");
    }

    result.trim_matches('_').to_string()
}

/// Uppercase the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Token an API group contributes to operation ids
///
/// ```
/// use kubemodel_common::naming::group_token;
///
/// assert_eq!(group_token(""), "Core");
/// assert_eq!(group_token("apps"), "Apps");
/// assert_eq!(group_token("rbac.authorization.k8s.io"), "RbacAuthorization");
/// ```
pub fn group_token(api_group: &str) -> String {
    let trimmed = api_group.strip_suffix(".k8s.io").unwrap_or(api_group);
    if trimmed.is_empty() || trimmed == "core" {
        return "Core".to_string();
    }
    trimmed.split('.').map(capitalize).collect()
}

/// Remove the `{group}{version}` tokens from an operation id
///
/// With `keep_group` only the version token is removed. If the group token
/// does not directly precede the version token, only the version token is
/// removed. Matches must end on a word boundary so `V1` never eats the
/// front of `V1beta1`.
///
/// ```
/// use kubemodel_common::naming::strip_api_tokens;
///
/// assert_eq!(
///     strip_api_tokens("readCoreV1NamespacedPod", "Core", "V1", false),
///     "readNamespacedPod"
/// );
/// assert_eq!(
///     strip_api_tokens("listStorageV1StorageClass", "Storage", "V1", true),
///     "listStorageStorageClass"
/// );
/// assert_eq!(strip_api_tokens("readNamespacedPod", "Core", "V1", false), "readNamespacedPod");
/// ```
pub fn strip_api_tokens(
    operation_id: &str,
    group_token: &str,
    version_token: &str,
    keep_group: bool,
) -> String {
    let combined = format!("{group_token}{version_token}");
    if let Some(at) = find_token(operation_id, &combined) {
        let replacement = if keep_group { group_token } else { "" };
        return format!(
            "{}{}{}",
            &operation_id[..at],
            replacement,
            &operation_id[at + combined.len()..]
        );
    }
    if let Some(at) = find_token(operation_id, version_token) {
        return format!(
            "{}{}",
            &operation_id[..at],
            &operation_id[at + version_token.len()..]
        );
    }
    operation_id.to_string()
}

fn find_token(haystack: &str, token: &str) -> Option<usize> {
    if token.is_empty() {
        return None;
    }
    haystack.match_indices(token).map(|(at, _)| at).find(|&at| {
        haystack[at + token.len()..]
            .chars()
            .next()
            .map_or(true, |next| !(next.is_lowercase() || next.is_ascii_digit()))
    })
}

/// Split a method name into lowercase word tokens
///
/// ```
/// use kubemodel_common::naming::method_tokens;
///
/// assert_eq!(method_tokens("readNamespacedPod"), vec!["read", "namespaced", "pod"]);
/// assert_eq!(method_tokens("readAPIService"), vec!["read", "api", "service"]);
/// ```
pub fn method_tokens(method_name: &str) -> Vec<String> {
    to_snake_case(method_name)
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
