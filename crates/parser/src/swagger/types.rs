//! Swagger 2.0 type definitions
//!
//! Simplified representation covering what the Kubernetes schema uses:
//! `definitions`, `paths`, shared `parameters` and the `x-kubernetes-*`
//! extensions.

use indexmap::IndexMap;
use kubemodel_common::{GeneratorError, Gvk, HttpVerb, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of `$ref`s into the definitions map
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Prefix of `$ref`s into the shared parameters map
pub const PARAMETERS_PREFIX: &str = "#/parameters/";

/// Swagger document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwaggerSpec {
    /// Swagger version (e.g., "2.0")
    #[serde(default)]
    pub swagger: String,

    /// API metadata
    #[serde(default)]
    pub info: Info,

    /// Type definitions keyed by dotted qualified name
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,

    /// URL templates in document order
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Parameters shared through `#/parameters/...` references
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
}

/// API information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,
}

/// Entries under one path in document order, kept raw until
/// [`PathEntry::from_entry`] decides what each key holds
pub type PathItem = IndexMap<String, serde_json::Value>;

/// One typed entry of a path item
#[derive(Debug, Clone)]
pub enum PathEntry {
    /// The `parameters` block
    Parameters(Vec<Parameter>),

    /// A verb
    Operation(HttpVerb, Box<OperationObject>),

    /// Vendor extensions and keys that are neither verbs nor parameters
    Ignored,
}

impl PathEntry {
    /// Type the entry under `key` of `path`
    ///
    /// The key decides the shape: a verb whose object does not deserialize
    /// is an error rather than an ignored entry.
    pub fn from_entry(path: &str, key: &str, value: &serde_json::Value) -> Result<Self> {
        if key == "parameters" {
            return Vec::<Parameter>::deserialize(value)
                .map(PathEntry::Parameters)
                .map_err(|e| {
                    GeneratorError::Parse(format!("{path}: invalid parameters block: {e}"))
                });
        }
        if key.starts_with("x-") {
            return Ok(PathEntry::Ignored);
        }
        match HttpVerb::parse(key) {
            Some(verb) => OperationObject::deserialize(value)
                .map(|object| PathEntry::Operation(verb, Box::new(object)))
                .map_err(|e| GeneratorError::Parse(format!("{path}: invalid `{key}` operation: {e}"))),
            None => Ok(PathEntry::Ignored),
        }
    }
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationObject {
    #[serde(rename = "operationId")]
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Responses keyed by status code
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Group/version/kind the operation acts on
    #[serde(rename = "x-kubernetes-group-version-kind")]
    #[serde(default)]
    pub gvk: Option<Gvk>,

    /// Kubernetes verb (get, list, watch, ...)
    #[serde(rename = "x-kubernetes-action")]
    #[serde(default)]
    pub action: Option<String>,
}

/// Parameter definition, possibly a reference to a shared one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,

    /// Location: query, header, path, body, formData
    #[serde(rename = "in")]
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Scalar type for non-body parameters
    #[serde(rename = "type")]
    #[serde(default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub format: Option<String>,

    /// Body schema
    #[serde(default)]
    pub schema: Option<Schema>,

    /// Reference into the shared parameters map
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,
}

/// Response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Schema definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Type: string, number, integer, boolean, array, object
    #[serde(rename = "type")]
    #[serde(default)]
    pub schema_type: Option<String>,

    /// Format (e.g., int32, int64, date-time)
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Properties; `None` when the key is absent, which marks an alias type
    #[serde(default)]
    pub properties: Option<BTreeMap<String, Schema>>,

    /// Required properties
    #[serde(default)]
    pub required: Vec<String>,

    /// Items schema (for array type)
    #[serde(default)]
    pub items: Option<Box<Schema>>,

    /// Additional properties: a schema, or `true`/`false`
    #[serde(rename = "additionalProperties")]
    #[serde(default)]
    pub additional_properties: Option<serde_json::Value>,

    /// Reference
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,

    /// Group/version/kind discriminators of top-level API objects
    #[serde(rename = "x-kubernetes-group-version-kind")]
    #[serde(default)]
    pub gvk: Vec<Gvk>,
}

impl Schema {
    /// Whether `additionalProperties` is present and not `false`
    pub fn has_additional_properties(&self) -> bool {
        !matches!(
            self.additional_properties,
            None | Some(serde_json::Value::Bool(false))
        )
    }
}

impl SwaggerSpec {
    /// Look up a shared parameter by `#/parameters/<name>` reference
    pub fn resolve_parameter_ref(&self, ref_path: &str) -> Option<&Parameter> {
        let name = ref_path.strip_prefix(PARAMETERS_PREFIX)?;
        self.parameters.get(name)
    }
}

/// Definition key of a `#/definitions/<key>` reference
pub fn definition_key(ref_path: &str) -> &str {
    ref_path
        .strip_prefix(DEFINITIONS_PREFIX)
        .unwrap_or_else(|| ref_path.rsplit('/').next().unwrap_or(ref_path))
}
