//! Operation descriptors built from the schema's paths

use crate::model::{ClassId, Gvk, TypeRef};
use crate::naming::VersionTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of an operation inside the session's operation arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub usize);

/// HTTP verb of a wire operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HttpVerb {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpVerb {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "get" => Some(HttpVerb::Get),
            "put" => Some(HttpVerb::Put),
            "post" => Some(HttpVerb::Post),
            "delete" => Some(HttpVerb::Delete),
            "options" => Some(HttpVerb::Options),
            "head" => Some(HttpVerb::Head),
            "patch" => Some(HttpVerb::Patch),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpVerb::Get => "GET",
            HttpVerb::Put => "PUT",
            HttpVerb::Post => "POST",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Head => "HEAD",
            HttpVerb::Patch => "PATCH",
        };
        f.write_str(s)
    }
}

/// Canonical CRUD verbs that synthetic bindings are derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrudVerb {
    Create,
    Read,
    Update,
    Delete,
}

impl CrudVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudVerb::Create => "create",
            CrudVerb::Read => "read",
            CrudVerb::Update => "update",
            CrudVerb::Delete => "delete",
        }
    }
}

impl fmt::Display for CrudVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParamLocation {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "path" => ParamLocation::Path,
            "header" => ParamLocation::Header,
            "body" => ParamLocation::Body,
            "formData" => ParamLocation::FormData,
            _ => ParamLocation::Query,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpParameter {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    pub required: bool,
    pub location: ParamLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpResponse {
    pub status: String,
    pub description: Option<String>,
    pub ty: Option<TypeRef>,
}

impl OpResponse {
    /// True iff the response references a class
    pub fn is_object(&self) -> bool {
        self.class().is_some()
    }

    pub fn class(&self) -> Option<ClassId> {
        self.ty.and_then(|ty| ty.as_class())
    }

    pub fn is_success(&self) -> bool {
        self.status.starts_with('2')
    }
}

/// Symbolic transport call a binding delegates to, e.g.
/// `CoreV1Api.read_namespaced_pod`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportBinding {
    pub api: String,
    pub method: String,
}

/// Argument a synthetic binding may derive from the receiver when omitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedArgument {
    pub parameter: String,
    /// Dotted path into the receiver, e.g. `metadata.name`
    pub source: String,
}

/// Provenance of a synthesized CRUD binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub verb: CrudVerb,
    pub base_operation: String,
    pub derived: Vec<DerivedArgument>,
    pub contract: String,
}

/// One verb+path pair from the schema, or a binding synthesized from one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub verb: HttpVerb,
    pub path: String,
    pub operation_id: String,
    pub description: Option<String>,
    pub parameters: Vec<OpParameter>,
    pub self_parameter: Option<OpParameter>,
    /// The receiver candidate is a `body` parameter of untyped JSON
    pub body_any: bool,
    pub responses: BTreeMap<String, OpResponse>,
    pub gvk: Option<Gvk>,
    /// API group parsed from the path (`""` for the core group)
    pub api_group: Option<String>,
    pub api_version: Option<VersionTag>,
    pub owner: Option<ClassId>,
    pub is_class_level: bool,
    pub binding: Option<TransportBinding>,
    pub synthetic: Option<Synthesis>,
}

impl Operation {
    pub fn new(
        id: OperationId,
        verb: HttpVerb,
        path: &str,
        operation_id: &str,
        api_group: Option<String>,
        api_version: Option<VersionTag>,
    ) -> Self {
        Self {
            id,
            verb,
            path: path.to_string(),
            operation_id: operation_id.to_string(),
            description: None,
            parameters: Vec::new(),
            self_parameter: None,
            body_any: false,
            responses: BTreeMap::new(),
            gvk: None,
            api_group,
            api_version,
            owner: None,
            is_class_level: false,
            binding: None,
            synthetic: None,
        }
    }

    /// Receiver candidate followed by the remaining parameters
    pub fn all_parameters(&self) -> impl Iterator<Item = &OpParameter> {
        self.self_parameter.iter().chain(self.parameters.iter())
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.all_parameters().any(|p| p.name == name)
    }

    /// Responses with a 2xx status, in status-code order
    pub fn success_responses(&self) -> impl Iterator<Item = &OpResponse> {
        self.responses.values().filter(|r| r.is_success())
    }

    /// Whether the path template addresses one named object
    pub fn addresses_named_object(&self) -> bool {
        self.path.contains("{name}")
    }

    /// Every class this operation mentions in parameters or responses
    pub fn referenced_classes(&self) -> Vec<ClassId> {
        self.all_parameters()
            .filter_map(|p| p.ty.as_class())
            .chain(self.responses.values().filter_map(OpResponse::class))
            .collect()
    }

    /// Transport-less operations are kept in the model but never emitted
    pub fn is_emittable(&self) -> bool {
        self.binding.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Primitive;

    fn sample() -> Operation {
        let mut op = Operation::new(
            OperationId(0),
            HttpVerb::Get,
            "/api/v1/namespaces/{namespace}/pods/{name}",
            "readCoreV1NamespacedPod",
            Some(String::new()),
            VersionTag::parse("v1"),
        );
        op.parameters.push(OpParameter {
            name: "namespace".to_string(),
            ty: TypeRef::Scalar(Primitive::String),
            description: None,
            required: true,
            location: ParamLocation::Path,
        });
        op.responses.insert(
            "401".to_string(),
            OpResponse {
                status: "401".to_string(),
                description: Some("Unauthorized".to_string()),
                ty: None,
            },
        );
        op.responses.insert(
            "200".to_string(),
            OpResponse {
                status: "200".to_string(),
                description: Some("OK".to_string()),
                ty: Some(TypeRef::Class(ClassId(3))),
            },
        );
        op
    }

    #[test]
    fn test_success_responses_in_code_order() {
        let op = sample();
        let codes: Vec<&str> = op.success_responses().map(|r| r.status.as_str()).collect();
        assert_eq!(codes, vec!["200"]);
        assert!(op.responses["200"].is_object());
        assert!(!op.responses["401"].is_object());
    }

    #[test]
    fn test_referenced_classes_and_naming() {
        let op = sample();
        assert_eq!(op.referenced_classes(), vec![ClassId(3)]);
        assert!(op.addresses_named_object());
        assert!(op.has_parameter("namespace"));
        assert!(!op.has_parameter("name"));
    }

    #[test]
    fn test_verb_parsing() {
        assert_eq!(HttpVerb::parse("get"), Some(HttpVerb::Get));
        assert_eq!(HttpVerb::parse("PATCH"), Some(HttpVerb::Patch));
        assert_eq!(HttpVerb::parse("parameters"), None);
        assert_eq!(HttpVerb::Delete.to_string(), "DELETE");
    }
}
