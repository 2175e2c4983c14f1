//! Path operation ingestion
//!
//! Visits paths and their verbs in document order and builds one
//! [`Operation`] per verb. Path-template parameters come first, then the
//! declared ones; a `parameters` block under a path is folded into the
//! operation that precedes it.

use crate::swagger::{Parameter, PathEntry, Schema, SwaggerSpec};
use crate::type_mapper::{RefError, TypeMapper};
use kubemodel_common::naming::{group_token, strip_api_tokens, to_snake_case};
use kubemodel_common::{
    CompilerSession, Diagnostic, GeneratorError, OpParameter, OpResponse, Operation,
    OperationId, ParamLocation, Primitive, Result, TransportBinding, TypeRef, VersionTag,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("path parameter pattern is a valid regex"));

/// API group and version addressed by a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    /// Empty for the core group
    pub group: String,
    pub version: VersionTag,
}

impl ApiPath {
    /// Parse `/api/<version>/...` or `/apis/<group>/<version>/...`
    ///
    /// ```
    /// use kubemodel_parser::ApiPath;
    ///
    /// let core = ApiPath::parse("/api/v1/namespaces/{namespace}/pods").unwrap();
    /// assert_eq!(core.group, "");
    /// assert_eq!(core.version.to_string(), "v1");
    ///
    /// let apps = ApiPath::parse("/apis/apps/v1/deployments").unwrap();
    /// assert_eq!(apps.group, "apps");
    ///
    /// assert!(ApiPath::parse("/version/").is_none());
    /// assert!(ApiPath::parse("/apis/apps/").is_none());
    /// ```
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path.trim_start_matches('/').split('/');
        match segments.next()? {
            "api" => Some(Self {
                group: String::new(),
                version: VersionTag::parse(segments.next()?)?,
            }),
            "apis" => {
                let group = segments.next()?.to_string();
                let version = VersionTag::parse(segments.next()?)?;
                Some(Self { group, version })
            }
            _ => None,
        }
    }

    /// Symbolic transport binding for `operation_id` on this path, e.g.
    /// `CoreV1Api.read_namespaced_pod`
    pub fn binding(&self, operation_id: &str) -> TransportBinding {
        let group = group_token(&self.group);
        let version = self.version.token();
        let method = to_snake_case(&strip_api_tokens(operation_id, &group, &version, false));
        TransportBinding {
            api: format!("{group}{version}Api"),
            method,
        }
    }
}

/// Path-template parameter names in template order, without duplicates
///
/// Template order is intentional: it matches how the path reads, so
/// `/namespaces/{namespace}/pods/{name}` yields `namespace` before `name`.
pub fn template_parameters(path: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PATH_PARAM.captures_iter(path) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Ingest every operation of every path
pub fn ingest_paths(spec: &SwaggerSpec, session: &mut CompilerSession) -> Result<()> {
    for (path, item) in &spec.paths {
        let api = ApiPath::parse(path);
        let mut previous: Option<OperationId> = None;
        let mut held: Vec<Parameter> = Vec::new();

        for (key, value) in item {
            match PathEntry::from_entry(path, key, value)? {
                PathEntry::Parameters(params) => match previous {
                    Some(op) => fold_parameters(spec, session, op, &params)?,
                    None => held.extend(params),
                },
                PathEntry::Operation(verb, object) => {
                    let mut operation = Operation::new(
                        session.next_operation_id(),
                        verb,
                        path,
                        &object
                            .operation_id
                            .clone()
                            .unwrap_or_else(|| format!("{key}{path}")),
                        api.as_ref().map(|a| a.group.clone()),
                        api.as_ref().map(|a| a.version.clone()),
                    );
                    operation.description =
                        object.description.clone().or_else(|| object.summary.clone());
                    operation.gvk = object.gvk.clone();
                    if let Some(group) = operation.gvk.as_ref().map(|g| g.group.clone()) {
                        session.graph.learn_group(&group);
                    }
                    if let Some(group) = &operation.api_group {
                        session.graph.learn_group(group);
                    }

                    for name in template_parameters(path) {
                        attach(
                            &mut operation,
                            OpParameter {
                                name,
                                ty: TypeRef::Scalar(Primitive::String),
                                description: None,
                                required: true,
                                location: ParamLocation::Path,
                            },
                        );
                    }
                    let scope = Scope::of(&operation);
                    for param in &object.parameters {
                        let resolved = resolve_parameter(spec, session, &scope, param)?;
                        attach(&mut operation, resolved);
                    }
                    for (status, response) in &object.responses {
                        let ty = match &response.schema {
                            Some(schema) => Some(resolve_schema(session, &scope, schema)?),
                            None => None,
                        };
                        operation.responses.insert(
                            status.clone(),
                            OpResponse {
                                status: status.clone(),
                                description: response.description.clone(),
                                ty,
                            },
                        );
                    }

                    match &api {
                        Some(api) => operation.binding = Some(api.binding(&operation.operation_id)),
                        None => session.report(Diagnostic::UnmappableBinding {
                            operation_id: operation.operation_id.clone(),
                            path: path.clone(),
                        }),
                    }

                    let id = session.push_operation(operation);
                    if !held.is_empty() {
                        let params = std::mem::take(&mut held);
                        fold_parameters(spec, session, id, &params)?;
                    }
                    previous = Some(id);
                }
                PathEntry::Ignored => {
                    debug!(path = %path, key = %key, "skipping non-verb path entry");
                }
            }
        }

        if !held.is_empty() {
            debug!(path = %path, count = held.len(), "shared parameters without an operation");
        }
    }
    Ok(())
}

/// Fold a path-level `parameters` block into an already stored operation
fn fold_parameters(
    spec: &SwaggerSpec,
    session: &mut CompilerSession,
    op: OperationId,
    params: &[Parameter],
) -> Result<()> {
    let scope = Scope::of(session.operation(op));
    for param in params {
        let resolved = resolve_parameter(spec, session, &scope, param)?;
        attach(session.operation_mut(op), resolved);
    }
    Ok(())
}

/// Add a parameter to `operation`, suppressing repeated names
fn attach(operation: &mut Operation, param: OpParameter) {
    let existing = operation
        .self_parameter
        .iter_mut()
        .chain(operation.parameters.iter_mut())
        .find(|p| p.name == param.name);
    if let Some(existing) = existing {
        if existing.description.is_none() {
            existing.description = param.description;
        }
        return;
    }

    let receiver = matches!(param.ty, TypeRef::Class(_) | TypeRef::Any);
    if receiver && operation.self_parameter.is_none() {
        operation.body_any = param.location == ParamLocation::Body
            && param.name == "body"
            && param.ty == TypeRef::Any;
        operation.self_parameter = Some(param);
    } else {
        operation.parameters.push(param);
    }
}

/// What reference resolution needs to know about the operation
struct Scope {
    operation_id: String,
    api_version: Option<VersionTag>,
}

impl Scope {
    fn of(operation: &Operation) -> Self {
        Self {
            operation_id: operation.operation_id.clone(),
            api_version: operation.api_version.clone(),
        }
    }
}

fn resolve_parameter(
    spec: &SwaggerSpec,
    session: &mut CompilerSession,
    scope: &Scope,
    param: &Parameter,
) -> Result<OpParameter> {
    let param = match &param.ref_path {
        Some(ref_path) => spec.resolve_parameter_ref(ref_path).ok_or_else(|| {
            GeneratorError::UnresolvedReference {
                operation: scope.operation_id.clone(),
                reference: ref_path.clone(),
            }
        })?,
        None => param,
    };

    let ty = match &param.schema {
        Some(schema) => resolve_schema(session, scope, schema)?,
        None => TypeMapper::parameter_scalar(param.param_type.as_deref(), param.format.as_deref()),
    };

    Ok(OpParameter {
        name: param.name.clone(),
        ty,
        description: param.description.clone(),
        required: param.required,
        location: ParamLocation::parse(&param.location),
    })
}

/// Resolve a body or response schema, flagging classes from another version
fn resolve_schema(session: &mut CompilerSession, scope: &Scope, schema: &Schema) -> Result<TypeRef> {
    let ty = TypeMapper::schema_ref(schema, &session.graph).map_err(
        |RefError::Undefined(reference)| GeneratorError::UnresolvedReference {
            operation: scope.operation_id.clone(),
            reference,
        },
    )?;

    if let (TypeRef::Class(id), Some(path_version)) = (ty, &scope.api_version) {
        let class = session.graph.get(id);
        if let Some(class_version) = &class.name.version {
            if class_version != path_version {
                let diagnostic = Diagnostic::VersionMismatch {
                    operation_id: scope.operation_id.clone(),
                    reference: class.key.clone(),
                    path_version: path_version.to_string(),
                    class_version: class_version.to_string(),
                };
                session.report(diagnostic);
            }
        }
    }
    Ok(ty)
}
