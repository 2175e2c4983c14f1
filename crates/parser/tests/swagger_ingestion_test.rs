//! Integration test for Swagger ingestion against a trimmed Kubernetes schema

use kubemodel_common::{
    CompilerSession, Diagnostic, FieldType, ModelHints, Operation, ParamLocation, Primitive,
    TypeRef,
};
use kubemodel_parser::{parse_schema, SwaggerParser};
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/k8s-mini.json")
}

fn session() -> CompilerSession {
    parse_schema(&fixture(), ModelHints::default()).unwrap()
}

fn operation<'a>(session: &'a CompilerSession, operation_id: &str) -> &'a Operation {
    session
        .operations()
        .find(|op| op.operation_id == operation_id)
        .unwrap_or_else(|| panic!("no operation {operation_id}"))
}

#[test]
fn test_every_definition_becomes_a_class() {
    let parser = SwaggerParser::from_file(fixture()).unwrap();
    let session = parser.parse().unwrap();

    let defined = session.graph.iter().filter(|c| c.defined).count();
    assert_eq!(defined, parser.spec().definitions.len());

    // PodCondition is referenced but never defined
    let placeholders: Vec<&str> = session.graph.placeholders().map(|c| c.key.as_str()).collect();
    assert_eq!(placeholders, vec!["io.k8s.api.core.v1.PodCondition"]);
    assert!(session.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::UndefinedClass { key } if key == "io.k8s.api.core.v1.PodCondition"
    )));
}

#[test]
fn test_pod_class_shape() {
    let session = session();
    let pod = session.graph.by_key("io.k8s.api.core.v1.Pod").unwrap();
    assert!(pod.is_document);
    assert_eq!(pod.kind.as_deref(), Some("Pod"));
    assert_eq!(pod.api_version().as_deref(), Some("v1"));

    let names: Vec<&str> = pod.properties().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["api_version", "kind", "metadata", "spec", "status"]);

    let spec = session.graph.by_key("io.k8s.api.core.v1.PodSpec").unwrap();
    let container = session.graph.lookup("io.k8s.api.core.v1.Container").unwrap();
    let containers = spec
        .required_properties
        .iter()
        .find(|p| p.wire_name == "containers")
        .unwrap();
    assert_eq!(
        containers.field_type,
        FieldType::List(Box::new(FieldType::Scalar(TypeRef::Class(container))))
    );
    let selector = spec.properties().find(|p| p.wire_name == "nodeSelector").unwrap();
    assert_eq!(selector.field_type, FieldType::Map);
}

#[test]
fn test_alias_and_unversioned_classes() {
    let session = session();
    let quantity = session
        .graph
        .by_key("io.k8s.apimachinery.pkg.api.resource.Quantity")
        .unwrap();
    assert!(quantity.name.version.is_none());
    assert_eq!(
        quantity.alias,
        Some(FieldType::Scalar(TypeRef::Scalar(Primitive::String)))
    );

    let status = session
        .graph
        .by_key("io.k8s.apimachinery.pkg.apis.meta.v1.Status")
        .unwrap();
    assert!(status.is_status());
    assert!(status.is_document);
}

#[test]
fn test_read_namespaced_pod_parameters() {
    let session = session();
    let read = operation(&session, "readCoreV1NamespacedPod");

    let names: Vec<&str> = read.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["namespace", "name"]);
    assert!(read.self_parameter.is_none());
    for param in &read.parameters {
        assert!(param.required);
        assert_eq!(param.location, ParamLocation::Path);
        assert_eq!(param.ty, TypeRef::Scalar(Primitive::String));
    }

    let binding = read.binding.as_ref().unwrap();
    assert_eq!(binding.api, "CoreV1Api");
    assert_eq!(binding.method, "read_namespaced_pod");
}

#[test]
fn test_shared_parameters_fold_into_preceding_operation() {
    let session = session();

    let delete = operation(&session, "deleteCoreV1NamespacedPod");
    let names: Vec<&str> = delete.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["namespace", "name", "gracePeriodSeconds", "pretty"]);
    assert_eq!(delete.parameters[1].description.as_deref(), Some("name of the Pod"));

    let list = operation(&session, "listCoreV1NamespacedPod");
    assert!(list.has_parameter("pretty"));
    let create = operation(&session, "createCoreV1NamespacedPod");
    assert!(!create.has_parameter("pretty"));
}

#[test]
fn test_patch_body_is_any() {
    let session = session();
    let patch = operation(&session, "patchCoreV1NamespacedPod");
    assert!(patch.body_any);
    assert_eq!(patch.self_parameter.as_ref().map(|p| p.ty), Some(TypeRef::Any));
}

#[test]
fn test_soft_diagnostics() {
    let session = session();

    let mismatched: Vec<&str> = session
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::VersionMismatch { operation_id, .. } => Some(operation_id.as_str()),
            _ => None,
        })
        .collect();
    assert!(mismatched.contains(&"deleteAppsV1beta2NamespacedDeployment"));
    assert!(mismatched.contains(&"readAppsV1beta2NamespacedDeploymentScale"));
    assert!(!mismatched.contains(&"readCoreV1NamespacedPod"));

    let unmappable: Vec<&str> = session
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::UnmappableBinding { operation_id, .. } => Some(operation_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(unmappable, vec!["logFileListHandler", "getCodeVersion"]);
    assert!(!operation(&session, "getCodeVersion").is_emittable());
}

#[test]
fn test_operations_keep_document_order() {
    let session = session();
    let ids: Vec<&str> = session
        .operations()
        .take(4)
        .map(|op| op.operation_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "deleteCoreV1CollectionNamespacedPod",
            "listCoreV1NamespacedPod",
            "createCoreV1NamespacedPod",
            "deleteCoreV1NamespacedPod",
        ]
    );
}

#[test]
fn test_ingestion_is_deterministic() {
    let first = session();
    let second = session();

    let keys = |s: &CompilerSession| s.graph.iter().map(|c| c.key.clone()).collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));

    let ops = |s: &CompilerSession| s.operations().cloned().collect::<Vec<_>>();
    assert_eq!(ops(&first), ops(&second));
}

#[test]
fn test_malformed_verb_fails_the_parse() {
    let json = r#"{
        "swagger": "2.0",
        "definitions": {},
        "paths": {
            "/api/v1/namespaces/{namespace}/pods/{name}": {
                "get": {
                    "operationId": "readCoreV1NamespacedPod",
                    "x-kubernetes-group-version-kind": {"group": "", "version": "v1"},
                    "responses": {}
                }
            }
        }
    }"#;
    let parser = SwaggerParser::from_json(json).unwrap();
    let err = parser.parse().unwrap_err();
    assert!(err.to_string().contains("invalid `get` operation"));
}
