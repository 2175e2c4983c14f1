//! Type definition ingestion
//!
//! Visits `definitions` in key order and fills one class descriptor per
//! entry. Property references are resolved on the spot: a `$ref` to a key not
//! visited yet interns a placeholder that the later visit completes in place.

use crate::swagger::Schema;
use crate::type_mapper::TypeMapper;
use kubemodel_common::naming::normalize_property_name;
use kubemodel_common::{
    ClassId, CompilerSession, Diagnostic, GeneratorError, Gvk, PropertyDescriptor, Result,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Ingest every definition, then report references that were never defined
pub fn ingest_definitions(
    definitions: &BTreeMap<String, Schema>,
    session: &mut CompilerSession,
) -> Result<()> {
    for (key, schema) in definitions {
        ingest_definition(key, schema, session)?;
    }
    finalize(session);
    Ok(())
}

fn ingest_definition(key: &str, schema: &Schema, session: &mut CompilerSession) -> Result<()> {
    let id = session.graph.intern(key);
    for gvk in &schema.gvk {
        session.graph.learn_group(&gvk.group);
    }
    {
        let class = session.graph.get_mut(id);
        class.defined = true;
        class.description = schema.description.clone();
        let version = class.name.version.as_ref().map(|v| v.to_string());
        if let Some(gvk) = select_gvk(&schema.gvk, version) {
            class.kind = Some(gvk.kind.clone());
            class.gvk = Some(gvk);
        }
    }

    let Some(properties) = &schema.properties else {
        let alias = TypeMapper::field_type(schema, &mut session.graph).ok_or_else(|| {
            GeneratorError::UnresolvableItemType {
                class: key.to_string(),
                property: "items".to_string(),
            }
        })?;
        debug!(class = key, ?alias, "alias definition");
        session.graph.get_mut(id).alias = Some(alias);
        return Ok(());
    };

    for (wire_name, property) in properties {
        let field_type = TypeMapper::field_type(property, &mut session.graph).ok_or_else(|| {
            GeneratorError::UnresolvableItemType {
                class: key.to_string(),
                property: wire_name.clone(),
            }
        })?;
        let descriptor = PropertyDescriptor {
            name: normalize_property_name(wire_name),
            wire_name: wire_name.clone(),
            field_type,
            required: schema.required.iter().any(|r| r == wire_name),
            description: property.description.clone(),
            default_hint: default_hint(session, id, wire_name),
        };
        session.graph.get_mut(id).add_property(descriptor);
    }
    session.graph.get_mut(id).finalize_properties();

    Ok(())
}

/// The GVK entry whose version matches the class version, else the first
fn select_gvk(entries: &[Gvk], version: Option<String>) -> Option<Gvk> {
    entries
        .iter()
        .find(|gvk| Some(&gvk.version) == version.as_ref())
        .or_else(|| entries.first())
        .cloned()
}

/// Defaults for the `kind` and `apiVersion` discriminators
fn default_hint(session: &CompilerSession, id: ClassId, wire_name: &str) -> Option<String> {
    let class = session.graph.get(id);
    match wire_name {
        "kind" => Some(
            class
                .kind
                .clone()
                .unwrap_or_else(|| class.short_name().to_string()),
        ),
        "apiVersion" => class.api_version(),
        _ => None,
    }
}

fn finalize(session: &mut CompilerSession) {
    session.graph.settle_groups();
    let undefined: Vec<String> = session
        .graph
        .placeholders()
        .map(|class| class.key.clone())
        .collect();
    for key in undefined {
        session.report(Diagnostic::UndefinedClass { key });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubemodel_common::{FieldType, ModelHints, Primitive, TypeRef};

    fn definitions(json: &str) -> BTreeMap<String, Schema> {
        serde_json::from_str(json).unwrap()
    }

    fn ingest(json: &str) -> CompilerSession {
        let mut session = CompilerSession::new(ModelHints::default());
        ingest_definitions(&definitions(json), &mut session).unwrap();
        session
    }

    const PODS: &str = r##"{
        "io.k8s.api.core.v1.Pod": {
            "description": "Pod is a collection of containers.",
            "properties": {
                "apiVersion": {"type": "string"},
                "kind": {"type": "string"},
                "metadata": {"$ref": "#/definitions/io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta"},
                "spec": {"$ref": "#/definitions/io.k8s.api.core.v1.PodSpec"}
            },
            "x-kubernetes-group-version-kind": [
                {"group": "", "kind": "Pod", "version": "v1"}
            ]
        },
        "io.k8s.api.core.v1.PodSpec": {
            "required": ["containers"],
            "properties": {
                "containers": {"type": "array", "items": {"type": "string"}},
                "nodeName": {"type": "string"}
            }
        },
        "io.k8s.apimachinery.pkg.apis.meta.v1.Time": {
            "type": "string",
            "format": "date-time"
        }
    }"##;

    #[test]
    fn test_forward_reference_is_filled_in_place() {
        let session = ingest(PODS);
        let pod = session.graph.by_key("io.k8s.api.core.v1.Pod").unwrap();
        let spec_id = session.graph.lookup("io.k8s.api.core.v1.PodSpec").unwrap();

        let spec_prop = pod.properties().find(|p| p.wire_name == "spec").unwrap();
        assert_eq!(spec_prop.field_type, FieldType::Scalar(TypeRef::Class(spec_id)));
        assert!(session.graph.get(spec_id).defined);
        assert_eq!(session.graph.get(spec_id).required_properties.len(), 1);
    }

    #[test]
    fn test_discriminator_defaults_and_document_flag() {
        let session = ingest(PODS);
        let pod = session.graph.by_key("io.k8s.api.core.v1.Pod").unwrap();
        assert!(pod.is_document);
        assert_eq!(pod.kind.as_deref(), Some("Pod"));

        let hint = |wire: &str| {
            pod.properties()
                .find(|p| p.wire_name == wire)
                .and_then(|p| p.default_hint.clone())
        };
        assert_eq!(hint("kind").as_deref(), Some("Pod"));
        assert_eq!(hint("apiVersion").as_deref(), Some("v1"));
        assert_eq!(hint("metadata"), None);
    }

    #[test]
    fn test_alias_definition() {
        let session = ingest(PODS);
        let time = session
            .graph
            .by_key("io.k8s.apimachinery.pkg.apis.meta.v1.Time")
            .unwrap();
        assert_eq!(
            time.alias,
            Some(FieldType::Scalar(TypeRef::Scalar(Primitive::DateTime)))
        );
        assert!(time.properties().next().is_none());
    }

    #[test]
    fn test_undefined_reference_is_soft() {
        let session = ingest(PODS);
        let undefined: Vec<String> = session
            .diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::UndefinedClass { key } => key.clone(),
                other => panic!("unexpected diagnostic {other}"),
            })
            .collect();
        assert_eq!(
            undefined,
            vec!["io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta".to_string()]
        );

        let pod = session.graph.by_key("io.k8s.api.core.v1.Pod").unwrap();
        let metadata = pod.properties().find(|p| p.wire_name == "metadata").unwrap();
        let target = metadata.field_type.referenced_class().unwrap();
        assert!(!session.graph.get(target).defined);
    }

    #[test]
    fn test_unresolvable_items_is_hard_error() {
        let json = r#"{
            "io.k8s.api.core.v1.PodSpec": {
                "properties": {"volumes": {"type": "array", "items": {}}}
            }
        }"#;
        let mut session = CompilerSession::new(ModelHints::default());
        let err = ingest_definitions(&definitions(json), &mut session).unwrap_err();
        match err {
            GeneratorError::UnresolvableItemType { class, property } => {
                assert_eq!(class, "io.k8s.api.core.v1.PodSpec");
                assert_eq!(property, "volumes");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_gvk_matching_class_version_wins() {
        let json = r#"{
            "io.k8s.apimachinery.pkg.apis.meta.v1.DeleteOptions": {
                "properties": {"kind": {"type": "string"}},
                "x-kubernetes-group-version-kind": [
                    {"group": "", "kind": "DeleteOptions", "version": "v1"},
                    {"group": "apps", "kind": "DeleteOptions", "version": "v1beta2"}
                ]
            },
            "io.k8s.api.apps.v1beta2.Thing": {
                "properties": {},
                "x-kubernetes-group-version-kind": [
                    {"group": "", "kind": "Thing", "version": "v1"},
                    {"group": "apps", "kind": "Thing", "version": "v1beta2"}
                ]
            }
        }"#;
        let session = ingest(json);
        let thing = session.graph.by_key("io.k8s.api.apps.v1beta2.Thing").unwrap();
        assert_eq!(thing.gvk.as_ref().map(|g| g.group.as_str()), Some("apps"));
        let options = session
            .graph
            .by_key("io.k8s.apimachinery.pkg.apis.meta.v1.DeleteOptions")
            .unwrap();
        assert_eq!(options.gvk.as_ref().map(|g| g.group.as_str()), Some(""));
    }

    #[test]
    fn test_keyword_property_names() {
        let json = r#"{
            "io.k8s.apimachinery.pkg.apis.meta.v1.ListMeta": {
                "properties": {
                    "continue": {"type": "string"},
                    "resourceVersion": {"type": "string"}
                }
            }
        }"#;
        let session = ingest(json);
        let meta = session
            .graph
            .by_key("io.k8s.apimachinery.pkg.apis.meta.v1.ListMeta")
            .unwrap();
        let names: Vec<&str> = meta.properties().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["continue_", "resource_version"]);
    }

    #[test]
    fn test_dotted_groups_reach_classes_without_gvk() {
        let json = r##"{
            "io.k8s.api.rbac.v1.PolicyRule": {
                "properties": {
                    "apiVersion": {"type": "string"},
                    "verbs": {"type": "array", "items": {"type": "string"}}
                }
            },
            "io.k8s.api.rbac.v1.Role": {
                "properties": {
                    "rules": {"type": "array", "items": {"$ref": "#/definitions/io.k8s.api.rbac.v1.PolicyRule"}}
                },
                "x-kubernetes-group-version-kind": [
                    {"group": "rbac.authorization.k8s.io", "kind": "Role", "version": "v1"}
                ]
            }
        }"##;
        let session = ingest(json);
        let rule = session.graph.by_key("io.k8s.api.rbac.v1.PolicyRule").unwrap();
        assert_eq!(rule.api_group(), "rbac.authorization.k8s.io");
        assert_eq!(
            rule.api_version().as_deref(),
            Some("rbac.authorization.k8s.io/v1")
        );
        let api_version = rule.properties().find(|p| p.wire_name == "apiVersion").unwrap();
        assert_eq!(
            api_version.default_hint.as_deref(),
            Some("rbac.authorization.k8s.io/v1")
        );
    }
}
