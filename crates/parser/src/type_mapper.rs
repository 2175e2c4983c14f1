//! Type mapping from Swagger schemas to the intermediate representation
//!
//! Maps property schemas to [`FieldType`] and parameter/response schemas to
//! [`TypeRef`]. Property references intern placeholders in the class graph;
//! parameter and response references must name a defined class.

use crate::swagger::{definition_key, Schema};
use kubemodel_common::{ClassGraph, FieldType, Primitive, TypeRef};

/// Maps schema fragments to IR types
pub struct TypeMapper;

/// Why a parameter or response schema could not be mapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefError {
    /// The referenced definition does not exist
    Undefined(String),
}

impl TypeMapper {
    /// Map a scalar `type`/`format` pair through the primitive table
    ///
    /// # Examples
    /// ```
    /// use kubemodel_parser::TypeMapper;
    /// use kubemodel_common::Primitive;
    ///
    /// assert_eq!(TypeMapper::map_scalar("string", None), Some(Primitive::String));
    /// assert_eq!(TypeMapper::map_scalar("integer", Some("int64")), Some(Primitive::Integer));
    /// assert_eq!(TypeMapper::map_scalar("array", None), None);
    /// ```
    pub fn map_scalar(schema_type: &str, format: Option<&str>) -> Option<Primitive> {
        Primitive::from_schema(schema_type, format)
    }

    /// Map a property (or alias) schema to a field type
    ///
    /// Returns `None` when an array has no resolvable item type at any depth.
    /// A `$ref` to a definition not yet ingested interns a placeholder.
    pub fn field_type(schema: &Schema, graph: &mut ClassGraph) -> Option<FieldType> {
        if let Some(ref_path) = &schema.ref_path {
            let id = graph.intern(definition_key(ref_path));
            return Some(FieldType::Scalar(TypeRef::Class(id)));
        }

        match schema.schema_type.as_deref() {
            Some("array") => {
                let items = schema.items.as_deref()?;
                Self::item_type(items, graph).map(|item| FieldType::List(Box::new(item)))
            }
            Some("object") if schema.has_additional_properties() => Some(FieldType::Map),
            Some("object") | None => Some(FieldType::Freeform),
            Some(other) => Some(
                Self::map_scalar(other, schema.format.as_deref())
                    .map(|p| FieldType::Scalar(TypeRef::Scalar(p)))
                    .unwrap_or(FieldType::Freeform),
            ),
        }
    }

    /// Array items need a `$ref` or a known `type`
    fn item_type(items: &Schema, graph: &mut ClassGraph) -> Option<FieldType> {
        if items.ref_path.is_some() {
            return Self::field_type(items, graph);
        }
        match items.schema_type.as_deref()? {
            "array" | "object" => Self::field_type(items, graph),
            other => Self::map_scalar(other, items.format.as_deref())
                .map(|p| FieldType::Scalar(TypeRef::Scalar(p))),
        }
    }

    /// Map a parameter body or response schema to a type reference
    ///
    /// References must name a defined class. A class that merely aliases a
    /// scalar or freeform value collapses to what it aliases, so an untyped
    /// `Patch` body is `Any`.
    pub fn schema_ref(schema: &Schema, graph: &ClassGraph) -> Result<TypeRef, RefError> {
        if let Some(ref_path) = &schema.ref_path {
            let key = definition_key(ref_path);
            let class = graph
                .by_key(key)
                .filter(|c| c.defined)
                .ok_or_else(|| RefError::Undefined(ref_path.clone()))?;
            return Ok(match &class.alias {
                None => TypeRef::Class(class.id),
                Some(FieldType::Scalar(ty)) => *ty,
                Some(_) => TypeRef::Any,
            });
        }

        Ok(match schema.schema_type.as_deref() {
            Some("object") | Some("array") | None => TypeRef::Any,
            Some(other) => Self::map_scalar(other, schema.format.as_deref())
                .map(TypeRef::Scalar)
                .unwrap_or(TypeRef::Any),
        })
    }

    /// Map a non-body parameter's declared `type`; unknown types are strings
    pub fn parameter_scalar(param_type: Option<&str>, format: Option<&str>) -> TypeRef {
        TypeRef::Scalar(
            param_type
                .and_then(|t| Self::map_scalar(t, format))
                .unwrap_or(Primitive::String),
        )
    }
}
