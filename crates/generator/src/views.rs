//! Serializable views handed to the templates
//!
//! Everything the templates print is decided here: Rust identifiers, type
//! paths relative to the emitting module, and receiver-metadata accessors
//! for synthesized bindings.

use kubemodel_common::naming::{escape_keyword, group_token, to_snake_case};
use kubemodel_common::{
    ClassDescriptor, ClassId, CompilationUnit, CompilerSession, FieldType, OpParameter,
    Operation, ParamLocation, Primitive, PropertyDescriptor, TypeRef,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Module and type name of every emitted class
#[derive(Debug, Clone, Default)]
pub struct TypeNames {
    names: BTreeMap<ClassId, (String, String)>,
}

impl TypeNames {
    /// Name every class of every unit. Same-named classes inside one unit get
    /// their group appended, except the one the hints prefer.
    pub fn build(session: &CompilerSession) -> Self {
        let mut names = BTreeMap::new();
        for unit in &session.units {
            let module = unit.module_name();
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for id in &unit.classes {
                *counts.entry(session.class(*id).short_name()).or_default() += 1;
            }

            for id in &unit.classes {
                let class = session.class(*id);
                let short = class.short_name();
                let name = if counts[short] > 1 && !is_hinted(session, class) {
                    format!("{short}{}", group_token(&class.api_group()))
                } else {
                    short.to_string()
                };
                names.insert(*id, (module.clone(), name));
            }
        }
        Self { names }
    }

    /// Type name of `id`, if it was emitted at all
    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.names.get(&id).map(|(_, name)| name.as_str())
    }

    /// Type path of `id` as seen from `from_module`
    pub fn path(&self, id: ClassId, from_module: &str) -> String {
        match self.names.get(&id) {
            Some((module, name)) if module == from_module => name.clone(),
            Some((module, name)) => format!("super::{module}::{name}"),
            // Placeholders for undefined definitions are not emitted
            None => "serde_json::Value".to_string(),
        }
    }

    pub fn type_ref(&self, ty: &TypeRef, from_module: &str) -> String {
        match ty {
            TypeRef::Scalar(primitive) => primitive_type(*primitive).to_string(),
            TypeRef::Class(id) => self.path(*id, from_module),
            TypeRef::Any => "serde_json::Value".to_string(),
        }
    }

    pub fn field_type(&self, ty: &FieldType, from_module: &str) -> String {
        match ty {
            FieldType::Scalar(ty) => self.type_ref(ty, from_module),
            FieldType::List(inner) => format!("Vec<{}>", self.field_type(inner, from_module)),
            FieldType::Map => "std::collections::BTreeMap<String, String>".to_string(),
            FieldType::Freeform => "serde_json::Value".to_string(),
        }
    }
}

fn is_hinted(session: &CompilerSession, class: &ClassDescriptor) -> bool {
    let version = class.name.version.as_ref().map(ToString::to_string);
    session.hints.has_preference(class.short_name())
        && session
            .hints
            .is_preferred(class.short_name(), version.as_deref(), &class.api_group())
}

fn primitive_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String | Primitive::DateTime => "String",
        Primitive::Integer => "i64",
        Primitive::Number => "f64",
        Primitive::Boolean => "bool",
    }
}

/// Rust identifier for a wire name
pub fn ident(wire_name: &str) -> String {
    escape_keyword(&to_snake_case(wire_name.trim_start_matches('$')))
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitView {
    pub module: String,
    pub version: Option<String>,
    pub dependencies: Vec<String>,
    pub uses_unversioned: bool,
    pub classes: Vec<ClassView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassView {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub api_version: Option<String>,
    pub is_document: bool,
    /// Target type when the class is a bare alias
    pub alias: Option<String>,
    pub fields: Vec<FieldView>,
    pub operations: Vec<OperationView>,
    #[serde(skip)]
    used_names: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub ident: String,
    pub wire_name: String,
    pub rust_type: String,
    pub required: bool,
    pub description: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub name: String,
    pub operation_id: String,
    pub http_verb: String,
    pub path: String,
    pub description: Option<String>,
    pub class_level: bool,
    /// The receiver is sent as the request body
    pub body_from_self: bool,
    pub params: Vec<ParamView>,
    pub returns: String,
    pub api: String,
    pub method: String,
    pub synthetic: Option<SyntheticView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamView {
    pub ident: String,
    pub wire_name: String,
    pub arg_type: String,
    pub required: bool,
    pub description: Option<String>,
    /// Sent as the request body rather than a named argument
    pub body: bool,
    /// Falls back to receiver metadata when omitted
    pub derived: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntheticView {
    pub verb: String,
    pub base_operation: String,
    pub contract: String,
    pub derived: Vec<DerivedView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivedView {
    pub ident: String,
    pub wire_name: String,
    pub source: String,
    /// Expression of type `Option<String>` reading `source` off `self`
    pub accessor: Option<String>,
}

impl UnitView {
    pub fn new(unit: &CompilationUnit) -> Self {
        Self {
            module: unit.module_name(),
            version: unit.version.as_ref().map(ToString::to_string),
            dependencies: unit
                .external_dependencies
                .iter()
                .map(ToString::to_string)
                .collect(),
            uses_unversioned: unit.uses_unversioned,
            classes: Vec::new(),
        }
    }

    pub fn has_operations(&self) -> bool {
        self.classes.iter().any(|c| !c.operations.is_empty())
    }
}

impl ClassView {
    pub fn build(class: &ClassDescriptor, names: &TypeNames, module: &str) -> Self {
        let name = names
            .name(class.id)
            .map_or_else(|| class.short_name().to_string(), str::to_string);
        let fields = class
            .properties()
            .map(|p| FieldView::build(class, p, names, module))
            .collect();
        Self {
            name,
            key: class.key.clone(),
            description: class.description.clone(),
            kind: class.kind.clone(),
            api_version: class.api_version(),
            is_document: class.is_document,
            alias: class.alias.as_ref().map(|a| names.field_type(a, module)),
            fields,
            operations: Vec::new(),
            used_names: BTreeSet::new(),
        }
    }

    /// Claim a method name for one of this class's bindings
    pub fn claim_name(&mut self, base: &str, op: &Operation) -> String {
        claim_name(&mut self.used_names, base, op)
    }
}

/// Claim `base`, suffixing the API version (then the operation index) when
/// it is already taken
pub fn claim_name(used: &mut BTreeSet<String>, base: &str, op: &Operation) -> String {
    let mut name = base.to_string();
    if used.contains(&name) {
        if let Some(version) = &op.api_version {
            name = format!("{base}_{version}");
        }
    }
    if used.contains(&name) {
        name = format!("{base}_{}", op.id.0);
    }
    used.insert(name.clone());
    name
}

impl FieldView {
    fn build(
        class: &ClassDescriptor,
        property: &PropertyDescriptor,
        names: &TypeNames,
        module: &str,
    ) -> Self {
        let mut rust_type = names.field_type(&property.field_type, module);
        if property.field_type == FieldType::Scalar(TypeRef::Class(class.id)) {
            rust_type = format!("Box<{rust_type}>");
        }
        Self {
            ident: escape_keyword(&property.name),
            wire_name: property.wire_name.clone(),
            rust_type,
            required: property.required,
            description: property.description.clone(),
            default: property.default_hint.clone(),
        }
    }
}

impl OperationView {
    /// View of an operation owned by `owner`, or of a free query when
    /// `owner` is `None`. Only emittable operations have a view.
    pub fn build(
        session: &CompilerSession,
        op: &Operation,
        owner: Option<&ClassDescriptor>,
        names: &TypeNames,
        module: &str,
    ) -> Option<Self> {
        let binding = op.binding.as_ref()?;
        // The receiver is the body only when the body is of the owner's type;
        // any other receiver type (e.g. DeleteOptions) stays an argument
        let body_from_self = !op.is_class_level
            && owner.is_some_and(|class| {
                op.self_parameter
                    .as_ref()
                    .is_some_and(|receiver| receiver.ty == TypeRef::Class(class.id))
            });

        let derived_names: BTreeSet<&str> = op
            .synthetic
            .iter()
            .flat_map(|s| s.derived.iter().map(|d| d.parameter.as_str()))
            .collect();

        let mut params = Vec::new();
        if !body_from_self {
            if let Some(receiver) = &op.self_parameter {
                params.push(ParamView::build(receiver, names, module, false));
            }
        }
        params.extend(
            op.parameters
                .iter()
                .map(|p| ParamView::build(p, names, module, derived_names.contains(p.name.as_str()))),
        );

        let returns = op
            .success_responses()
            .find_map(|r| r.ty)
            .map_or_else(
                || "serde_json::Value".to_string(),
                |ty| names.type_ref(&ty, module),
            );

        let synthetic = op.synthetic.as_ref().map(|s| SyntheticView {
            verb: s.verb.to_string(),
            base_operation: s.base_operation.clone(),
            contract: s.contract.clone(),
            derived: s
                .derived
                .iter()
                .map(|d| DerivedView {
                    ident: ident(&d.parameter),
                    wire_name: d.parameter.clone(),
                    source: d.source.clone(),
                    accessor: owner.and_then(|class| metadata_accessor(session, class, &d.source)),
                })
                .collect(),
        });

        let name = match &op.synthetic {
            Some(s) => s.verb.to_string(),
            None => binding.method.clone(),
        };

        Some(Self {
            name,
            operation_id: op.operation_id.clone(),
            http_verb: op.verb.to_string(),
            path: op.path.clone(),
            description: op.description.clone(),
            class_level: owner.is_none() || op.is_class_level,
            body_from_self,
            params,
            returns,
            api: binding.api.clone(),
            method: binding.method.clone(),
            synthetic,
        })
    }
}

impl ParamView {
    fn build(param: &OpParameter, names: &TypeNames, module: &str, derived: bool) -> Self {
        let borrowed = match &param.ty {
            TypeRef::Scalar(Primitive::String | Primitive::DateTime) => "&str".to_string(),
            TypeRef::Scalar(primitive) => primitive_type(*primitive).to_string(),
            other => format!("&{}", names.type_ref(other, module)),
        };
        let required = param.required && !derived;
        Self {
            ident: ident(&param.name),
            wire_name: param.name.clone(),
            arg_type: if required {
                borrowed
            } else {
                format!("Option<{borrowed}>")
            },
            required,
            description: param.description.clone(),
            body: param.location == ParamLocation::Body,
            derived,
        }
    }
}

/// `Option<String>` expression reading a dotted `source` (e.g.
/// `metadata.name`) off `self`; `None` if the class has no such path
fn metadata_accessor(
    session: &CompilerSession,
    class: &ClassDescriptor,
    source: &str,
) -> Option<String> {
    let (outer, inner) = source.split_once('.')?;
    let outer_prop = class.properties().find(|p| p.wire_name == outer)?;
    let target = session.class(outer_prop.field_type.referenced_class()?);
    let inner_prop = target.properties().find(|p| p.wire_name == inner)?;

    let start = if outer_prop.required {
        format!("Some(&self.{})", escape_keyword(&outer_prop.name))
    } else {
        format!("self.{}.as_ref()", escape_keyword(&outer_prop.name))
    };
    let inner_ident = escape_keyword(&inner_prop.name);
    Some(if inner_prop.required {
        format!("{start}.map(|m| m.{inner_ident}.clone())")
    } else {
        format!("{start}.and_then(|m| m.{inner_ident}.clone())")
    })
}
