//! Class graph intermediate representation
//!
//! Every schema type becomes a [`ClassDescriptor`] stored in the
//! [`ClassGraph`] arena. References between classes are [`ClassId`]s, so a
//! placeholder created for a forward reference is the same node the real
//! definition later fills in.

use crate::naming::QualifiedName;
use crate::operation::CrudVerb;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Name of the input type whose operations get special-cased ownership
pub const DELETE_OPTIONS: &str = "DeleteOptions";

/// Name of the generic status type returned by many operations
pub const STATUS: &str = "Status";

/// Identity of a class inside its [`ClassGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scalar types of the schema's primitive table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
}

impl Primitive {
    /// Look up a schema `type`/`format` pair in the primitive table
    pub fn from_schema(schema_type: &str, format: Option<&str>) -> Option<Self> {
        match (schema_type, format) {
            ("string", Some("date-time")) => Some(Primitive::DateTime),
            ("string", _) => Some(Primitive::String),
            ("integer", _) => Some(Primitive::Integer),
            ("number", _) => Some(Primitive::Number),
            ("boolean", _) => Some(Primitive::Boolean),
            _ => None,
        }
    }
}

/// What a parameter, response or scalar field refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Scalar(Primitive),
    Class(ClassId),
    /// Untyped JSON value
    Any,
}

impl TypeRef {
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            TypeRef::Class(id) => Some(*id),
            _ => None,
        }
    }
}

/// Shape of a property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Scalar(TypeRef),
    List(Box<FieldType>),
    /// String-keyed map of strings
    Map,
    /// Opaque JSON object
    Freeform,
}

/// Container kind of a [`FieldType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    None,
    List,
    Map,
    Freeform,
}

impl FieldType {
    pub fn container_kind(&self) -> ContainerKind {
        match self {
            FieldType::Scalar(_) => ContainerKind::None,
            FieldType::List(_) => ContainerKind::List,
            FieldType::Map => ContainerKind::Map,
            FieldType::Freeform => ContainerKind::Freeform,
        }
    }

    /// Class referenced at any list depth, if any
    pub fn referenced_class(&self) -> Option<ClassId> {
        match self {
            FieldType::Scalar(ty) => ty.as_class(),
            FieldType::List(inner) => inner.referenced_class(),
            FieldType::Map | FieldType::Freeform => None,
        }
    }
}

/// One field of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Normalized identifier
    pub name: String,
    /// Name as it appears on the wire
    pub wire_name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: Option<String>,
    /// Default for the `kind`/`apiVersion` discriminators
    pub default_hint: Option<String>,
}

/// Group/version/kind discriminator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gvk {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    /// `group/version`, or bare `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// One domain type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub id: ClassId,
    /// Definition key, e.g. `io.k8s.api.core.v1.Pod`
    pub key: String,
    pub name: QualifiedName,
    pub gvk: Option<Gvk>,
    /// Full API group learned from GVK hints elsewhere in the schema, for
    /// classes that carry no GVK of their own
    #[serde(default)]
    pub group: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub required_properties: Vec<PropertyDescriptor>,
    pub optional_properties: Vec<PropertyDescriptor>,
    /// Set when the definition is a bare scalar or freeform alias
    pub alias: Option<FieldType>,
    pub is_document: bool,
    /// Owned operations keyed by operation id
    pub operations: BTreeMap<String, crate::operation::OperationId>,
    /// CRUD verbs already synthesized for this class
    pub synthesized: BTreeSet<CrudVerb>,
    /// False while the descriptor is a placeholder for an unseen definition
    pub defined: bool,
    has_api_version: bool,
    has_kind: bool,
}

impl ClassDescriptor {
    fn placeholder(id: ClassId, key: &str) -> Self {
        Self {
            id,
            key: key.to_string(),
            name: QualifiedName::parse(key),
            gvk: None,
            group: None,
            kind: None,
            description: None,
            required_properties: Vec::new(),
            optional_properties: Vec::new(),
            alias: None,
            is_document: false,
            operations: BTreeMap::new(),
            synthesized: BTreeSet::new(),
            defined: false,
            has_api_version: false,
            has_kind: false,
        }
    }

    /// Short type name, e.g. `Pod`
    pub fn short_name(&self) -> &str {
        &self.name.name
    }

    pub fn is_delete_options(&self) -> bool {
        self.short_name() == DELETE_OPTIONS
    }

    pub fn is_status(&self) -> bool {
        self.short_name() == STATUS
    }

    /// API group in GVK form: the recorded GVK group, else the learned full
    /// group, else derived from the definition key (`io.k8s.api.apps` ->
    /// `apps`, core -> empty)
    pub fn api_group(&self) -> String {
        if let Some(gvk) = &self.gvk {
            return gvk.group.clone();
        }
        if let Some(group) = &self.group {
            return group.clone();
        }
        match self.name.short_group() {
            Some("core") | None => String::new(),
            Some(short) => short.to_string(),
        }
    }

    /// Whether this class belongs to `group`, accepting full GVK groups
    /// (`rbac.authorization.k8s.io`) as well as their leading label
    pub fn in_group(&self, group: &str) -> bool {
        let own = self.api_group();
        if own == group {
            return true;
        }
        let leading = |g: &str| g.split('.').next().unwrap_or_default().to_string();
        if own.is_empty() || group.is_empty() {
            let other = if own.is_empty() { group } else { own.as_str() };
            return other == "core";
        }
        leading(&own) == leading(group) || self.name.short_group() == Some(group)
    }

    /// `apiVersion` value objects of this class carry
    pub fn api_version(&self) -> Option<String> {
        if let Some(gvk) = &self.gvk {
            return Some(gvk.api_version());
        }
        let version = self.name.version.as_ref()?.to_string();
        let group = self.api_group();
        Some(if group.is_empty() {
            version
        } else {
            format!("{group}/{version}")
        })
    }

    /// All properties, required first, each list sorted by name
    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.required_properties
            .iter()
            .chain(self.optional_properties.iter())
    }

    /// Record a property and update the document discriminator flags
    pub fn add_property(&mut self, property: PropertyDescriptor) {
        match property.wire_name.as_str() {
            "apiVersion" => self.has_api_version = true,
            "kind" => self.has_kind = true,
            _ => {}
        }
        self.is_document = self.has_api_version && self.has_kind;

        if property.required {
            self.required_properties.push(property);
        } else {
            self.optional_properties.push(property);
        }
    }

    /// Sort property lists by name
    pub fn finalize_properties(&mut self) {
        self.required_properties.sort_by(|a, b| a.name.cmp(&b.name));
        self.optional_properties.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Arena of every class in the schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassGraph {
    classes: Vec<ClassDescriptor>,
    by_key: BTreeMap<String, ClassId>,
    /// Full dotted API groups by leading label, first seen wins
    #[serde(default)]
    groups: BTreeMap<String, String>,
}

impl ClassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a class by definition key, creating a placeholder if the
    /// key has not been seen yet
    pub fn intern(&mut self, key: &str) -> ClassId {
        if let Some(id) = self.by_key.get(key) {
            return *id;
        }
        let id = ClassId(self.classes.len());
        self.classes.push(ClassDescriptor::placeholder(id, key));
        self.by_key.insert(key.to_string(), id);
        id
    }

    pub fn lookup(&self, key: &str) -> Option<ClassId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.0]
    }

    pub fn get_mut(&mut self, id: ClassId) -> &mut ClassDescriptor {
        &mut self.classes[id.0]
    }

    /// Find a class by definition key
    pub fn by_key(&self, key: &str) -> Option<&ClassDescriptor> {
        self.lookup(key).map(|id| self.get(id))
    }

    /// Classes in definition-key order
    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.by_key.values().map(|id| &self.classes[id.0])
    }

    /// Ids in definition-key order
    pub fn ids(&self) -> Vec<ClassId> {
        self.by_key.values().copied().collect()
    }

    /// Placeholders that were never filled in by a definition
    pub fn placeholders(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.iter().filter(|c| !c.defined)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Remember a full API group (`rbac.authorization.k8s.io`) seen in a GVK
    /// hint or an API path
    pub fn learn_group(&mut self, group: &str) {
        let Some((label, _)) = group.split_once('.') else {
            return;
        };
        if !label.is_empty() {
            self.groups
                .entry(label.to_string())
                .or_insert_with(|| group.to_string());
        }
    }

    /// Give every class without a GVK the full group learned for its key,
    /// refreshing its `apiVersion` default
    pub fn settle_groups(&mut self) {
        for class in &mut self.classes {
            if class.gvk.is_some() {
                continue;
            }
            let Some(full) = class.name.short_group().and_then(|g| self.groups.get(g)) else {
                continue;
            };
            class.group = Some(full.clone());
            let api_version = class.api_version();
            for property in class
                .required_properties
                .iter_mut()
                .chain(class.optional_properties.iter_mut())
                .filter(|p| p.wire_name == "apiVersion")
            {
                property.default_hint = api_version.clone();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
