//! Common types and utilities for kubemodel
//!
//! This crate holds the compiler's intermediate representation (class graph,
//! operations, compilation units), the naming and version model, the hint
//! file format, diagnostics and the error type shared by every pass.

pub mod diagnostics;
pub mod hints;
pub mod model;
pub mod naming;
pub mod operation;
pub mod session;
pub mod unit;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use hints::{ModelHints, PreferredVersion};
pub use model::{
    ClassDescriptor, ClassGraph, ClassId, ContainerKind, FieldType, Gvk, Primitive,
    PropertyDescriptor, TypeRef,
};
pub use naming::{QualifiedName, VersionTag};
pub use operation::{
    CrudVerb, DerivedArgument, HttpVerb, OpParameter, OpResponse, Operation, OperationId,
    ParamLocation, Synthesis, TransportBinding,
};
pub use session::CompilerSession;
pub use unit::CompilationUnit;

use thiserror::Error;

/// Errors that stop a compilation run
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Array property {property} of {class} has no resolvable item type")]
    UnresolvableItemType { class: String, property: String },

    #[error("{operation}: unresolvable reference {reference}")]
    UnresolvedReference { operation: String, reference: String },

    #[error(
        "{from_class} ({from_version}) depends on {to_class} ({to_version}): \
         a unit may only depend on GA versions with an equal or lower major number"
    )]
    VersionDirection {
        from_class: String,
        from_version: String,
        to_class: String,
        to_version: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to format output: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = GeneratorError::VersionDirection {
            from_class: "io.k8s.api.apps.v1beta1.Deployment".to_string(),
            from_version: "v1beta1".to_string(),
            to_class: "io.k8s.api.autoscaling.v2.Scale".to_string(),
            to_version: "v2".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("io.k8s.api.apps.v1beta1.Deployment"));
        assert!(message.contains("io.k8s.api.autoscaling.v2.Scale"));

        let err = GeneratorError::UnresolvableItemType {
            class: "io.k8s.api.core.v1.PodSpec".to_string(),
            property: "containers".to_string(),
        };
        assert!(err.to_string().contains("containers"));
    }
}
