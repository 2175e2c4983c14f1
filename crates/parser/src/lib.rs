//! Swagger ingestion for the Kubernetes schema
//!
//! This crate turns the Kubernetes Swagger 2.0 document into the compiler's
//! intermediate representation held by a [`CompilerSession`].
//!
//! ## Ingestion Order
//!
//! 1. `definitions`, sorted by key: one class descriptor per entry, with
//!    forward references interned as placeholders and filled in place
//! 2. `paths`, in document order: one operation per verb, bound to typed
//!    parameters and responses
//!
//! Hard errors (unresolvable array items, references to missing classes)
//! abort ingestion. Soft anomalies are recorded as diagnostics.

pub mod definitions;
pub mod paths;
pub mod swagger;
mod type_mapper;

pub use paths::ApiPath;
pub use swagger::SwaggerParser;
pub use type_mapper::{RefError, TypeMapper};

use kubemodel_common::{CompilerSession, ModelHints, Result};
use std::path::Path;

/// Parse a Swagger file into a fresh session
///
/// # Arguments
/// * `path` - Path to the `swagger.json` document
/// * `hints` - Schema hints for the session
pub fn parse_schema(path: &Path, hints: ModelHints) -> Result<CompilerSession> {
    SwaggerParser::from_file(path)?.with_hints(hints).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubemodel_common::GeneratorError;

    #[test]
    fn test_parse_missing_schema() {
        let result = parse_schema(Path::new("/nonexistent/swagger.json"), ModelHints::default());
        assert!(matches!(result, Err(GeneratorError::Parse(_))));
    }
}
