//! Swagger file parser

use super::types::SwaggerSpec;
use crate::{definitions, paths};
use kubemodel_common::{CompilerSession, GeneratorError, ModelHints, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Swagger document parser
///
/// Reads the schema once; [`SwaggerParser::parse`] builds a fresh session
/// each time it is called.
pub struct SwaggerParser {
    /// Loaded document
    spec: SwaggerSpec,

    /// Hints applied to the session
    hints: ModelHints,
}

impl SwaggerParser {
    /// Load a Swagger document from a file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = SwaggerParser::from_file("swagger.json")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read schema file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a Swagger document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: SwaggerSpec = serde_json::from_str(json)
            .map_err(|e| GeneratorError::Parse(format!("Failed to parse schema JSON: {}", e)))?;

        Ok(Self {
            spec,
            hints: ModelHints::default(),
        })
    }

    /// Use `hints` for the sessions this parser builds
    pub fn with_hints(mut self, hints: ModelHints) -> Self {
        self.hints = hints;
        self
    }

    /// Ingest definitions, then paths, into a new session
    pub fn parse(&self) -> Result<CompilerSession> {
        let mut session = CompilerSession::new(self.hints.clone());

        definitions::ingest_definitions(&self.spec.definitions, &mut session)?;
        debug!(classes = session.graph.len(), "ingested definitions");

        paths::ingest_paths(&self.spec, &mut session)?;
        session.graph.settle_groups();
        debug!(
            operations = session.operation_count(),
            "ingested path operations"
        );

        Ok(session)
    }

    /// Get reference to the underlying document
    pub fn spec(&self) -> &SwaggerSpec {
        &self.spec
    }
}
