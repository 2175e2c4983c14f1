//! Swagger 2.0 document parser
//!
//! Loads the Kubernetes API schema and drives ingestion of its type
//! definitions and path operations into a [`CompilerSession`].
//!
//! ## Schema Sources
//! - From a cluster: `kubectl proxy && curl http://localhost:8001/openapi/v2`
//! - From GitHub: `https://github.com/kubernetes/kubernetes/blob/master/api/openapi-spec/swagger.json`
//!
//! ## Usage
//! ```rust,ignore
//! use kubemodel_parser::SwaggerParser;
//!
//! let session = SwaggerParser::from_file("swagger.json")?.parse()?;
//! ```
//!
//! [`CompilerSession`]: kubemodel_common::CompilerSession

mod parser;
mod types;

pub use parser::SwaggerParser;
pub use types::*;
