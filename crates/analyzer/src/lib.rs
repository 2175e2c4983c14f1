//! Semantic passes for kubemodel
//!
//! Takes a [`CompilerSession`](kubemodel_common::CompilerSession) filled by
//! the parser and decides which class owns each operation, partitions the
//! classes into version-scoped compilation units and synthesizes CRUD
//! convenience bindings.
//!
//! # Examples
//!
//! ```no_run
//! use kubemodel_analyzer::ModelAnalyzer;
//! use kubemodel_common::ModelHints;
//! use std::path::Path;
//!
//! let mut session = kubemodel_parser::parse_schema(
//!     Path::new("swagger.json"),
//!     ModelHints::default(),
//! ).expect("Parse failed");
//! let result = ModelAnalyzer::new().analyze(&mut session).expect("Analysis failed");
//!
//! println!("Overall confidence: {:.2}", result.overall_confidence());
//! println!("{}", result.to_report(&session).expect("Report failed"));
//! ```

mod analyzer;
pub mod association;
mod evidence;
pub mod heuristic;
mod operation_mapper;
pub mod partition;
mod report;
pub mod synthesis;

pub use analyzer::{AnalysisResult, AnalysisWarning, ModelAnalyzer};
pub use association::{associate, associate_all, Association};
pub use evidence::Evidence;
pub use heuristic::{method_name, Guess, Heuristic, NameIndex};
pub use operation_mapper::OperationClassifier;
pub use partition::{may_depend_on, partition};
pub use synthesis::{SynthesisRegistry, SynthesisStrategy};
