//! Rust emission for kubemodel
//!
//! This crate renders an analyzed [`CompilerSession`] into Rust source: one
//! module per compilation unit, a `queries` module for operations no class
//! owns, and a `mod.rs` holding the transport seam the bindings call.
//!
//! Emission is a [`ModelVisitor`]; [`ModelGenerator`] is the Tera-backed
//! implementation.

mod templates;
mod views;
pub mod visitor;

pub use views::{ClassView, OperationView, TypeNames, UnitView};
pub use visitor::{walk, ModelVisitor};

use kubemodel_common::{
    ClassDescriptor, CompilationUnit, CompilerSession, GeneratorError, Operation, Result,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::{debug, info};

/// Module that holds free query operations
pub const QUERIES_MODULE: &str = "queries";

/// Model generator
///
/// Walks the session and renders:
/// - `<unit>.rs` for every compilation unit
/// - `queries.rs`
/// - `mod.rs`
pub struct ModelGenerator<'a> {
    session: &'a CompilerSession,
    tera: Tera,
    names: TypeNames,
    title: Option<String>,
    units: Vec<UnitView>,
    queries: Vec<OperationView>,
    query_names: BTreeSet<String>,
}

impl<'a> ModelGenerator<'a> {
    /// Create a generator for an analyzed session
    pub fn new(session: &'a CompilerSession) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            session,
            tera,
            names: TypeNames::build(session),
            title: None,
            units: Vec::new(),
            queries: Vec::new(),
            query_names: BTreeSet::new(),
        })
    }

    /// Name the source document in the generated module docs
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Render every file, keyed by file name
    pub fn render(mut self) -> Result<BTreeMap<String, String>> {
        let session = self.session;
        walk(session, &mut self)?;

        let mut files = BTreeMap::new();
        for unit in &self.units {
            let mut context = tera::Context::new();
            context.insert("unit", unit);
            context.insert("has_operations", &unit.has_operations());
            files.insert(
                format!("{}.rs", unit.module),
                self.render_template("unit.rs", &context)?,
            );
        }

        let mut context = tera::Context::new();
        context.insert("queries", &self.queries);
        files.insert(
            format!("{QUERIES_MODULE}.rs"),
            self.render_template("queries.rs", &context)?,
        );

        let mut context = tera::Context::new();
        context.insert("units", &self.units);
        context.insert("title", &self.title);
        files.insert("mod.rs".to_string(), self.render_template("mod.rs", &context)?);

        Ok(files)
    }

    /// Render every file into `output_dir`
    pub fn generate_to_directory(self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.render()?;

        fs::create_dir_all(output_dir).map_err(|e| {
            GeneratorError::Generation(format!("Failed to create output directory: {}", e))
        })?;

        let mut written = Vec::with_capacity(files.len());
        for (name, content) in files {
            let output_path = output_dir.join(&name);
            fs::write(&output_path, content).map_err(|e| {
                GeneratorError::Generation(format!("Failed to write {}: {}", name, e))
            })?;
            written.push(output_path);
        }

        info!(files = written.len(), output = %output_dir.display(), "model generated");
        Ok(written)
    }

    fn render_template(&self, name: &str, context: &tera::Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|e| GeneratorError::Generation(format!("Template error in {}: {:?}", name, e)))
    }
}

impl ModelVisitor for ModelGenerator<'_> {
    fn visit_unit(&mut self, unit: &CompilationUnit) -> Result<()> {
        debug!(unit = %unit.module_name(), classes = unit.classes.len(), "emitting unit");
        self.units.push(UnitView::new(unit));
        Ok(())
    }

    fn visit_class(&mut self, class: &ClassDescriptor) -> Result<()> {
        let Self { names, units, .. } = self;
        let unit = units.last_mut().ok_or_else(outside_unit)?;
        let view = ClassView::build(class, names, &unit.module);
        unit.classes.push(view);
        Ok(())
    }

    fn visit_operation(&mut self, class: &ClassDescriptor, op: &Operation) -> Result<()> {
        let session = self.session;
        let Self { names, units, .. } = self;
        let unit = units.last_mut().ok_or_else(outside_unit)?;
        let Some(mut view) = OperationView::build(session, op, Some(class), names, &unit.module)
        else {
            return Ok(());
        };
        let class_view = unit.classes.last_mut().ok_or_else(|| {
            GeneratorError::Generation(format!("{} visited before its class", op.operation_id))
        })?;
        view.name = class_view.claim_name(&view.name, op);
        class_view.operations.push(view);
        Ok(())
    }

    fn visit_query(&mut self, op: &Operation) -> Result<()> {
        if let Some(mut view) =
            OperationView::build(self.session, op, None, &self.names, QUERIES_MODULE)
        {
            view.name = views::claim_name(&mut self.query_names, &view.name, op);
            self.queries.push(view);
        }
        Ok(())
    }
}

fn outside_unit() -> GeneratorError {
    GeneratorError::Generation("class visited outside a unit".to_string())
}

/// Generate the model for an analyzed session (convenience function)
pub fn generate_model(session: &CompilerSession, output_path: &Path) -> Result<Vec<PathBuf>> {
    ModelGenerator::new(session)?.generate_to_directory(output_path)
}
