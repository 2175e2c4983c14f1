//! Emission visitor over the resolved model
//!
//! [`walk`] visits units in partition order, classes in unit order and each
//! class's operations in operation-key order, then the free queries. Only
//! emittable operations are visited.

use kubemodel_common::{ClassDescriptor, CompilationUnit, CompilerSession, Operation, Result};

/// A backend over the resolved model
pub trait ModelVisitor {
    fn visit_unit(&mut self, unit: &CompilationUnit) -> Result<()>;

    fn visit_class(&mut self, class: &ClassDescriptor) -> Result<()>;

    /// An operation owned by the class visited last
    fn visit_operation(&mut self, class: &ClassDescriptor, op: &Operation) -> Result<()>;

    /// An operation no class owns
    fn visit_query(&mut self, op: &Operation) -> Result<()>;

    /// Called once after everything else
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drive `visitor` over `session`
pub fn walk<V: ModelVisitor + ?Sized>(session: &CompilerSession, visitor: &mut V) -> Result<()> {
    for unit in &session.units {
        visitor.visit_unit(unit)?;
        for id in &unit.classes {
            let class = session.class(*id);
            visitor.visit_class(class)?;
            for op in session.class_operations(*id) {
                if op.is_emittable() {
                    visitor.visit_operation(class, op)?;
                }
            }
        }
    }

    for id in &session.queries {
        let op = session.operation(*id);
        if op.is_emittable() {
            visitor.visit_query(op)?;
        }
    }

    visitor.finish()
}
