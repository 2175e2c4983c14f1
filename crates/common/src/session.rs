//! Compiler session: all state shared between passes
//!
//! Each pass takes `&mut CompilerSession` in turn. Ingestion is the only
//! writer of the class graph's shape; later passes only attach operations,
//! units and diagnostics.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::hints::ModelHints;
use crate::model::{ClassDescriptor, ClassGraph, ClassId};
use crate::operation::{Operation, OperationId};
use crate::unit::CompilationUnit;

#[derive(Debug, Clone, Default)]
pub struct CompilerSession {
    pub hints: ModelHints,
    pub graph: ClassGraph,
    operations: Vec<Operation>,
    /// Operations no class claimed, in ingestion order
    pub queries: Vec<OperationId>,
    pub units: Vec<CompilationUnit>,
    pub diagnostics: Diagnostics,
}

impl CompilerSession {
    pub fn new(hints: ModelHints) -> Self {
        Self {
            hints,
            ..Self::default()
        }
    }

    pub fn next_operation_id(&self) -> OperationId {
        OperationId(self.operations.len())
    }

    /// Store an operation; its `id` must come from [`Self::next_operation_id`]
    pub fn push_operation(&mut self, operation: Operation) -> OperationId {
        debug_assert_eq!(operation.id, self.next_operation_id());
        let id = operation.id;
        self.operations.push(operation);
        id
    }

    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.0]
    }

    pub fn operation_mut(&mut self, id: OperationId) -> &mut Operation {
        &mut self.operations[id.0]
    }

    /// Operations in ingestion order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn last_operation_id(&self) -> Option<OperationId> {
        self.operations.last().map(|op| op.id)
    }

    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        self.graph.get(id)
    }

    /// Operations owned by `class`, keyed by operation id
    pub fn class_operations(&self, class: ClassId) -> impl Iterator<Item = &Operation> {
        self.graph
            .get(class)
            .operations
            .values()
            .map(|id| &self.operations[id.0])
    }

    /// Attach an operation to its owner (last write wins on id collisions)
    pub fn assign_owner(&mut self, op: OperationId, owner: ClassId, class_level: bool) {
        let operation = &mut self.operations[op.0];
        operation.owner = Some(owner);
        operation.is_class_level = class_level;
        let key = match &operation.synthetic {
            Some(synthesis) => synthesis.verb.to_string(),
            None => operation.operation_id.clone(),
        };
        self.graph.get_mut(owner).operations.insert(key, op);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn unit_of(&self, class: ClassId) -> Option<&CompilationUnit> {
        self.units.iter().find(|u| u.contains(class))
    }
}
