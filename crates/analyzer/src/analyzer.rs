//! Semantic pass orchestration

use crate::association::{associate_all, Association};
use crate::partition::partition;
use crate::report;
use crate::synthesis::SynthesisRegistry;
use kubemodel_common::{CompilerSession, OperationId, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Runs association, partitioning and synthesis over a parsed session
#[derive(Default)]
pub struct ModelAnalyzer {
    registry: SynthesisRegistry,
}

/// Complete analysis result
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Ownership decision per wire operation
    pub associations: BTreeMap<OperationId, Association>,
    /// Synthetic CRUD bindings, in creation order
    pub synthesized: Vec<OperationId>,
    /// Decisions that need manual review
    pub warnings: Vec<AnalysisWarning>,
}

/// Warning about an ownership decision
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisWarning {
    LowConfidence { operation: String, score: f32 },
    Unassigned { operation: String },
    RequiresReview { operation: String, reason: String },
}

impl ModelAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom synthesis registry
    pub fn with_registry(registry: SynthesisRegistry) -> Self {
        Self { registry }
    }

    /// Run every semantic pass; a partitioning violation is fatal
    pub fn analyze(&self, session: &mut CompilerSession) -> Result<AnalysisResult> {
        info!(
            operations = session.operation_count(),
            classes = session.graph.len(),
            "starting analysis"
        );

        let associations = associate_all(session);
        debug!(
            owned = associations.values().filter(|a| a.owner.is_some()).count(),
            queries = session.queries.len(),
            "association done"
        );

        partition(session)?;
        debug!(units = session.units.len(), "partitioning done");

        let synthesized = self.registry.synthesize(session);
        debug!(synthesized = synthesized.len(), "synthesis done");

        let warnings = collect_warnings(&associations, session);
        Ok(AnalysisResult {
            associations,
            synthesized,
            warnings,
        })
    }
}

fn collect_warnings(
    associations: &BTreeMap<OperationId, Association>,
    session: &CompilerSession,
) -> Vec<AnalysisWarning> {
    let mut warnings = Vec::new();
    for (id, association) in associations {
        let operation = session.operation(*id).operation_id.clone();
        let evidence = association.evidence;
        if association.owner.is_none() {
            warnings.push(AnalysisWarning::Unassigned { operation });
        } else if evidence.level() == "LOW" {
            warnings.push(AnalysisWarning::LowConfidence {
                operation,
                score: evidence.confidence(),
            });
        } else if evidence.needs_review() {
            warnings.push(AnalysisWarning::RequiresReview {
                operation,
                reason: format!("owner chosen by {evidence}"),
            });
        }
    }
    warnings
}

impl AnalysisResult {
    /// Mean confidence over owned operations (1.0 when there are none)
    pub fn overall_confidence(&self) -> f32 {
        let owned: Vec<f32> = self
            .associations
            .values()
            .filter(|a| a.owner.is_some())
            .map(|a| a.evidence.confidence())
            .collect();
        if owned.is_empty() {
            return 1.0;
        }
        owned.iter().sum::<f32>() / owned.len() as f32
    }

    /// Render the review report
    pub fn to_report(&self, session: &CompilerSession) -> Result<String> {
        report::generate_report(self, session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Evidence;
    use kubemodel_common::ClassId;

    fn association(owner: Option<ClassId>, evidence: Evidence) -> Association {
        Association {
            owner,
            class_level: false,
            evidence,
            retype_self: false,
        }
    }

    #[test]
    fn test_overall_confidence_ignores_unowned() {
        let mut associations = BTreeMap::new();
        associations.insert(OperationId(0), association(Some(ClassId(0)), Evidence::ParameterClass));
        associations.insert(OperationId(1), association(Some(ClassId(0)), Evidence::ResponseClass));
        associations.insert(OperationId(2), association(None, Evidence::Unresolved));
        let result = AnalysisResult {
            associations,
            synthesized: Vec::new(),
            warnings: Vec::new(),
        };
        assert!((result.overall_confidence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_empty_session() {
        let mut session = CompilerSession::default();
        let result = ModelAnalyzer::new().analyze(&mut session).unwrap();
        assert!(result.associations.is_empty());
        assert!(result.warnings.is_empty());
        assert!(session.units.is_empty());
        assert_eq!(result.overall_confidence(), 1.0);
    }
}
