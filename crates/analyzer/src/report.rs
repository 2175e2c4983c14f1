//! Association review report
//!
//! Plain text, deterministic (no timestamps), meant to be diffed between
//! schema releases.

use crate::analyzer::{AnalysisResult, AnalysisWarning};
use kubemodel_common::{CompilerSession, Result};
use std::fmt::Write as FmtWrite;

/// Render the review report for an analyzed session
pub fn generate_report(result: &AnalysisResult, session: &CompilerSession) -> Result<String> {
    let mut output = String::new();

    write_header(&mut output, result, session)?;
    write_units_section(&mut output, session)?;
    write_operations_section(&mut output, result, session)?;
    write_review_section(&mut output, result)?;
    write_diagnostics_section(&mut output, session)?;

    Ok(output)
}

fn write_header(
    output: &mut String,
    result: &AnalysisResult,
    session: &CompilerSession,
) -> Result<()> {
    let defined = session.graph.iter().filter(|c| c.defined).count();
    writeln!(output, "# Association Review")?;
    writeln!(output, "# Classes: {defined}")?;
    writeln!(output, "# Operations: {}", result.associations.len())?;
    writeln!(output, "# Synthesized: {}", result.synthesized.len())?;
    writeln!(output, "# Free queries: {}", session.queries.len())?;
    writeln!(output, "# Overall Confidence: {:.2}", result.overall_confidence())?;
    writeln!(output)?;
    Ok(())
}

fn write_units_section(output: &mut String, session: &CompilerSession) -> Result<()> {
    writeln!(output, "units:")?;
    for unit in &session.units {
        let deps: Vec<String> = unit
            .external_dependencies
            .iter()
            .map(ToString::to_string)
            .collect();
        write!(output, "  {}: {} classes", unit.module_name(), unit.classes.len())?;
        if !deps.is_empty() {
            write!(output, ", depends on {}", deps.join(", "))?;
        }
        if unit.uses_unversioned {
            write!(output, ", uses unversioned")?;
        }
        writeln!(output)?;
    }
    writeln!(output)?;
    Ok(())
}

fn write_operations_section(
    output: &mut String,
    result: &AnalysisResult,
    session: &CompilerSession,
) -> Result<()> {
    writeln!(output, "operations:")?;
    for (id, association) in &result.associations {
        let op = session.operation(*id);
        let owner = association
            .owner
            .map_or("-", |owner| session.class(owner).key.as_str());
        let level = if association.class_level {
            "class"
        } else {
            "instance"
        };
        writeln!(
            output,
            "  {} -> {owner} [{level}] {} {:.2} ({})",
            op.operation_id,
            association.evidence,
            association.evidence.confidence(),
            association.evidence.level()
        )?;
    }
    for id in &result.synthesized {
        let op = session.operation(*id);
        if let (Some(synthesis), Some(owner)) = (&op.synthetic, op.owner) {
            writeln!(
                output,
                "  {} -> {} [synthetic from {}]",
                synthesis.verb,
                session.class(owner).key,
                synthesis.base_operation
            )?;
        }
    }
    writeln!(output)?;
    Ok(())
}

fn write_review_section(output: &mut String, result: &AnalysisResult) -> Result<()> {
    writeln!(output, "review:")?;
    if result.warnings.is_empty() {
        writeln!(output, "  # nothing to review")?;
    }
    for warning in &result.warnings {
        match warning {
            AnalysisWarning::LowConfidence { operation, score } => {
                writeln!(output, "  - {operation}: low confidence ({score:.2})")?;
            }
            AnalysisWarning::RequiresReview { operation, reason } => {
                writeln!(output, "  - {operation}: {reason}")?;
            }
            AnalysisWarning::Unassigned { operation } => {
                writeln!(output, "  - {operation}: no owning class, emitted as a query")?;
            }
        }
    }
    writeln!(output)?;
    Ok(())
}

fn write_diagnostics_section(output: &mut String, session: &CompilerSession) -> Result<()> {
    writeln!(output, "diagnostics:")?;
    for diagnostic in &session.diagnostics {
        writeln!(output, "  - {diagnostic}")?;
    }
    Ok(())
}
