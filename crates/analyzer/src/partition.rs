//! Version-scoped compilation units
//!
//! Each defined class lands in the unit of its API version. A unit may
//! import from another version only if that version is GA with an equal or
//! lower major number; anything else aborts the run. The unversioned unit
//! can be imported from anywhere.

use kubemodel_common::{
    ClassDescriptor, ClassId, CompilationUnit, CompilerSession, GeneratorError, Result, VersionTag,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Whether a unit of version `from` may import from GA-or-not `to`
///
/// ```
/// use kubemodel_analyzer::may_depend_on;
/// use kubemodel_common::VersionTag;
///
/// let v = |raw| VersionTag::parse(raw).unwrap();
/// assert!(may_depend_on(Some(&v("v2")), &v("v1")));
/// assert!(!may_depend_on(Some(&v("v1beta1")), &v("v2")));
/// assert!(!may_depend_on(Some(&v("v1")), &v("v1beta1")));
/// assert!(may_depend_on(None, &v("v3")));
/// ```
pub fn may_depend_on(from: Option<&VersionTag>, to: &VersionTag) -> bool {
    to.is_ga() && from.map_or(true, |from| to.major <= from.major)
}

/// Build the session's compilation units, unversioned first
pub fn partition(session: &mut CompilerSession) -> Result<()> {
    let mut units: BTreeMap<Option<VersionTag>, CompilationUnit> = BTreeMap::new();

    for class in session.graph.iter().filter(|c| c.defined) {
        let version = class.name.version.clone();
        let unit = units
            .entry(version.clone())
            .or_insert_with(|| CompilationUnit::new(version));

        for target in dependencies(session, class) {
            let target = session.class(target);
            if !target.defined {
                continue;
            }
            match &target.name.version {
                None => unit.uses_unversioned = true,
                Some(to) if Some(to) == class.name.version.as_ref() => {}
                Some(to) => {
                    if !may_depend_on(class.name.version.as_ref(), to) {
                        return Err(GeneratorError::VersionDirection {
                            from_class: class.key.clone(),
                            from_version: version_label(class.name.version.as_ref()),
                            to_class: target.key.clone(),
                            to_version: to.to_string(),
                        });
                    }
                    unit.external_dependencies.insert(to.clone());
                }
            }
        }
        unit.classes.push(class.id);
    }

    session.units = units.into_values().collect();
    for unit in &session.units {
        debug!(
            unit = %unit.module_name(),
            classes = unit.classes.len(),
            imports = unit.external_dependencies.len(),
            "partitioned unit"
        );
    }
    Ok(())
}

/// Classes `class` refers to through its properties and owned operations
fn dependencies(session: &CompilerSession, class: &ClassDescriptor) -> BTreeSet<ClassId> {
    let mut targets: BTreeSet<ClassId> = class
        .properties()
        .filter_map(|p| p.field_type.referenced_class())
        .collect();
    if let Some(alias) = &class.alias {
        targets.extend(alias.referenced_class());
    }
    for op in session.class_operations(class.id) {
        targets.extend(op.referenced_classes());
    }
    targets.remove(&class.id);
    targets
}

fn version_label(version: Option<&VersionTag>) -> String {
    version.map_or_else(|| "unversioned".to_string(), ToString::to_string)
}
