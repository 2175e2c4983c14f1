//! Name-based owner guessing
//!
//! Approximate by nature. The guess is built from the method name's tokens
//! in three passes (single tokens, suffix concatenations, permutations) and
//! may only ever be replaced by a strictly longer class name. GVK hints and
//! response types come last because they are schema-level signals.
//! Iteration is over sorted structures only, so the result is stable.

use crate::evidence::Evidence;
use kubemodel_common::naming::{group_token, method_tokens, strip_api_tokens};
use kubemodel_common::{ClassGraph, ClassId, CompilerSession, ModelHints, OpResponse, Operation};
use std::collections::BTreeMap;

/// Permutations are only tried up to this many tokens (7! = 5040)
pub const MAX_PERMUTATION_TOKENS: usize = 7;

/// Operation id with the API version token, and unless the hints keep it the
/// group token, removed
///
/// ```
/// use kubemodel_analyzer::method_name;
/// use kubemodel_common::{HttpVerb, ModelHints, Operation, OperationId, VersionTag};
///
/// let op = Operation::new(
///     OperationId(0),
///     HttpVerb::Get,
///     "/apis/storage.k8s.io/v1/storageclasses/{name}",
///     "readStorageV1StorageClass",
///     Some("storage.k8s.io".to_string()),
///     VersionTag::parse("v1"),
/// );
/// assert_eq!(method_name(&op, &ModelHints::default()), "readStorageStorageClass");
/// ```
pub fn method_name(op: &Operation, hints: &ModelHints) -> String {
    match (&op.api_group, &op.api_version) {
        (Some(group), Some(version)) => {
            let group = group_token(group);
            strip_api_tokens(
                &op.operation_id,
                &group,
                &version.token(),
                hints.keeps_group(&group),
            )
        }
        _ => op.operation_id.clone(),
    }
}

/// Defined record classes by lowercase short name, candidates in key order
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    by_name: BTreeMap<String, Vec<ClassId>>,
}

impl NameIndex {
    /// Index every defined, non-alias class of `graph`
    pub fn build(graph: &ClassGraph) -> Self {
        let mut by_name: BTreeMap<String, Vec<ClassId>> = BTreeMap::new();
        for class in graph.iter().filter(|c| c.defined && c.alias.is_none()) {
            by_name
                .entry(class.short_name().to_lowercase())
                .or_default()
                .push(class.id);
        }
        Self { by_name }
    }

    /// Classes whose short name equals `name`, ignoring case
    pub fn candidates(&self, name: &str) -> &[ClassId] {
        self.by_name
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A guessed owner and the evidence that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guess {
    pub class: ClassId,
    pub evidence: Evidence,
}

/// Owner lookups over one session
pub struct Heuristic<'a> {
    session: &'a CompilerSession,
    index: &'a NameIndex,
}

impl<'a> Heuristic<'a> {
    pub fn new(session: &'a CompilerSession, index: &'a NameIndex) -> Self {
        Self { session, index }
    }

    /// Best owner for `op` from its name, GVK hint and response types
    pub fn best_guess(&self, op: &Operation) -> Option<Guess> {
        let tokens = method_tokens(&method_name(op, &self.session.hints));
        let reversed: Vec<&str> = tokens.iter().rev().map(String::as_str).collect();
        let mut guess: Option<Guess> = None;

        // (a) single tokens
        for token in &reversed {
            self.offer(&mut guess, token, op, Evidence::TokenMatch);
        }

        // (b) suffixes of the method name, shortest first
        for n in 2..=reversed.len() {
            let suffix: String = reversed[..n].iter().rev().copied().collect();
            self.offer(&mut guess, &suffix, op, Evidence::SuffixMatch);
        }

        // (c) every ordering of all tokens; first hit wins
        let full_len: usize = tokens.iter().map(String::len).sum();
        if self.guess_len(&guess) < full_len && tokens.len() <= MAX_PERMUTATION_TOKENS {
            let mut order = tokens.clone();
            order.sort();
            loop {
                if let Some(id) = self.resolve_name(&order.concat(), op) {
                    self.replace_if_longer(&mut guess, id, Evidence::PermutationMatch);
                    break;
                }
                if !next_permutation(&mut order) {
                    break;
                }
            }
        }

        if let Some(id) = self.resolve_gvk(op) {
            let replace = match &guess {
                None => true,
                Some(current) => {
                    self.name_len(id) > self.name_len(current.class)
                        || self.same_name(id, current.class)
                }
            };
            if replace {
                guess = Some(Guess {
                    class: id,
                    evidence: Evidence::GvkHint,
                });
            }
        }

        for id in op.success_responses().filter_map(OpResponse::class) {
            if !self.session.class(id).is_status() {
                self.replace_if_longer(&mut guess, id, Evidence::ResponseClass);
            }
        }

        guess
    }

    /// Class named by the operation's GVK hint: an exact group/version match
    /// if one exists, else the best same-named candidate of the hinted group,
    /// else the best same-named candidate of any group
    pub fn resolve_gvk(&self, op: &Operation) -> Option<ClassId> {
        let gvk = op.gvk.as_ref()?;
        let candidates = self.index.candidates(&gvk.kind);
        let in_group: Vec<ClassId> = candidates
            .iter()
            .copied()
            .filter(|&id| self.session.class(id).in_group(&gvk.group))
            .collect();

        if let Some(exact) = in_group.iter().copied().find(|&id| {
            self.session
                .class(id)
                .name
                .version
                .as_ref()
                .map(ToString::to_string)
                .as_deref()
                == Some(gvk.version.as_str())
        }) {
            return Some(exact);
        }

        if in_group.is_empty() {
            self.disambiguate(candidates, op)
        } else {
            self.disambiguate(&in_group, op)
        }
    }

    /// Whether two classes share a short name, ignoring case
    pub fn same_name(&self, a: ClassId, b: ClassId) -> bool {
        self.session
            .class(a)
            .short_name()
            .eq_ignore_ascii_case(self.session.class(b).short_name())
    }

    pub fn name_len(&self, id: ClassId) -> usize {
        self.session.class(id).short_name().len()
    }

    fn resolve_name(&self, name: &str, op: &Operation) -> Option<ClassId> {
        self.disambiguate(self.index.candidates(name), op)
    }

    /// Narrow same-named candidates: preferred versions, then 2xx response
    /// references, then the operation's own group/version, then key order
    fn disambiguate(&self, candidates: &[ClassId], op: &Operation) -> Option<ClassId> {
        let mut pool: Vec<ClassId> = candidates.to_vec();
        let hints = &self.session.hints;

        narrow(&mut pool, |id| {
            let class = self.session.class(id);
            let kind = class.kind.as_deref().unwrap_or(class.short_name());
            let version = class.name.version.as_ref().map(ToString::to_string);
            hints.is_preferred(kind, version.as_deref(), &class.api_group())
        });
        narrow(&mut pool, |id| {
            op.success_responses().any(|r| r.class() == Some(id))
        });
        narrow(&mut pool, |id| {
            let class = self.session.class(id);
            let same_group = op
                .api_group
                .as_deref()
                .is_some_and(|group| class.in_group(group));
            same_group && op.api_version.is_some() && class.name.version == op.api_version
        });

        pool.first().copied()
    }

    fn offer(&self, guess: &mut Option<Guess>, name: &str, op: &Operation, evidence: Evidence) {
        if let Some(id) = self.resolve_name(name, op) {
            self.replace_if_longer(guess, id, evidence);
        }
    }

    fn replace_if_longer(&self, guess: &mut Option<Guess>, id: ClassId, evidence: Evidence) {
        if self.name_len(id) > self.guess_len(guess) {
            *guess = Some(Guess {
                class: id,
                evidence,
            });
        }
    }

    fn guess_len(&self, guess: &Option<Guess>) -> usize {
        guess.map_or(0, |g| self.name_len(g.class))
    }
}

/// Keep the candidates matching `keep`, unless none do
fn narrow(pool: &mut Vec<ClassId>, keep: impl Fn(ClassId) -> bool) {
    let kept: Vec<ClassId> = pool.iter().copied().filter(|&id| keep(id)).collect();
    if !kept.is_empty() {
        *pool = kept;
    }
}

/// Advance to the next lexicographic permutation; false after the last one
fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    let Some(pivot) = items.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(successor) = items.iter().rposition(|x| *x > items[pivot]) else {
        return false;
    };
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubemodel_common::{Gvk, HttpVerb, OperationId, TypeRef, VersionTag};

    fn define(session: &mut CompilerSession, key: &str) -> ClassId {
        let id = session.graph.intern(key);
        session.graph.get_mut(id).defined = true;
        id
    }

    fn unversioned_op(operation_id: &str) -> Operation {
        Operation::new(OperationId(0), HttpVerb::Get, "/custom", operation_id, None, None)
    }

    fn guess(session: &CompilerSession, op: &Operation) -> Option<Guess> {
        let index = NameIndex::build(&session.graph);
        Heuristic::new(session, &index).best_guess(op)
    }

    #[test]
    fn test_method_name_strips_api_tokens() {
        let op = Operation::new(
            OperationId(0),
            HttpVerb::Get,
            "/api/v1/namespaces/{namespace}/pods/{name}",
            "readCoreV1NamespacedPod",
            Some(String::new()),
            VersionTag::parse("v1"),
        );
        assert_eq!(method_name(&op, &ModelHints::default()), "readNamespacedPod");
        assert_eq!(
            method_name(&unversioned_op("logFileListHandler"), &ModelHints::default()),
            "logFileListHandler"
        );
    }

    #[test]
    fn test_single_token_pass_keeps_longest() {
        let mut session = CompilerSession::default();
        let binding = define(&mut session, "io.k8s.api.core.v1.Binding");
        define(&mut session, "io.k8s.api.core.v1.Pod");

        // "binding" is visited before "pod"; the shorter later match loses
        let result = guess(&session, &unversioned_op("createNamespacedPodBinding")).unwrap();
        assert_eq!(result.class, binding);
        assert_eq!(result.evidence, Evidence::TokenMatch);
    }

    #[test]
    fn test_suffix_pass_beats_single_token() {
        let mut session = CompilerSession::default();
        define(&mut session, "io.k8s.api.core.v1.Binding");
        define(&mut session, "io.k8s.api.core.v1.Pod");
        let pod_binding = define(&mut session, "io.k8s.api.core.v1.PodBinding");

        let result = guess(&session, &unversioned_op("createNamespacedPodBinding")).unwrap();
        assert_eq!(result.class, pod_binding);
        assert_eq!(result.evidence, Evidence::SuffixMatch);
    }

    #[test]
    fn test_permutation_pass_beats_suffix() {
        let mut session = CompilerSession::default();
        define(&mut session, "io.k8s.api.core.v1.Pod");
        define(&mut session, "io.k8s.api.core.v1.StatusPod");
        let permuted = define(&mut session, "io.k8s.api.core.v1.PodReadStatus");

        let result = guess(&session, &unversioned_op("readStatusPod")).unwrap();
        assert_eq!(result.class, permuted);
        assert_eq!(result.evidence, Evidence::PermutationMatch);
    }

    #[test]
    fn test_permutations_capped() {
        let mut session = CompilerSession::default();
        let pod = define(&mut session, "io.k8s.api.core.v1.Pod");
        define(&mut session, "io.k8s.api.core.v1.CbaFedGHiJkLmPodRead");

        // Eight tokens: the matching permutation is never tried
        let op = unversioned_op("readGFedCbaHiJkLmPod");
        assert_eq!(method_tokens(&op.operation_id).len(), 8);
        assert_eq!(guess(&session, &op).unwrap().class, pod);
    }

    #[test]
    fn test_gvk_picks_between_same_named_classes() {
        let mut session = CompilerSession::default();
        let apps = define(&mut session, "io.k8s.api.apps.v1beta2.Scale");
        let autoscaling = define(&mut session, "io.k8s.api.autoscaling.v1.Scale");

        let mut op = unversioned_op("readScale");
        op.gvk = Some(Gvk {
            group: "autoscaling".to_string(),
            version: "v1".to_string(),
            kind: "Scale".to_string(),
        });
        let result = guess(&session, &op).unwrap();
        assert_eq!(result.class, autoscaling);
        assert_eq!(result.evidence, Evidence::GvkHint);

        op.gvk = Some(Gvk {
            group: "apps".to_string(),
            version: "v1beta2".to_string(),
            kind: "Scale".to_string(),
        });
        assert_eq!(guess(&session, &op).unwrap().class, apps);

        // Without a hint, key order decides
        op.gvk = None;
        assert_eq!(guess(&session, &op).unwrap().class, apps);
    }

    #[test]
    fn test_gvk_group_wins_without_version_match() {
        let mut session = CompilerSession::default();
        let apps = define(&mut session, "io.k8s.api.apps.v1beta2.Scale");
        let autoscaling = define(&mut session, "io.k8s.api.autoscaling.v1.Scale");

        // apps/v1 has no Scale; the response names the autoscaling variant
        let mut op = unversioned_op("readScale");
        op.gvk = Some(Gvk {
            group: "apps".to_string(),
            version: "v1".to_string(),
            kind: "Scale".to_string(),
        });
        op.responses.insert(
            "200".to_string(),
            OpResponse {
                status: "200".to_string(),
                description: None,
                ty: Some(TypeRef::Class(autoscaling)),
            },
        );

        let index = NameIndex::build(&session.graph);
        let heuristic = Heuristic::new(&session, &index);
        assert_eq!(heuristic.resolve_gvk(&op), Some(apps));
        assert_eq!(heuristic.best_guess(&op).unwrap().class, apps);

        // No class of the hinted group: fall back to every candidate
        op.gvk = Some(Gvk {
            group: "batch".to_string(),
            version: "v1".to_string(),
            kind: "Scale".to_string(),
        });
        assert_eq!(heuristic.resolve_gvk(&op), Some(autoscaling));
    }

    #[test]
    fn test_preferred_versions_narrow_candidates() {
        let hints = ModelHints::from_yaml(
            "preferred_versions:\n  Scale:\n    - {version: v1, group: autoscaling}\n",
        )
        .unwrap();
        let mut session = CompilerSession::new(hints);
        define(&mut session, "io.k8s.api.apps.v1beta2.Scale");
        let autoscaling = define(&mut session, "io.k8s.api.autoscaling.v1.Scale");

        let result = guess(&session, &unversioned_op("readScale")).unwrap();
        assert_eq!(result.class, autoscaling);
    }

    #[test]
    fn test_response_classes_but_not_status() {
        let mut session = CompilerSession::default();
        let status = define(&mut session, "io.k8s.apimachinery.pkg.apis.meta.v1.Status");
        let info = define(&mut session, "io.k8s.apimachinery.pkg.version.Info");

        let mut op = unversioned_op("getCodeVersion");
        for (code, class) in [("200", status), ("201", info)] {
            op.responses.insert(
                code.to_string(),
                OpResponse {
                    status: code.to_string(),
                    description: None,
                    ty: Some(TypeRef::Class(class)),
                },
            );
        }
        let result = guess(&session, &op).unwrap();
        assert_eq!(result.class, info);
        assert_eq!(result.evidence, Evidence::ResponseClass);
    }

    #[test]
    fn test_alias_classes_are_not_candidates() {
        let mut session = CompilerSession::default();
        let patch = define(&mut session, "io.k8s.apimachinery.pkg.apis.meta.v1.Patch");
        session.graph.get_mut(patch).alias = Some(kubemodel_common::FieldType::Freeform);

        assert!(guess(&session, &unversioned_op("patchThing")).is_none());
    }

    #[test]
    fn test_next_permutation_order() {
        let mut items = vec!["a", "b", "c"];
        let mut seen = vec![items.concat()];
        while next_permutation(&mut items) {
            seen.push(items.concat());
        }
        assert_eq!(seen, vec!["abc", "acb", "bac", "bca", "cab", "cba"]);
    }
}
