//! Operation-to-class association
//!
//! Decides which class owns each wire operation, and whether the binding is
//! class-level (a static call) or instance-level (called on an object).
//! Typed parameters decide first, then 2xx response types, then the name
//! heuristic. `DeleteOptions` and `Status` are special-cased because they
//! appear on operations of almost every kind.

use crate::evidence::Evidence;
use crate::heuristic::{Heuristic, NameIndex};
use kubemodel_common::{
    ClassId, CompilerSession, Diagnostic, OpResponse, Operation, OperationId, TypeRef,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Ownership decision for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    /// `None` leaves the operation as a free query
    pub owner: Option<ClassId>,
    pub class_level: bool,
    pub evidence: Evidence,
    /// Whether the untyped `body` receiver should take the owner's type
    pub retype_self: bool,
}

impl Association {
    fn owned(owner: ClassId, class_level: bool, evidence: Evidence) -> Self {
        Self {
            owner: Some(owner),
            class_level,
            evidence,
            retype_self: false,
        }
    }
}

/// Receiver evidence found among the parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamsClass {
    Class(ClassId),
    /// Untyped `body`: probably the receiver's own, not-yet-known class
    BodyAny,
}

/// First class-typed parameter, or the untyped-body sentinel
fn class_in_params(op: &Operation) -> Option<ParamsClass> {
    op.all_parameters().enumerate().find_map(|(i, p)| match p.ty {
        TypeRef::Class(id) => Some(ParamsClass::Class(id)),
        TypeRef::Any if i == 0 && op.body_any && op.self_parameter.is_some() => {
            Some(ParamsClass::BodyAny)
        }
        _ => None,
    })
}

/// First class among the 2xx responses, in status-code order
fn class_in_responses(op: &Operation) -> Option<ClassId> {
    op.success_responses().find_map(OpResponse::class)
}

/// Decide the owner of `op` without touching the session
pub fn associate(op: &Operation, session: &CompilerSession, heuristic: &Heuristic) -> Association {
    let instance_path = op.addresses_named_object();

    match (class_in_params(op), class_in_responses(op)) {
        (Some(ParamsClass::Class(id)), response) if session.class(id).is_delete_options() => {
            match response {
                Some(response) => {
                    settle(op, session, heuristic, response, true, Evidence::ResponseClass)
                }
                None => Association::owned(id, false, Evidence::DeleteOptions),
            }
        }
        (Some(ParamsClass::Class(id)), _) => Association::owned(id, false, Evidence::ParameterClass),
        (Some(ParamsClass::BodyAny), Some(response)) => Association {
            retype_self: true,
            ..settle(op, session, heuristic, response, false, Evidence::BodyAnyResponse)
        },
        (None, Some(response)) => settle(
            op,
            session,
            heuristic,
            response,
            !instance_path,
            Evidence::ResponseClass,
        ),
        (Some(ParamsClass::BodyAny), None) | (None, None) => match heuristic.best_guess(op) {
            Some(guess) => Association::owned(guess.class, !instance_path, guess.evidence),
            None => Association {
                owner: None,
                class_level: false,
                evidence: Evidence::Unresolved,
                retype_self: false,
            },
        },
    }
}

/// Settle a provisional owner taken from a response type
///
/// A generic `Status` owner gives way to the best guess. Any other owner
/// gives way to the GVK hint's class when that is longer, or has the same
/// name (an alias in another group).
fn settle(
    op: &Operation,
    session: &CompilerSession,
    heuristic: &Heuristic,
    provisional: ClassId,
    class_level: bool,
    evidence: Evidence,
) -> Association {
    if session.class(provisional).is_status() {
        return match heuristic.best_guess(op) {
            Some(guess) => Association::owned(guess.class, class_level, guess.evidence),
            None => Association::owned(provisional, class_level, evidence),
        };
    }

    if let Some(hinted) = heuristic.resolve_gvk(op) {
        if hinted != provisional
            && (heuristic.name_len(hinted) > heuristic.name_len(provisional)
                || heuristic.same_name(hinted, provisional))
        {
            return Association::owned(hinted, class_level, Evidence::GvkHint);
        }
    }
    Association::owned(provisional, class_level, evidence)
}

/// Associate every wire operation in ingestion order and record the results
///
/// Owners get the operation in their operations map. Unowned operations
/// become free queries with an `UnassignedOperation` diagnostic.
pub fn associate_all(session: &mut CompilerSession) -> BTreeMap<OperationId, Association> {
    let index = NameIndex::build(&session.graph);
    let decisions: Vec<(OperationId, Association)> = {
        let shared: &CompilerSession = session;
        let heuristic = Heuristic::new(shared, &index);
        shared
            .operations()
            .filter(|op| op.synthetic.is_none())
            .map(|op| (op.id, associate(op, shared, &heuristic)))
            .collect()
    };

    for (id, association) in &decisions {
        apply(session, *id, association);
    }
    decisions.into_iter().collect()
}

fn apply(session: &mut CompilerSession, id: OperationId, association: &Association) {
    let Some(owner) = association.owner else {
        let op = session.operation(id);
        let diagnostic = Diagnostic::UnassignedOperation {
            operation_id: op.operation_id.clone(),
            path: op.path.clone(),
        };
        session.queries.push(id);
        session.report(diagnostic);
        return;
    };

    if association.retype_self {
        if let Some(receiver) = session.operation_mut(id).self_parameter.as_mut() {
            receiver.ty = TypeRef::Class(owner);
        }
    }
    debug!(
        operation = %session.operation(id).operation_id,
        owner = %session.class(owner).key,
        class_level = association.class_level,
        evidence = %association.evidence,
        "associated operation"
    );
    session.assign_owner(id, owner, association.class_level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubemodel_common::{Gvk, HttpVerb, OpParameter, ParamLocation, Primitive, VersionTag};

    struct Fixture {
        session: CompilerSession,
        pod: ClassId,
        delete_options: ClassId,
        status: ClassId,
    }

    fn fixture() -> Fixture {
        let mut session = CompilerSession::default();
        let mut define = |key: &str| {
            let id = session.graph.intern(key);
            session.graph.get_mut(id).defined = true;
            id
        };
        let pod = define("io.k8s.api.core.v1.Pod");
        let delete_options = define("io.k8s.apimachinery.pkg.apis.meta.v1.DeleteOptions");
        let status = define("io.k8s.apimachinery.pkg.apis.meta.v1.Status");
        Fixture {
            session,
            pod,
            delete_options,
            status,
        }
    }

    fn op(operation_id: &str, path: &str) -> Operation {
        Operation::new(
            OperationId(0),
            HttpVerb::Get,
            path,
            operation_id,
            Some(String::new()),
            VersionTag::parse("v1"),
        )
    }

    fn receiver(ty: TypeRef) -> OpParameter {
        OpParameter {
            name: "body".to_string(),
            ty,
            description: None,
            required: true,
            location: ParamLocation::Body,
        }
    }

    fn respond(op: &mut Operation, code: &str, class: ClassId) {
        op.responses.insert(
            code.to_string(),
            OpResponse {
                status: code.to_string(),
                description: None,
                ty: Some(TypeRef::Class(class)),
            },
        );
    }

    fn decide(f: &Fixture, op: &Operation) -> Association {
        let index = NameIndex::build(&f.session.graph);
        let heuristic = Heuristic::new(&f.session, &index);
        associate(op, &f.session, &heuristic)
    }

    const NAMED: &str = "/api/v1/namespaces/{namespace}/pods/{name}";
    const COLLECTION: &str = "/api/v1/namespaces/{namespace}/pods";

    #[test]
    fn test_parameter_class_is_instance_level() {
        let f = fixture();
        let mut create = op("createCoreV1NamespacedPod", COLLECTION);
        create.self_parameter = Some(receiver(TypeRef::Class(f.pod)));

        let decision = decide(&f, &create);
        assert_eq!(decision.owner, Some(f.pod));
        assert!(!decision.class_level);
        assert_eq!(decision.evidence, Evidence::ParameterClass);
    }

    #[test]
    fn test_delete_options_without_response() {
        let f = fixture();
        let mut delete = op("deleteCoreV1NamespacedPod", NAMED);
        delete.self_parameter = Some(receiver(TypeRef::Class(f.delete_options)));

        let decision = decide(&f, &delete);
        assert_eq!(decision.owner, Some(f.delete_options));
        assert!(!decision.class_level);
    }

    #[test]
    fn test_delete_options_with_status_response_uses_name() {
        let f = fixture();
        let mut delete = op("deleteCoreV1CollectionNamespacedPod", COLLECTION);
        delete.self_parameter = Some(receiver(TypeRef::Class(f.delete_options)));
        respond(&mut delete, "200", f.status);

        let decision = decide(&f, &delete);
        assert_eq!(decision.owner, Some(f.pod));
        assert!(decision.class_level);
    }

    #[test]
    fn test_body_any_takes_response_class() {
        let f = fixture();
        let mut patch = op("patchCoreV1NamespacedPod", NAMED);
        patch.self_parameter = Some(receiver(TypeRef::Any));
        patch.body_any = true;
        respond(&mut patch, "200", f.pod);

        let decision = decide(&f, &patch);
        assert_eq!(decision.owner, Some(f.pod));
        assert!(!decision.class_level);
        assert!(decision.retype_self);
    }

    #[test]
    fn test_response_only_depends_on_path() {
        let f = fixture();
        let mut read = op("readCoreV1NamespacedPod", NAMED);
        respond(&mut read, "200", f.pod);
        let decision = decide(&f, &read);
        assert_eq!(decision.owner, Some(f.pod));
        assert!(!decision.class_level);

        let mut list = op("listCoreV1NamespacedPod", COLLECTION);
        respond(&mut list, "200", f.pod);
        assert!(decide(&f, &list).class_level);
    }

    #[test]
    fn test_status_owner_kept_without_better_guess() {
        let f = fixture();
        let mut get = op("getSomething", "/apis/");
        get.api_version = None;
        respond(&mut get, "200", f.status);
        assert_eq!(decide(&f, &get).owner, Some(f.status));
    }

    #[test]
    fn test_longer_gvk_class_replaces_response_class() {
        let mut f = fixture();
        let pod_status = f.session.graph.intern("io.k8s.api.core.v1.PodStatusResult");
        f.session.graph.get_mut(pod_status).defined = true;

        let mut read = op("readCoreV1NamespacedPodStatus", NAMED);
        respond(&mut read, "200", f.pod);
        read.gvk = Some(Gvk {
            group: String::new(),
            version: "v1".to_string(),
            kind: "PodStatusResult".to_string(),
        });

        let decision = decide(&f, &read);
        assert_eq!(decision.owner, Some(pod_status));
        assert_eq!(decision.evidence, Evidence::GvkHint);
    }

    #[test]
    fn test_unresolved_is_unowned() {
        let f = fixture();
        let mut handler = op("logFileListHandler", "/logs/");
        handler.api_group = None;
        handler.api_version = None;
        handler.parameters.push(OpParameter {
            name: "logpath".to_string(),
            ty: TypeRef::Scalar(Primitive::String),
            description: None,
            required: true,
            location: ParamLocation::Path,
        });

        let decision = decide(&f, &handler);
        assert_eq!(decision.owner, None);
        assert_eq!(decision.evidence, Evidence::Unresolved);
    }
}
