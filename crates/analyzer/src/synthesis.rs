//! CRUD convenience bindings
//!
//! For each class, the first eligible wire operation of each CRUD verb is
//! copied into a synthetic operation whose `name`/`namespace` arguments fall
//! back to the receiver's metadata. Strategies are looked up per verb in an
//! open registry.

use crate::heuristic::method_name;
use crate::operation_mapper::OperationClassifier;
use kubemodel_common::{
    ClassId, CompilerSession, CrudVerb, DerivedArgument, OpParameter, Operation, OperationId,
    Synthesis,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Fallback for a `name` argument
pub const NAME_SOURCE: &str = "metadata.name";

/// Fallback for a `namespace` argument
pub const NAMESPACE_SOURCE: &str = "metadata.namespace";

/// Rewrites a base operation's parameters into a synthetic binding's
pub trait SynthesisStrategy {
    fn verb(&self) -> CrudVerb;

    /// Runtime contract of the generated binding
    fn contract(&self) -> String;

    /// Adjust `parameters` in place and return the derived arguments
    fn rewrite(&self, parameters: &mut Vec<OpParameter>) -> Vec<DerivedArgument>;
}

/// Make `name` optional with a receiver-metadata fallback, if present
fn derive(parameters: &mut [OpParameter], name: &str, source: &str) -> Option<DerivedArgument> {
    let param = parameters.iter_mut().find(|p| p.name == name)?;
    param.required = false;
    Some(DerivedArgument {
        parameter: name.to_string(),
        source: source.to_string(),
    })
}

fn missing_argument_contract(verb: CrudVerb) -> String {
    format!(
        "{verb}: an omitted name or namespace is taken from the receiver's metadata; \
         if neither supplies it the call fails with a usage error naming the argument"
    )
}

/// `create`: the server assigns or reads the name from the body
pub struct CreateStrategy;

impl SynthesisStrategy for CreateStrategy {
    fn verb(&self) -> CrudVerb {
        CrudVerb::Create
    }

    fn contract(&self) -> String {
        missing_argument_contract(self.verb())
    }

    fn rewrite(&self, parameters: &mut Vec<OpParameter>) -> Vec<DerivedArgument> {
        parameters.retain(|p| p.name != "name");
        derive(parameters, "namespace", NAMESPACE_SOURCE)
            .into_iter()
            .collect()
    }
}

/// `read`, `update` and `delete` address one named object
pub struct AddressedStrategy {
    verb: CrudVerb,
}

impl AddressedStrategy {
    pub fn new(verb: CrudVerb) -> Self {
        Self { verb }
    }
}

impl SynthesisStrategy for AddressedStrategy {
    fn verb(&self) -> CrudVerb {
        self.verb
    }

    fn contract(&self) -> String {
        missing_argument_contract(self.verb)
    }

    fn rewrite(&self, parameters: &mut Vec<OpParameter>) -> Vec<DerivedArgument> {
        [("name", NAME_SOURCE), ("namespace", NAMESPACE_SOURCE)]
            .into_iter()
            .filter_map(|(name, source)| derive(parameters, name, source))
            .collect()
    }
}

/// Strategies by verb
pub struct SynthesisRegistry {
    strategies: BTreeMap<CrudVerb, Box<dyn SynthesisStrategy>>,
}

impl Default for SynthesisRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CreateStrategy));
        registry.register(Box::new(AddressedStrategy::new(CrudVerb::Read)));
        registry.register(Box::new(AddressedStrategy::new(CrudVerb::Update)));
        registry.register(Box::new(AddressedStrategy::new(CrudVerb::Delete)));
        registry
    }
}

impl SynthesisRegistry {
    /// A registry with no strategies
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Add or replace the strategy for its verb
    pub fn register(&mut self, strategy: Box<dyn SynthesisStrategy>) {
        self.strategies.insert(strategy.verb(), strategy);
    }

    pub fn get(&self, verb: CrudVerb) -> Option<&dyn SynthesisStrategy> {
        self.strategies.get(&verb).map(Box::as_ref)
    }

    /// Synthesize bindings for every owned, emittable wire operation, in
    /// ingestion order. Returns the new operations.
    pub fn synthesize(&self, session: &mut CompilerSession) -> Vec<OperationId> {
        let mut created = Vec::new();
        let wire_count = session.operation_count();

        for index in 0..wire_count {
            let base = session.operation(OperationId(index));
            let Some((owner, strategy)) = self.eligible(session, base) else {
                continue;
            };

            let mut synthetic = base.clone();
            synthetic.id = session.next_operation_id();
            let derived = strategy.rewrite(&mut synthetic.parameters);
            synthetic.synthetic = Some(Synthesis {
                verb: strategy.verb(),
                base_operation: base.operation_id.clone(),
                derived,
                contract: strategy.contract(),
            });
            debug!(
                class = %session.class(owner).key,
                verb = %strategy.verb(),
                base = %base.operation_id,
                "synthesized binding"
            );

            let id = session.push_operation(synthetic);
            session.assign_owner(id, owner, false);
            session.graph.get_mut(owner).synthesized.insert(strategy.verb());
            created.push(id);
        }
        created
    }

    fn eligible(
        &self,
        session: &CompilerSession,
        op: &Operation,
    ) -> Option<(ClassId, &dyn SynthesisStrategy)> {
        if op.synthetic.is_some() || !op.is_emittable() {
            return None;
        }
        let owner = session.class(op.owner?);
        let method = method_name(op, &session.hints);
        let verb = OperationClassifier::classify(&method)?;
        if !OperationClassifier::targets(&method, owner.short_name())
            || owner.synthesized.contains(&verb)
        {
            return None;
        }
        Some((owner.id, self.get(verb)?))
    }
}
