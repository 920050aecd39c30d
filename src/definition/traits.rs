//! Named, optional rule bundles.
//!
//! A trait holds the same kinds of rules as a base definition: field rules, associations and
//! hooks. It only takes effect when a call selects it by name. Selected traits are layered in
//! selection order on top of the base rules; they never stack implicitly.

use crate::{
    definition::{DeclareRules, PendingRules, RuleSet},
    error::DefinitionError,
    model::{Model, Schema},
};

/// Builder handed to the closure of `DefinitionBuilder::define_trait`.
pub struct TraitBuilder<M: Model> {
    rules: PendingRules<M>,
}

impl<M: Model> TraitBuilder<M> {
    pub(crate) fn new() -> Self {
        Self {
            rules: PendingRules::default(),
        }
    }

    pub(crate) fn resolve(
        self,
        name: String,
        table: &str,
        schema: &Schema<M>,
    ) -> Result<Trait<M>, DefinitionError> {
        Ok(Trait {
            name,
            rules: self.rules.resolve(table, schema)?,
        })
    }
}

impl<M: Model> DeclareRules<M> for TraitBuilder<M> {
    fn rules_mut(&mut self) -> &mut PendingRules<M> {
        &mut self.rules
    }
}

/// A validated trait of a factory.
pub struct Trait<M> {
    name: String,
    rules: RuleSet<M>,
}

impl<M> Trait<M> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rules(&self) -> &RuleSet<M> {
        &self.rules
    }
}
