//! Instance resolution.
//!
//! Turns a factory and one call's options into a populated instance:
//!
//! 1. Validate the call: selected traits, override fields and related-instance names
//! 2. Write call-site overrides onto `M::default()`
//! 3. Evaluate the rule plan (base rules, then each selected trait's rules replacing
//!    same-field rules in place) skipping every overridden field
//! 4. Resolve the association plan, persisting related records before the owner
//! 5. Run after-build hooks
//!
//! Nothing here inserts the owner itself; that is left to `Fixtures`.

use std::iter;

use crate::{
    definition::{
        field::{upsert_by, FieldDecl},
        hook::run_stage,
        AssociationRule, Factory, FieldRule, HookSet, HookStage, RuleSet,
    },
    error::FactoryError,
    fixtures::Fixtures,
    model::Model,
    options::CallOptions,
    sequence::SequenceKey,
    value::Value,
};

/// An instance resolved through after-build, with the hook sets of its call.
pub(crate) struct Resolved<'f, M> {
    pub(crate) instance: M,
    /// Base hooks followed by the selected traits' hooks.
    pub(crate) hooks: Vec<&'f HookSet<M>>,
}

/// Resolves one instance without persisting it.
///
/// # Arguments
/// - `factory` - Definition to resolve
/// - `options` - Overrides, traits and related instances of this call
/// - `fixtures` - Handle used for sequence draws and related records
///
/// # Returns
/// - `Ok(Resolved)` - Instance after after-build hooks
/// - `Err(FactoryError)` - Validation, generator, association or hook failure
pub(crate) async fn resolve<'f, M: Model>(
    factory: &'f Factory<M>,
    options: &CallOptions,
    fixtures: &Fixtures,
) -> Result<Resolved<'f, M>, FactoryError> {
    let selected = factory.selected(options.traits())?;
    let rule_sets: Vec<&RuleSet<M>> = iter::once(factory.base()).chain(selected).collect();

    let associations = association_plan(&rule_sets);
    validate(factory, options, &associations)?;

    if !options.traits().is_empty() {
        tracing::debug!(
            table = %factory.table(),
            traits = ?options.traits(),
            "applying traits"
        );
    }

    let mut instance = M::default();
    apply_overrides(factory, options, &mut instance)?;

    for decl in rule_plan(&rule_sets) {
        if options.overrides(decl.name) {
            continue;
        }
        let value = evaluate(factory, decl, &instance, fixtures)?;
        set_field(factory, decl.index, &mut instance, value)?;
    }

    let schema = factory.schema();
    for rule in associations {
        let foreign_key = schema.field(rule.foreign_key).name();
        let provided = options.related(rule.inner.name()).map(|related| &**related);
        if provided.is_none() && options.overrides(foreign_key) {
            tracing::debug!(
                table = %factory.table(),
                association = %rule.inner.name(),
                "foreign key overridden, skipping association"
            );
            continue;
        }

        let key = rule.inner.associate(&mut instance, provided, fixtures).await?;
        set_field(factory, rule.foreign_key, &mut instance, key)?;
    }

    let hooks: Vec<&HookSet<M>> = rule_sets.iter().map(|&rules| &rules.hooks).collect();
    run_stage(&hooks, HookStage::AfterBuild, &mut instance, fixtures).await?;

    Ok(Resolved { instance, hooks })
}

/// Rejects unknown override fields and related-instance names before anything is persisted.
fn validate<M>(
    factory: &Factory<M>,
    options: &CallOptions,
    associations: &[&AssociationRule<M>],
) -> Result<(), FactoryError> {
    let unknown = |field: &str| FactoryError::UnknownField {
        table: factory.table().to_string(),
        field: field.to_string(),
    };

    for (name, _) in options.fields() {
        if factory.schema().index_of(name).is_none() {
            return Err(unknown(name));
        }
    }

    for (name, _) in &options.related {
        if !associations.iter().any(|rule| rule.inner.name() == name) {
            return Err(unknown(name));
        }
    }

    Ok(())
}

fn apply_overrides<M>(
    factory: &Factory<M>,
    options: &CallOptions,
    instance: &mut M,
) -> Result<(), FactoryError> {
    for (name, value) in options.fields() {
        if let Some(index) = factory.schema().index_of(name) {
            set_field(factory, index, instance, value.clone())?;
        }
    }
    Ok(())
}

fn rule_plan<'r, M>(rule_sets: &[&'r RuleSet<M>]) -> Vec<&'r FieldDecl<M>> {
    let mut plan = Vec::new();
    for &rules in rule_sets {
        for decl in &rules.fields {
            upsert_by(&mut plan, decl, |decl| decl.index);
        }
    }
    plan
}

fn association_plan<'r, M>(rule_sets: &[&'r RuleSet<M>]) -> Vec<&'r AssociationRule<M>> {
    let mut plan = Vec::new();
    for &rules in rule_sets {
        for rule in &rules.associations {
            upsert_by(&mut plan, rule, |rule| rule.foreign_key);
        }
    }
    plan
}

fn evaluate<M>(
    factory: &Factory<M>,
    decl: &FieldDecl<M>,
    instance: &M,
    fixtures: &Fixtures,
) -> Result<Value, FactoryError> {
    let generator_failed = |source| FactoryError::Generator {
        field: decl.name.to_string(),
        source,
    };

    match &decl.rule {
        FieldRule::Static(value) => Ok(value.clone()),
        FieldRule::Sequence { seed, generator } => {
            let key = SequenceKey::new(factory.id(), decl.name);
            let counter = fixtures.sequences().next(&key, *seed);
            tracing::debug!(
                factory = %factory.id(),
                field = %decl.name,
                counter,
                "sequence drawn"
            );
            generator(counter).map_err(generator_failed)
        }
        FieldRule::Dynamic(derive) => derive(instance).map_err(generator_failed),
    }
}

fn set_field<M>(
    factory: &Factory<M>,
    index: usize,
    instance: &mut M,
    value: Value,
) -> Result<(), FactoryError> {
    let field = factory.schema().field(index);
    field
        .set(instance, value)
        .map_err(|source| FactoryError::InvalidValue {
            field: field.name().to_string(),
            source,
        })
}
