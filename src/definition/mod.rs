//! Factory definitions.
//!
//! A `Factory` is the immutable template for one model: base field rules, named traits,
//! associations, lifecycle hooks and the store table. Definitions are declared through a
//! builder, validated once by `build()`, and shared by every call afterwards; nothing in a
//! definition changes after it is built. Per-call variation lives in `CallOptions` and the
//! sequence counters live in the `SequenceRegistry`.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixture_factory::prelude::*;
//!
//! let users = Factory::<User>::builder("test_user")
//!     .field("name", "test name")
//!     .sequence("id", 1, |n| Ok(n.into()))
//!     .define_trait("admin", |t| t.field("admin", true))
//!     .after_build(|user| {
//!         user.nick_name = format!("{}!", user.name);
//!         Ok(())
//!     })
//!     .build()?;
//! ```

pub mod association;
pub mod field;
pub mod hook;
pub mod traits;

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::future::BoxFuture;

pub use self::{
    association::Association,
    field::FieldRule,
    hook::{Hook, HookSet, HookStage},
    traits::{Trait, TraitBuilder},
};
use self::{
    association::Associate,
    field::{upsert_by, FieldDecl},
};
use crate::{
    error::{BoxError, DefinitionError},
    fixtures::Fixtures,
    model::{Model, Schema},
    value::Value,
};

/// Counter for factory identities.
///
/// Each built factory gets a fresh id, so two definitions of the same model never share
/// sequence counters.
static NEXT_FACTORY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a built factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(u64);

impl FactoryId {
    fn next() -> Self {
        Self(NEXT_FACTORY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An association bound to the owner's foreign-key field.
pub(crate) struct AssociationRule<M> {
    pub(crate) foreign_key: usize,
    pub(crate) inner: Arc<dyn Associate<M>>,
}

/// Validated rules of a base definition or a trait.
pub(crate) struct RuleSet<M> {
    pub(crate) fields: Vec<FieldDecl<M>>,
    pub(crate) associations: Vec<AssociationRule<M>>,
    pub(crate) hooks: HookSet<M>,
}

/// Rules collected by a builder, not yet checked against the schema.
#[doc(hidden)]
pub struct PendingRules<M> {
    fields: Vec<(String, FieldRule<M>)>,
    associations: Vec<Arc<dyn Associate<M>>>,
    hooks: HookSet<M>,
}

impl<M> Default for PendingRules<M> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            associations: Vec::new(),
            hooks: HookSet::default(),
        }
    }
}

impl<M: Model> PendingRules<M> {
    /// Resolves field names against the schema.
    ///
    /// # Returns
    /// - `Ok(RuleSet)` - Rules addressed by schema position, duplicates collapsed
    /// - `Err(DefinitionError)` - Unknown field or foreign key, or a duplicate association
    fn resolve(self, table: &str, schema: &Schema<M>) -> Result<RuleSet<M>, DefinitionError> {
        let unknown = |field: &str| DefinitionError::UnknownField {
            table: table.to_string(),
            field: field.to_string(),
        };

        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, rule) in self.fields {
            let index = schema.index_of(&name).ok_or_else(|| unknown(&name))?;
            let decl = FieldDecl {
                index,
                name: schema.field(index).name(),
                rule,
            };
            upsert_by(&mut fields, decl, |decl| decl.index);
        }

        let mut associations: Vec<AssociationRule<M>> = Vec::with_capacity(self.associations.len());
        for inner in self.associations {
            let foreign_key = schema
                .index_of(inner.foreign_key())
                .ok_or_else(|| unknown(inner.foreign_key()))?;
            if associations.iter().any(|rule| rule.foreign_key == foreign_key) {
                return Err(DefinitionError::DuplicateAssociation {
                    table: table.to_string(),
                    foreign_key: inner.foreign_key().to_string(),
                });
            }
            inner.validate(table)?;
            associations.push(AssociationRule { foreign_key, inner });
        }

        Ok(RuleSet {
            fields,
            associations,
            hooks: self.hooks,
        })
    }
}

/// Rule declarations shared by factory definitions and traits.
pub trait DeclareRules<M: Model>: Sized {
    #[doc(hidden)]
    fn rules_mut(&mut self) -> &mut PendingRules<M>;

    /// Declares a field rule directly.
    fn rule(mut self, name: impl Into<String>, rule: FieldRule<M>) -> Self {
        self.rules_mut().fields.push((name.into(), rule));
        self
    }

    /// Sets a field to a fixed value.
    fn field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.rule(name, FieldRule::Static(value.into()))
    }

    /// Derives a field from a counter that starts at `seed` and grows by one per draw.
    ///
    /// # Arguments
    /// - `name` - Field to set
    /// - `seed` - First counter value handed to `generator`
    /// - `generator` - Maps the counter to the field value; an error aborts the call
    fn sequence<F>(self, name: impl Into<String>, seed: i64, generator: F) -> Self
    where
        F: Fn(i64) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.rule(
            name,
            FieldRule::Sequence {
                seed,
                generator: Arc::new(generator),
            },
        )
    }

    /// Computes a field from the instance resolved so far.
    ///
    /// Foreign keys set by associations are not resolved yet when the rule runs.
    fn dynamic<F>(self, name: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&M) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.rule(name, FieldRule::Dynamic(Arc::new(derive)))
    }

    /// Declares a belongs-to association.
    fn association<R: Model>(mut self, association: Association<M, R>) -> Self {
        self.rules_mut().associations.push(Arc::new(association));
        self
    }

    /// Registers a hook run once the instance is fully resolved.
    fn after_build<F>(self, hook: F) -> Self
    where
        F: Fn(&mut M) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookStage::AfterBuild, Hook::Sync(Arc::new(hook)))
    }

    /// Registers a hook run right before the instance is inserted.
    fn before_create<F>(self, hook: F) -> Self
    where
        F: Fn(&mut M) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookStage::BeforeCreate, Hook::Sync(Arc::new(hook)))
    }

    /// Registers a hook run after the instance is inserted.
    fn after_create<F>(self, hook: F) -> Self
    where
        F: Fn(&mut M) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hook(HookStage::AfterCreate, Hook::Sync(Arc::new(hook)))
    }

    /// Registers an after-create hook that can create more records, e.g. the "many" side of a
    /// one-to-many relation pointing back at the new instance.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// .after_create_with(move |author, fixtures| {
    ///     let blogs = blogs.clone();
    ///     Box::pin(async move {
    ///         author.blogs = fixtures
    ///             .create_slice(&blogs, 10)
    ///             .with_field("author_id", author.id)
    ///             .await?;
    ///         Ok::<(), BoxError>(())
    ///     })
    /// })
    /// ```
    fn after_create_with<F>(self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut M, &'a Fixtures) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.hook(HookStage::AfterCreate, Hook::Async(Arc::new(hook)))
    }

    /// Registers a hook for an arbitrary stage.
    fn hook(mut self, stage: HookStage, hook: Hook<M>) -> Self {
        self.rules_mut().hooks.push(stage, hook);
        self
    }
}

/// Builder for a `Factory`.
pub struct DefinitionBuilder<M: Model> {
    table: String,
    rules: PendingRules<M>,
    traits: Vec<(String, TraitBuilder<M>)>,
}

impl<M: Model> DefinitionBuilder<M> {
    fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            rules: PendingRules::default(),
            traits: Vec::new(),
        }
    }

    /// Declares a named trait.
    ///
    /// # Arguments
    /// - `name` - Name selected through `with_traits`
    /// - `declare` - Adds the trait's rules to the given builder
    pub fn define_trait<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(TraitBuilder<M>) -> TraitBuilder<M>,
    {
        self.traits.push((name.into(), declare(TraitBuilder::new())));
        self
    }

    /// Validates the declaration and freezes it into a `Factory`.
    ///
    /// # Returns
    /// - `Ok(Factory)` - Immutable, shareable definition
    /// - `Err(DefinitionError)` - Empty table name, schema without primary key, unknown field,
    ///   foreign key or related field, duplicate association or duplicate trait
    pub fn build(self) -> Result<Factory<M>, DefinitionError> {
        if self.table.trim().is_empty() {
            return Err(DefinitionError::EmptyTable);
        }

        let schema = M::schema();
        if schema.primary_key_field().is_none() {
            return Err(DefinitionError::MissingPrimaryKey { table: self.table });
        }

        let base = self.rules.resolve(&self.table, &schema)?;

        let mut traits: Vec<Trait<M>> = Vec::with_capacity(self.traits.len());
        for (name, builder) in self.traits {
            if traits.iter().any(|existing| existing.name() == name) {
                return Err(DefinitionError::DuplicateTrait {
                    table: self.table,
                    name,
                });
            }
            traits.push(builder.resolve(name, &self.table, &schema)?);
        }

        let id = FactoryId::next();
        tracing::debug!(
            factory = %id,
            table = %self.table,
            fields = base.fields.len(),
            associations = base.associations.len(),
            traits = traits.len(),
            "factory defined"
        );

        Ok(Factory {
            inner: Arc::new(Definition {
                id,
                table: self.table,
                schema,
                base,
                traits,
            }),
        })
    }
}

impl<M: Model> DeclareRules<M> for DefinitionBuilder<M> {
    fn rules_mut(&mut self) -> &mut PendingRules<M> {
        &mut self.rules
    }
}

struct Definition<M> {
    id: FactoryId,
    table: String,
    schema: Schema<M>,
    base: RuleSet<M>,
    traits: Vec<Trait<M>>,
}

/// Shared handle to an immutable factory definition.
pub struct Factory<M> {
    inner: Arc<Definition<M>>,
}

impl<M> Clone for Factory<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> fmt::Debug for Factory<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("id", &self.inner.id)
            .field("table", &self.inner.table)
            .field("traits", &self.trait_names())
            .finish()
    }
}

impl<M: Model> Factory<M> {
    /// Starts declaring a factory for the given store table.
    pub fn builder(table: impl Into<String>) -> DefinitionBuilder<M> {
        DefinitionBuilder::new(table)
    }
}

impl<M> Factory<M> {
    pub fn id(&self) -> FactoryId {
        self.inner.id
    }

    pub fn table(&self) -> &str {
        &self.inner.table
    }

    pub fn schema(&self) -> &Schema<M> {
        &self.inner.schema
    }

    /// Checks whether a trait with the given name is defined.
    pub fn has_trait(&self, name: &str) -> bool {
        self.find_trait(name).is_some()
    }

    /// Names of all defined traits, in declaration order.
    pub fn trait_names(&self) -> Vec<&str> {
        self.inner.traits.iter().map(Trait::name).collect()
    }

    /// Reads the primary key of an instance.
    pub fn primary_key(&self, instance: &M) -> Value {
        self.inner
            .schema
            .primary_key_field()
            .map(|field| field.get(instance))
            .unwrap_or_default()
    }

    pub(crate) fn base(&self) -> &RuleSet<M> {
        &self.inner.base
    }

    /// Looks up the selected traits, in selection order.
    ///
    /// # Returns
    /// - `Ok(Vec<&RuleSet>)` - Rule sets of the selected traits
    /// - `Err(DefinitionError::UnknownTrait)` - A selected name is not defined
    pub(crate) fn selected(&self, names: &[String]) -> Result<Vec<&RuleSet<M>>, DefinitionError> {
        names
            .iter()
            .map(|name| {
                self.find_trait(name)
                    .map(Trait::rules)
                    .ok_or_else(|| DefinitionError::UnknownTrait {
                        table: self.inner.table.clone(),
                        name: name.clone(),
                    })
            })
            .collect()
    }

    fn find_trait(&self, name: &str) -> Option<&Trait<M>> {
        self.inner.traits.iter().find(|t| t.name() == name)
    }
}
