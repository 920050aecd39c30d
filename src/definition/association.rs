//! Belongs-to associations.
//!
//! An association makes the owner (child) point at a related (parent) record. Resolving it
//! creates the parent through its own factory, copies the parent's primary key into the owner's
//! foreign-key field and, when a relation slot is declared, moves the parent into that slot.
//! Parents are always persisted before the owner because the owner needs their keys.

use std::any::Any;

use async_trait::async_trait;

use crate::{
    definition::Factory,
    error::{DefinitionError, FactoryError, ValueError},
    fixtures::Fixtures,
    model::{Model, Schema},
    options::CallOptions,
    value::Value,
};

/// Accessor for the owner field that receives the related instance.
pub type RelationSlot<M, R> = fn(&mut M) -> &mut Option<Box<R>>;

/// Declaration of a belongs-to association from `M` to `R`.
///
/// # Example
///
/// ```rust,ignore
/// let blogs = Factory::<Blog>::builder("test_blog")
///     .association(
///         Association::new("author", "author_id", "id", &users)
///             .field("name", "blog author name")
///             .attach(|blog| &mut blog.author),
///     )
///     .build()?;
/// ```
pub struct Association<M, R: Model> {
    name: String,
    foreign_key: String,
    related_key: String,
    factory: Factory<R>,
    options: CallOptions,
    slot: Option<RelationSlot<M, R>>,
}

impl<M: Model, R: Model> Association<M, R> {
    /// Declares an association.
    ///
    /// # Arguments
    /// - `name` - Association name, also used by `with_related` overrides
    /// - `foreign_key` - Owner field receiving the related primary key
    /// - `related_key` - Field of the related model holding its primary key
    /// - `factory` - Factory creating the related record
    pub fn new(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        related_key: impl Into<String>,
        factory: &Factory<R>,
    ) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            related_key: related_key.into(),
            factory: factory.clone(),
            options: CallOptions::new(),
            slot: None,
        }
    }

    /// Overrides a field of the related record.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options = self.options.with_field(name, value);
        self
    }

    /// Selects traits of the related factory.
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.with_traits(traits);
        self
    }

    /// Declares the owner field that receives the related instance.
    ///
    /// Resolution starts from the owner's `Default` value. When that value already holds a
    /// related instance in this slot, the instance is reused and no related record is created.
    pub fn attach(mut self, slot: RelationSlot<M, R>) -> Self {
        self.slot = Some(slot);
        self
    }
}

/// Type-erased association as stored on an owner definition.
#[async_trait]
pub(crate) trait Associate<M>: Send + Sync {
    fn name(&self) -> &str;

    fn foreign_key(&self) -> &str;

    /// Checks the related side of the declaration.
    fn validate(&self, owner_table: &str) -> Result<(), DefinitionError>;

    /// Resolves the related record and attaches it to `owner`.
    ///
    /// # Arguments
    /// - `owner` - Instance being built
    /// - `provided` - Related instance supplied by the caller, reused instead of creating one;
    ///   an instance already sitting in the relation slot is reused the same way
    /// - `fixtures` - Coordinator used to create the related record
    ///
    /// # Returns
    /// - `Ok(Value)` - Primary key of the related record
    /// - `Err(FactoryError)` - Creating the related record failed, or `provided` has the wrong type
    async fn associate(
        &self,
        owner: &mut M,
        provided: Option<&(dyn Any + Send + Sync)>,
        fixtures: &Fixtures,
    ) -> Result<Value, FactoryError>;
}

#[async_trait]
impl<M: Model, R: Model> Associate<M> for Association<M, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    fn validate(&self, owner_table: &str) -> Result<(), DefinitionError> {
        let related = self.factory.schema();
        if related.index_of(&self.related_key).is_none() {
            return Err(DefinitionError::UnknownRelatedField {
                table: owner_table.to_string(),
                association: self.name.clone(),
                field: self.related_key.clone(),
            });
        }

        for (field, _) in self.options.fields() {
            if related.index_of(field).is_none() {
                return Err(DefinitionError::UnknownRelatedField {
                    table: owner_table.to_string(),
                    association: self.name.clone(),
                    field: field.clone(),
                });
            }
        }

        for name in self.options.traits() {
            if !self.factory.has_trait(name) {
                return Err(DefinitionError::UnknownTrait {
                    table: self.factory.table().to_string(),
                    name: name.clone(),
                });
            }
        }

        Ok(())
    }

    async fn associate(
        &self,
        owner: &mut M,
        provided: Option<&(dyn Any + Send + Sync)>,
        fixtures: &Fixtures,
    ) -> Result<Value, FactoryError> {
        let attached = self.slot.and_then(|slot| slot(owner).as_deref().cloned());
        let related = match (provided, attached) {
            (Some(instance), _) => {
                let instance = instance.downcast_ref::<R>().ok_or_else(|| {
                    FactoryError::InvalidValue {
                        field: self.name.clone(),
                        source: ValueError::Mismatch {
                            expected: std::any::type_name::<R>(),
                            found: "instance of another model",
                        },
                    }
                })?;
                tracing::debug!(
                    association = %self.name,
                    table = %self.factory.table(),
                    "reusing provided related instance"
                );
                instance.clone()
            }
            (None, Some(attached)) => {
                tracing::debug!(
                    association = %self.name,
                    table = %self.factory.table(),
                    "reusing attached related instance"
                );
                attached
            }
            (None, None) => {
                tracing::debug!(
                    association = %self.name,
                    table = %self.factory.table(),
                    "creating related record"
                );
                fixtures.create_with(&self.factory, &self.options).await?
            }
        };

        let key = related_key(self.factory.schema(), &self.related_key, &related);
        if let Some(slot) = self.slot {
            *slot(owner) = Some(Box::new(related));
        }

        Ok(key)
    }
}

fn related_key<R>(schema: &Schema<R>, field: &str, related: &R) -> Value {
    schema
        .index_of(field)
        .map(|index| schema.field(index).get(related))
        .unwrap_or_default()
}
