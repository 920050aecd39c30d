//! Per-call overrides.

use std::{any::Any, fmt, sync::Arc};

use crate::{model::Model, value::Value};

pub(crate) type Related = Arc<dyn Any + Send + Sync>;

/// Options for a single build, create or create-slice call.
///
/// - **Field overrides** always win over base and trait rules and are visible to every dynamic
///   rule of the call.
/// - **Traits** are applied in the order given; a later trait wins on field collisions.
/// - **Related instances** replace association resolution: the given instance is attached and its
///   primary key copied into the foreign-key field instead of creating a new related record.
///
/// The same type carries the overrides an association applies to its related factory.
#[derive(Clone, Default)]
pub struct CallOptions {
    pub(crate) fields: Vec<(String, Value)>,
    pub(crate) traits: Vec<String>,
    pub(crate) related: Vec<(String, Related)>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides a field by name.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Selects traits, appended after any already selected.
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits.extend(traits.into_iter().map(Into::into));
        self
    }

    /// Supplies the related instance for the association named `association`.
    pub fn with_related<R: Model>(mut self, association: impl Into<String>, related: R) -> Self {
        self.related.push((association.into(), Arc::new(related)));
        self
    }

    /// Appends every option of `other` after the options already set.
    pub fn merge(mut self, other: CallOptions) -> Self {
        self.fields.extend(other.fields);
        self.traits.extend(other.traits);
        self.related.extend(other.related);
        self
    }

    /// Selected trait names in application order.
    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    /// Field overrides in application order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub(crate) fn overrides(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// The last related instance supplied for an association.
    pub(crate) fn related(&self, association: &str) -> Option<&Related> {
        self.related
            .iter()
            .rev()
            .find(|(name, _)| name == association)
            .map(|(_, related)| related)
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("fields", &self.fields)
            .field("traits", &self.traits)
            .field(
                "related",
                &self.related.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
