//! Field value strategies.

use std::{fmt, sync::Arc};

use crate::{error::BoxError, value::Value};

/// Maps a raw sequence counter to a field value.
pub type Generator = Arc<dyn Fn(i64) -> Result<Value, BoxError> + Send + Sync>;

/// Derives a field value from the instance resolved so far.
pub type Derive<M> = Arc<dyn Fn(&M) -> Result<Value, BoxError> + Send + Sync>;

/// How one field gets its value.
pub enum FieldRule<M> {
    /// A fixed value, cloned into every instance.
    Static(Value),

    /// A value derived from a per-factory, per-field counter starting at `seed`.
    Sequence { seed: i64, generator: Generator },

    /// A value computed from the partially built instance. Every field assigned earlier in the
    /// resolution plan, and every call-site override, is already set when it runs.
    ///
    /// Associations resolve after all field rules, so a foreign key filled by an association
    /// still holds its default value here. Read related data from an after-build hook instead.
    Dynamic(Derive<M>),
}

impl<M> Clone for FieldRule<M> {
    fn clone(&self) -> Self {
        match self {
            FieldRule::Static(value) => FieldRule::Static(value.clone()),
            FieldRule::Sequence { seed, generator } => FieldRule::Sequence {
                seed: *seed,
                generator: Arc::clone(generator),
            },
            FieldRule::Dynamic(derive) => FieldRule::Dynamic(Arc::clone(derive)),
        }
    }
}

impl<M> fmt::Debug for FieldRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Static(value) => f.debug_tuple("Static").field(value).finish(),
            FieldRule::Sequence { seed, .. } => {
                f.debug_struct("Sequence").field("seed", seed).finish()
            }
            FieldRule::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// A rule bound to a field position in the model schema.
pub(crate) struct FieldDecl<M> {
    pub(crate) index: usize,
    pub(crate) name: &'static str,
    pub(crate) rule: FieldRule<M>,
}

/// Appends `item`, or replaces the element with the same key in its position.
///
/// Used for rule plans: later declarations win, and a shadowed sequence never draws from its
/// counter.
pub(crate) fn upsert_by<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) {
    let wanted = key(&item);
    match items.iter_mut().find(|existing| key(existing) == wanted) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(index: usize, value: i64) -> FieldDecl<()> {
        FieldDecl {
            index,
            name: "f",
            rule: FieldRule::Static(Value::Int(value)),
        }
    }

    fn value_of(decl: &FieldDecl<()>) -> Value {
        match &decl.rule {
            FieldRule::Static(value) => value.clone(),
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn later_rule_replaces_earlier_in_place() {
        let mut decls = Vec::new();
        upsert_by(&mut decls, decl(0, 1), |d| d.index);
        upsert_by(&mut decls, decl(1, 2), |d| d.index);
        upsert_by(&mut decls, decl(0, 3), |d| d.index);

        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].index, 0);
        assert_eq!(value_of(&decls[0]), Value::Int(3));
        assert_eq!(value_of(&decls[1]), Value::Int(2));
    }
}
