//! Model shapes and their field schema.
//!
//! A model is any plain struct the tests want instances of. Instead of inspecting the struct at
//! runtime, each model declares a `Schema`: an ordered list of named fields, each with a typed
//! getter/setter pair, an optional store column and one primary-key marker. Factories resolve
//! field names against the schema once, when they are built, and address fields by position
//! afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Model for User {
//!     fn schema() -> Schema<Self> {
//!         Schema::new()
//!             .primary_key("id", |u: &User| &u.id, |u| &mut u.id)
//!             .column("name", |u: &User| &u.name, |u| &mut u.name)
//!             .column_as("nick_name", "nickname", |u: &User| &u.nick_name, |u| &mut u.nick_name)
//!             .transient("now", |u: &User| &u.now, |u| &mut u.now)
//!     }
//! }
//! ```

use crate::{
    error::ValueError,
    value::{FromValue, Value},
};

/// A struct that factories can build, persist and delete.
pub trait Model: Default + Clone + Send + Sync + 'static {
    /// Describes the persisted and settable fields of the model.
    fn schema() -> Schema<Self>;
}

type Getter<M> = Box<dyn Fn(&M) -> Value + Send + Sync>;
type Setter<M> = Box<dyn Fn(&mut M, Value) -> Result<(), ValueError> + Send + Sync>;

/// One named field of a model.
pub struct FieldDef<M> {
    name: &'static str,
    column: Option<&'static str>,
    get: Getter<M>,
    set: Setter<M>,
}

impl<M> FieldDef<M> {
    /// Field name used by rules and overrides.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Store column, or `None` for a transient field that is never persisted.
    pub fn column(&self) -> Option<&'static str> {
        self.column
    }

    /// Reads the field from an instance.
    pub fn get(&self, instance: &M) -> Value {
        (self.get)(instance)
    }

    /// Writes a value into the field of an instance.
    pub fn set(&self, instance: &mut M, value: Value) -> Result<(), ValueError> {
        (self.set)(instance, value)
    }
}

/// Ordered field-name to accessor mapping for one model.
pub struct Schema<M> {
    fields: Vec<FieldDef<M>>,
    primary_key: Option<usize>,
}

impl<M: 'static> Schema<M> {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            primary_key: None,
        }
    }

    /// Adds the primary-key field, persisted under a column of the same name.
    ///
    /// Declaring a second primary key replaces the first marker.
    pub fn primary_key<T>(
        mut self,
        name: &'static str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.primary_key = Some(self.fields.len());
        self.push(name, Some(name), get, get_mut)
    }

    /// Adds a persisted field stored under a column of the same name.
    pub fn column<T>(
        self,
        name: &'static str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.push(name, Some(name), get, get_mut)
    }

    /// Adds a persisted field stored under a differently named column.
    pub fn column_as<T>(
        self,
        name: &'static str,
        column: &'static str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.push(name, Some(column), get, get_mut)
    }

    /// Adds a field that rules and hooks can set but that is never written to the store.
    pub fn transient<T>(
        self,
        name: &'static str,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.push(name, None, get, get_mut)
    }

    fn push<T>(
        mut self,
        name: &'static str,
        column: Option<&'static str>,
        get: fn(&M) -> &T,
        get_mut: fn(&mut M) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.fields.push(FieldDef {
            name,
            column,
            get: Box::new(move |instance| get(instance).clone().into()),
            set: Box::new(move |instance, value| {
                *get_mut(instance) = T::from_value(value)?;
                Ok(())
            }),
        });
        self
    }
}

impl<M: 'static> Default for Schema<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Schema<M> {
    /// Position of a field by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Field at a position returned by `index_of`.
    pub fn field(&self, index: usize) -> &FieldDef<M> {
        &self.fields[index]
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDef<M>] {
        &self.fields
    }

    /// The primary-key field, if one was declared.
    pub fn primary_key_field(&self) -> Option<&FieldDef<M>> {
        self.primary_key.map(|index| &self.fields[index])
    }

    /// Collects `(column, value)` pairs for every persisted field.
    ///
    /// # Arguments
    /// - `instance` - Instance to read
    /// - `skip_primary_key` - Leave the primary-key column out so the store assigns it
    pub fn row(&self, instance: &M, skip_primary_key: bool) -> Vec<(&'static str, Value)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(index, _)| !(skip_primary_key && Some(*index) == self.primary_key))
            .filter_map(|(_, field)| field.column.map(|column| (column, field.get(instance))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Tag {
        id: i32,
        label: String,
        weight: Option<i64>,
        scratch: String,
    }

    impl Model for Tag {
        fn schema() -> Schema<Self> {
            Schema::new()
                .primary_key("id", |t: &Tag| &t.id, |t| &mut t.id)
                .column_as("label", "tag_label", |t: &Tag| &t.label, |t| &mut t.label)
                .column("weight", |t: &Tag| &t.weight, |t| &mut t.weight)
                .transient("scratch", |t: &Tag| &t.scratch, |t| &mut t.scratch)
        }
    }

    #[test]
    fn gets_and_sets_fields_by_index() {
        let schema = Tag::schema();
        let mut tag = Tag::default();

        let label = schema.index_of("label").unwrap();
        schema.field(label).set(&mut tag, "red".into()).unwrap();
        assert_eq!(tag.label, "red");
        assert_eq!(schema.field(label).get(&tag), Value::from("red"));

        let weight = schema.index_of("weight").unwrap();
        schema.field(weight).set(&mut tag, Value::Null).unwrap();
        assert_eq!(tag.weight, None);

        assert!(schema.index_of("missing").is_none());
    }

    #[test]
    fn rejects_values_of_the_wrong_kind() {
        let schema = Tag::schema();
        let mut tag = Tag::default();
        let id = schema.index_of("id").unwrap();

        assert!(schema.field(id).set(&mut tag, "one".into()).is_err());
        assert_eq!(tag.id, 0);
    }

    #[test]
    fn builds_rows_from_persisted_columns_only() {
        let schema = Tag::schema();
        let tag = Tag {
            id: 4,
            label: "blue".to_string(),
            weight: Some(2),
            scratch: "not stored".to_string(),
        };

        assert_eq!(
            schema.row(&tag, false),
            vec![
                ("id", Value::Int(4)),
                ("tag_label", Value::from("blue")),
                ("weight", Value::Int(2)),
            ]
        );
        assert_eq!(schema.row(&tag, true).len(), 2);
        assert_eq!(schema.primary_key_field().unwrap().name(), "id");
    }
}
