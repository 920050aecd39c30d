use thiserror::Error;

/// Malformed factory declaration.
///
/// Raised by `DefinitionBuilder::build()` while validating a declaration, and at call time when
/// a selected trait does not exist. Definition errors are setup mistakes and are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// Factory was declared without a store table name.
    #[error("factory table name must not be empty")]
    EmptyTable,

    /// The model schema does not declare a primary-key field.
    #[error("model for `{table}` has no primary key field")]
    MissingPrimaryKey { table: String },

    /// A rule references a field the model schema does not declare.
    #[error("unknown field `{field}` in factory for `{table}`")]
    UnknownField { table: String, field: String },

    /// An association references a primary-key field missing on the related model.
    #[error("association `{association}` on `{table}` references unknown related field `{field}`")]
    UnknownRelatedField {
        table: String,
        association: String,
        field: String,
    },

    /// Two associations in one rule set write the same foreign-key field.
    #[error("duplicate association for foreign key `{foreign_key}` in factory for `{table}`")]
    DuplicateAssociation { table: String, foreign_key: String },

    /// A trait name was declared twice on one factory.
    #[error("duplicate trait `{name}` in factory for `{table}`")]
    DuplicateTrait { table: String, name: String },

    /// A trait name is not defined on the factory.
    #[error("unknown trait `{name}` for factory `{table}`")]
    UnknownTrait { table: String, name: String },
}
