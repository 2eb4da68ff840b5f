/// Authoring-time problems that block a form from being saved or run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("form name is required")]
    EmptyFormName,

    #[error("field {field}: label is required")]
    EmptyLabel { field: String },

    #[error("field {field}: key is required")]
    EmptyKey { field: String },

    #[error("duplicate field key: {key}")]
    DuplicateKey { key: String },

    #[error("duplicate field id: {id}")]
    DuplicateFieldId { id: String },

    #[error("field {field}: duplicate option value {value:?}")]
    DuplicateOptionValue { field: String, value: String },

    #[error("no field with id {id}")]
    UnknownField { id: String },
}
