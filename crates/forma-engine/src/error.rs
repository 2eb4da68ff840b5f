use forma_schema::SchemaError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid form: {0}")]
    Schema(#[from] SchemaError),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {0} is derived and cannot be edited")]
    DerivedReadOnly(String),

    #[error("field {0} is a checkbox and takes a list of values")]
    NotAList(String),
}
