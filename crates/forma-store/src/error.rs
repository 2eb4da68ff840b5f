use forma_schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("form cannot be saved: {0}")]
    Invalid(#[from] SchemaError),

    #[error("form {0} is already saved")]
    AlreadyExists(String),

    #[error("stored forms are unreadable: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}
