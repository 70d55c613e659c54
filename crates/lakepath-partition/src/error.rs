use thiserror::Error;

pub type PartitionResult<T> = Result<T, PartitionError>;

#[derive(Debug, Error)]
pub enum PartitionError {
    /// A partition value cannot be represented as the declared field type,
    /// or a field required by a scheme is missing from a schema.
    #[error("type error: {0}")]
    TypeError(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl PartitionError {
    pub fn type_error(message: impl Into<String>) -> Self {
        PartitionError::TypeError(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        PartitionError::NotImplemented(message.into())
    }
}
