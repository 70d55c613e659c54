use datafusion_common::DataFusionError;
use lakepath_partition::PartitionError;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    #[error("error in DataFusion: {0}")]
    DataFusion(#[from] DataFusionError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DatasetError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DatasetError::InvalidArgument(message.into())
    }
}
