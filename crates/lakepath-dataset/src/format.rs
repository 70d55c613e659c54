use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::execution::{SendableRecordBatchStream, TaskContext};
use datafusion_expr::Expr;
use lakepath_common::config::{ScanConfig, DEFAULT_BATCH_SIZE};
use lakepath_partition::expression::trivially_true;

use crate::error::DatasetResult;
use crate::file_source::FileSource;
use crate::fragment::DataFragment;

/// Options shared by the fragments of one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// The schema of the dataset being scanned.
    pub schema: SchemaRef,
    /// The indices of the fields to read, or `None` to read all fields.
    pub projection: Option<Vec<usize>>,
    /// The row filter requested by the caller.
    pub filter: Expr,
    /// The predicate known to hold for every row of the fragment being scanned.
    pub partition_expression: Expr,
    pub batch_size: usize,
}

impl ScanOptions {
    pub fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            projection: None,
            filter: trivially_true(),
            partition_expression: trivially_true(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn from_config(schema: SchemaRef, config: &ScanConfig) -> Self {
        Self::new(schema).with_batch_size(config.batch_size)
    }

    pub fn with_projection(mut self, projection: Option<Vec<usize>>) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_partition_expression(mut self, partition_expression: Expr) -> Self {
        self.partition_expression = partition_expression;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// A unit of scan work produced by a file format.
pub trait ScanTask: Debug + Send + Sync {
    fn options(&self) -> &Arc<ScanOptions>;

    fn execute(&self) -> DatasetResult<SendableRecordBatchStream>;
}

pub type ScanTaskIterator = Box<dyn Iterator<Item = DatasetResult<Arc<dyn ScanTask>>> + Send>;

/// The reader of one kind of file, such as Parquet or CSV.
#[async_trait]
pub trait FileFormat: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// The name identifying the kind of file format.
    fn type_name(&self) -> &str;

    /// Whether the file source is readable by this format.
    /// This should be cheap, e.g. a check of the magic bytes or the extension.
    async fn is_supported(&self, source: &FileSource) -> DatasetResult<bool>;

    /// Returns the schema of the file.
    async fn inspect(&self, source: &FileSource) -> DatasetResult<SchemaRef>;

    /// Creates the scan tasks for a file. The tasks are produced lazily.
    fn scan_file(
        &self,
        source: &FileSource,
        options: Arc<ScanOptions>,
        context: Arc<TaskContext>,
    ) -> DatasetResult<ScanTaskIterator>;

    /// Creates a fragment for a file without doing any I/O.
    fn make_fragment(
        self: Arc<Self>,
        source: FileSource,
        options: Arc<ScanOptions>,
    ) -> DatasetResult<Arc<dyn DataFragment>>;
}
