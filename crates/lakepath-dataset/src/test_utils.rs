use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::execution::{SendableRecordBatchStream, TaskContext};
use datafusion::physical_plan::stream::RecordBatchStreamAdapter;

use crate::error::{DatasetError, DatasetResult};
use crate::file_source::FileSource;
use crate::format::{FileFormat, ScanOptions, ScanTask, ScanTaskIterator};
use crate::fragment::{DataFragment, FileDataFragment};

pub const TEST_MAGIC: &[u8] = b"TEST";

/// A format for files that start with [`TEST_MAGIC`] and contain no rows.
#[derive(Debug)]
pub struct TestFormat {
    schema: SchemaRef,
}

impl TestFormat {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(Schema::new(vec![Field::new("value", DataType::Int64, true)])),
        }
    }
}

#[derive(Debug)]
pub struct TestScanTask {
    schema: SchemaRef,
    options: Arc<ScanOptions>,
}

impl ScanTask for TestScanTask {
    fn options(&self) -> &Arc<ScanOptions> {
        &self.options
    }

    fn execute(&self) -> DatasetResult<SendableRecordBatchStream> {
        Ok(Box::pin(RecordBatchStreamAdapter::new(
            self.schema.clone(),
            futures::stream::empty::<datafusion_common::Result<RecordBatch>>(),
        )))
    }
}

#[async_trait]
impl FileFormat for TestFormat {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &str {
        "test"
    }

    async fn is_supported(&self, source: &FileSource) -> DatasetResult<bool> {
        let head = source.read_range(0..TEST_MAGIC.len()).await;
        Ok(matches!(head, Ok(head) if head.as_ref() == TEST_MAGIC))
    }

    async fn inspect(&self, source: &FileSource) -> DatasetResult<SchemaRef> {
        if !self.is_supported(source).await? {
            return Err(DatasetError::invalid("not a test file"));
        }
        Ok(self.schema.clone())
    }

    fn scan_file(
        &self,
        _source: &FileSource,
        options: Arc<ScanOptions>,
        _context: Arc<TaskContext>,
    ) -> DatasetResult<ScanTaskIterator> {
        let task: Arc<dyn ScanTask> = Arc::new(TestScanTask {
            schema: self.schema.clone(),
            options,
        });
        Ok(Box::new(std::iter::once(Ok(task))))
    }

    fn make_fragment(
        self: Arc<Self>,
        source: FileSource,
        options: Arc<ScanOptions>,
    ) -> DatasetResult<Arc<dyn DataFragment>> {
        Ok(Arc::new(FileDataFragment::new(source, self, options)))
    }
}
