//! Shared utilities for the dataset integration tests.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use datafusion::arrow::array::Int64Array;
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::execution::{SendableRecordBatchStream, TaskContext};
use datafusion::physical_plan::stream::RecordBatchStreamAdapter;
use datafusion_common::DataFusionError;
use futures::TryStreamExt;
use lakepath_dataset::{
    DataFragment, DatasetError, DatasetResult, FileDataFragment, FileFormat, FileSource,
    ScanOptions, ScanTask, ScanTaskIterator,
};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

pub const MAGIC: &str = "LINES\n";

/// A format for files that start with [`MAGIC`], followed by one integer per line.
#[derive(Debug)]
pub struct LinesFormat {
    schema: SchemaRef,
}

impl LinesFormat {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(Schema::new(vec![Field::new(
                "value",
                DataType::Int64,
                false,
            )])),
        }
    }
}

fn parse_values(data: &[u8]) -> DatasetResult<Vec<i64>> {
    let text = std::str::from_utf8(data).map_err(|e| DatasetError::invalid(e.to_string()))?;
    let Some(body) = text.strip_prefix(MAGIC) else {
        return Err(DatasetError::invalid("missing magic"));
    };
    body.lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<i64>()
                .map_err(|e| DatasetError::invalid(format!("{line}: {e}")))
        })
        .collect()
}

#[derive(Debug)]
pub struct LinesScanTask {
    source: FileSource,
    schema: SchemaRef,
    options: Arc<ScanOptions>,
}

impl ScanTask for LinesScanTask {
    fn options(&self) -> &Arc<ScanOptions> {
        &self.options
    }

    fn execute(&self) -> DatasetResult<SendableRecordBatchStream> {
        let source = self.source.clone();
        let schema = self.schema.clone();
        let batch_size = self.options.batch_size;
        let stream = futures::stream::once(async move {
            let chunks: Vec<Bytes> = source.open().await?.try_collect().await?;
            let values = parse_values(&chunks.concat())?;
            let batches = values
                .chunks(batch_size)
                .map(|chunk| {
                    RecordBatch::try_new(
                        schema.clone(),
                        vec![Arc::new(Int64Array::from(chunk.to_vec()))],
                    )
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(DataFusionError::from)?;
            Ok::<_, DatasetError>(batches)
        })
        .map_err(|e| DataFusionError::External(Box::new(e)))
        .map_ok(|batches| futures::stream::iter(batches.into_iter().map(Ok)))
        .try_flatten();
        Ok(Box::pin(RecordBatchStreamAdapter::new(
            self.schema.clone(),
            stream,
        )))
    }
}

#[async_trait]
impl FileFormat for LinesFormat {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &str {
        "lines"
    }

    async fn is_supported(&self, source: &FileSource) -> DatasetResult<bool> {
        let head = source.read_range(0..MAGIC.len()).await;
        Ok(matches!(head, Ok(head) if head.as_ref() == MAGIC.as_bytes()))
    }

    async fn inspect(&self, source: &FileSource) -> DatasetResult<SchemaRef> {
        if !self.is_supported(source).await? {
            return Err(DatasetError::invalid("not a lines file"));
        }
        Ok(self.schema.clone())
    }

    fn scan_file(
        &self,
        source: &FileSource,
        options: Arc<ScanOptions>,
        _context: Arc<TaskContext>,
    ) -> DatasetResult<ScanTaskIterator> {
        let task: Arc<dyn ScanTask> = Arc::new(LinesScanTask {
            source: source.clone(),
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

/// Creates an in-memory store with a lines file for each `(path, values)` pair.
pub async fn lines_store(files: &[(&str, &[i64])]) -> Arc<dyn ObjectStore> {
    let store = InMemory::new();
    for (path, values) in files {
        let mut content = MAGIC.to_string();
        for value in values.iter() {
            content.push_str(&format!("{value}\n"));
        }
        store
            .put(&Path::from(*path), PutPayload::from(content))
            .await
            .unwrap();
    }
    Arc::new(store)
}

/// Scans a fragment and returns all values it contains.
pub async fn scan_values(fragment: &dyn DataFragment) -> (Vec<i64>, usize) {
    let tasks = fragment
        .scan(Arc::new(TaskContext::default()))
        .unwrap()
        .collect::<DatasetResult<Vec<_>>>()
        .unwrap();
    let mut values = vec![];
    let mut num_batches = 0;
    for task in tasks {
        let batches: Vec<RecordBatch> = task.execute().unwrap().try_collect().await.unwrap();
        for batch in batches {
            num_batches += 1;
            let array = batch
                .column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap();
            values.extend(array.values().iter().copied());
        }
    }
    (values, num_batches)
}
