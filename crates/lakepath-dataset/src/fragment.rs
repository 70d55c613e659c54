use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use datafusion::execution::TaskContext;
use datafusion_expr::Expr;

use crate::error::DatasetResult;
use crate::file_source::FileSource;
use crate::format::{FileFormat, ScanOptions, ScanTaskIterator};

/// A unit of data that can be scanned independently.
pub trait DataFragment: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn scan_options(&self) -> &Arc<ScanOptions>;

    /// The predicate known to hold for every row of this fragment.
    fn partition_expression(&self) -> &Expr {
        &self.scan_options().partition_expression
    }

    fn scan(&self, context: Arc<TaskContext>) -> DatasetResult<ScanTaskIterator>;
}

pub type DataFragmentIterator<'a> =
    Box<dyn Iterator<Item = DatasetResult<Arc<dyn DataFragment>>> + Send + 'a>;

/// A fragment stored in a file with a known format.
#[derive(Debug, Clone)]
pub struct FileDataFragment {
    source: FileSource,
    format: Arc<dyn FileFormat>,
    scan_options: Arc<ScanOptions>,
}

impl FileDataFragment {
    pub fn new(
        source: FileSource,
        format: Arc<dyn FileFormat>,
        scan_options: Arc<ScanOptions>,
    ) -> Self {
        Self {
            source,
            format,
            scan_options,
        }
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    pub fn format(&self) -> &Arc<dyn FileFormat> {
        &self.format
    }
}

impl DataFragment for FileDataFragment {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn scan_options(&self) -> &Arc<ScanOptions> {
        &self.scan_options
    }

    fn scan(&self, context: Arc<TaskContext>) -> DatasetResult<ScanTaskIterator> {
        self.format
            .scan_file(&self.source, self.scan_options.clone(), context)
    }
}

/// Fragments are equal when they read the same source with the same format
/// instance and equal scan options.
impl PartialEq for FileDataFragment {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && std::ptr::addr_eq(Arc::as_ptr(&self.format), Arc::as_ptr(&other.format))
            && self.scan_options == other.scan_options
    }
}
