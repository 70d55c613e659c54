//! Datasets made of files in an object store.
//!
//! A [`FileSystemDataSource`] pairs a listing of files with the partition
//! expressions parsed from their paths, and yields one [`FileDataFragment`]
//! for each file. Reading the files is delegated to a [`FileFormat`].

mod data_source;
mod discovery;
mod error;
mod file_source;
mod format;
mod forest;
mod fragment;
#[cfg(test)]
mod test_utils;

pub use data_source::{DataSource, FileSystemDataSource};
pub use discovery::{FileSystemDataSourceDiscovery, FileSystemDiscoveryOptions};
pub use error::{DatasetError, DatasetResult};
pub use file_source::{infer_compression, FileSource, FileSourceKind};
pub use format::{FileFormat, ScanOptions, ScanTask, ScanTaskIterator};
pub use forest::{add_implied_directories, FileKind, FileStats, NodeRef, PathForest, VisitAction};
pub use fragment::{DataFragment, DataFragmentIterator, FileDataFragment};
