use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use datafusion_common::parsers::CompressionTypeVariant;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore};

use crate::error::{DatasetError, DatasetResult};

const COMPRESSED_VARIANTS: [CompressionTypeVariant; 4] = [
    CompressionTypeVariant::GZIP,
    CompressionTypeVariant::BZIP2,
    CompressionTypeVariant::XZ,
    CompressionTypeVariant::ZSTD,
];

fn compression_extension(variant: CompressionTypeVariant) -> &'static str {
    match variant {
        CompressionTypeVariant::GZIP => ".gz",
        CompressionTypeVariant::BZIP2 => ".bz2",
        CompressionTypeVariant::XZ => ".xz",
        CompressionTypeVariant::ZSTD => ".zst",
        CompressionTypeVariant::UNCOMPRESSED => "",
    }
}

/// Infers the compression of a file from the suffix of its path.
pub fn infer_compression(path: &str) -> CompressionTypeVariant {
    COMPRESSED_VARIANTS
        .into_iter()
        .find(|v| path.ends_with(compression_extension(*v)))
        .unwrap_or(CompressionTypeVariant::UNCOMPRESSED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSourceKind {
    Path,
    Buffer,
}

#[derive(Debug, Clone)]
enum FileLocation {
    Path {
        path: Path,
        store: Arc<dyn ObjectStore>,
    },
    Buffer(Bytes),
}

/// The location of a file's bytes: a path in an object store,
/// or a buffer which can be read like a file.
///
/// Creating a file source never touches the storage.
#[derive(Debug, Clone)]
pub struct FileSource {
    location: FileLocation,
    compression: CompressionTypeVariant,
}

impl FileSource {
    pub fn from_path(path: Path, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            location: FileLocation::Path { path, store },
            compression: CompressionTypeVariant::UNCOMPRESSED,
        }
    }

    /// Creates a file source for a listed object, inferring the compression from its suffix.
    pub fn from_object_meta(meta: &ObjectMeta, store: Arc<dyn ObjectStore>) -> Self {
        let compression = infer_compression(meta.location.as_ref());
        Self::from_path(meta.location.clone(), store).with_compression(compression)
    }

    pub fn from_buffer(buffer: impl Into<Bytes>) -> Self {
        Self {
            location: FileLocation::Buffer(buffer.into()),
            compression: CompressionTypeVariant::UNCOMPRESSED,
        }
    }

    pub fn with_compression(mut self, compression: CompressionTypeVariant) -> Self {
        self.compression = compression;
        self
    }

    pub fn kind(&self) -> FileSourceKind {
        match &self.location {
            FileLocation::Path { .. } => FileSourceKind::Path,
            FileLocation::Buffer(_) => FileSourceKind::Buffer,
        }
    }

    /// The raw compression of the file. The bytes are never decompressed here.
    pub fn compression(&self) -> CompressionTypeVariant {
        self.compression
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            FileLocation::Path { path, .. } => Some(path),
            FileLocation::Buffer(_) => None,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn ObjectStore>> {
        match &self.location {
            FileLocation::Path { store, .. } => Some(store),
            FileLocation::Buffer(_) => None,
        }
    }

    pub fn buffer(&self) -> Option<&Bytes> {
        match &self.location {
            FileLocation::Path { .. } => None,
            FileLocation::Buffer(buffer) => Some(buffer),
        }
    }

    /// The size of a buffer source. The size of a path source is only known to the store.
    pub fn size(&self) -> Option<usize> {
        self.buffer().map(|buffer| buffer.len())
    }

    /// Opens the file as a stream of byte chunks.
    pub async fn open(&self) -> DatasetResult<BoxStream<'static, DatasetResult<Bytes>>> {
        match &self.location {
            FileLocation::Path { path, store } => {
                let result = store.get(path).await?;
                Ok(result.into_stream().map_err(DatasetError::from).boxed())
            }
            FileLocation::Buffer(buffer) => {
                let buffer = buffer.clone();
                Ok(futures::stream::once(async move { Ok(buffer) }).boxed())
            }
        }
    }

    /// Reads a byte range of the file.
    pub async fn read_range(&self, range: Range<usize>) -> DatasetResult<Bytes> {
        match &self.location {
            FileLocation::Path { path, store } => Ok(store.get_range(path, range).await?),
            FileLocation::Buffer(buffer) => {
                if range.start > range.end || range.end > buffer.len() {
                    return Err(DatasetError::invalid(format!(
                        "range {range:?} is out of bounds for a buffer of {} bytes",
                        buffer.len()
                    )));
                }
                Ok(buffer.slice(range))
            }
        }
    }
}

/// Path sources are equal when they refer to the same path in the same store instance.
/// Buffer sources are equal when their bytes are equal.
/// The compression is not compared.
impl PartialEq for FileSource {
    fn eq(&self, other: &Self) -> bool {
        match (&self.location, &other.location) {
            (
                FileLocation::Path { path, store },
                FileLocation::Path {
                    path: other_path,
                    store: other_store,
                },
            ) => {
                path == other_path
                    && std::ptr::addr_eq(Arc::as_ptr(store), Arc::as_ptr(other_store))
            }
            (FileLocation::Buffer(buffer), FileLocation::Buffer(other_buffer)) => {
                buffer == other_buffer
            }
            _ => false,
        }
    }
}
