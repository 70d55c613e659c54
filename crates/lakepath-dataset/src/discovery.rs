use std::sync::Arc;

use datafusion::arrow::datatypes::{Schema, SchemaRef};
use datafusion_common::DataFusionError;
use futures::TryStreamExt;
use lakepath_common::config::DiscoveryConfig;
use lakepath_partition::expression::trivially_true;
use lakepath_partition::path::strip_base;
use lakepath_partition::{PartitionScheme, PartitionSchemeOrDiscovery};
use log::debug;
use object_store::path::Path;
use object_store::ObjectStore;

use crate::data_source::FileSystemDataSource;
use crate::error::DatasetResult;
use crate::file_source::FileSource;
use crate::format::FileFormat;
use crate::forest::{add_implied_directories, FileStats, PathForest};

#[derive(Debug, Clone)]
pub struct FileSystemDiscoveryOptions {
    /// The directory below which path segments are parsed for partition information.
    /// Defaults to the discovery root.
    pub partition_base_dir: Option<String>,
    /// Files with a path segment starting with one of these prefixes are skipped.
    pub ignore_prefixes: Vec<String>,
    /// Whether to skip files that the format cannot read.
    pub exclude_invalid_files: bool,
    pub partition_scheme: PartitionSchemeOrDiscovery,
}

impl Default for FileSystemDiscoveryOptions {
    fn default() -> Self {
        Self {
            partition_base_dir: None,
            ignore_prefixes: vec![".".to_string(), "_".to_string()],
            exclude_invalid_files: false,
            partition_scheme: PartitionSchemeOrDiscovery::default(),
        }
    }
}

impl FileSystemDiscoveryOptions {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            ignore_prefixes: config.ignore_prefixes.clone(),
            exclude_invalid_files: config.exclude_invalid_files,
            ..Default::default()
        }
    }

    pub fn with_partition_base_dir(mut self, partition_base_dir: impl Into<String>) -> Self {
        self.partition_base_dir = Some(partition_base_dir.into());
        self
    }

    pub fn with_partition_scheme(
        mut self,
        partition_scheme: impl Into<PartitionSchemeOrDiscovery>,
    ) -> Self {
        self.partition_scheme = partition_scheme.into();
        self
    }

    fn is_ignored(&self, segments: &[&str]) -> bool {
        segments.iter().any(|segment| {
            self.ignore_prefixes
                .iter()
                .any(|prefix| segment.starts_with(prefix.as_str()))
        })
    }
}

/// Creates a [`FileSystemDataSource`] from the files below a root path.
#[derive(Debug)]
pub struct FileSystemDataSourceDiscovery {
    store: Arc<dyn ObjectStore>,
    root: Path,
    format: Arc<dyn FileFormat>,
    options: FileSystemDiscoveryOptions,
    files: Vec<FileStats>,
}

impl FileSystemDataSourceDiscovery {
    /// Lists the files below `root`, applying the filters of the options.
    pub async fn make(
        store: Arc<dyn ObjectStore>,
        root: Path,
        format: Arc<dyn FileFormat>,
        options: FileSystemDiscoveryOptions,
    ) -> DatasetResult<Self> {
        let objects = store.list(Some(&root)).try_collect::<Vec<_>>().await?;
        let listed = objects.len();
        let mut files = vec![];
        for meta in objects {
            let path = meta.location.to_string();
            let ignored = strip_base(&path, root.as_ref())
                .is_some_and(|segments| options.is_ignored(&segments));
            if ignored {
                continue;
            }
            if options.exclude_invalid_files {
                let source = FileSource::from_object_meta(&meta, store.clone());
                if !format.is_supported(&source).await? {
                    debug!("skipping file '{path}' not supported by {}", format.type_name());
                    continue;
                }
            }
            files.push(FileStats::from(meta));
        }
        debug!(
            "discovered {} of {listed} listed file(s) below '{root}'",
            files.len()
        );
        Ok(Self {
            store,
            root,
            format,
            options,
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &FileSystemDiscoveryOptions {
        &self.options
    }

    /// The files that will make up the data source.
    pub fn files(&self) -> &[FileStats] {
        &self.files
    }

    fn partition_base_dir(&self) -> &str {
        self.options
            .partition_base_dir
            .as_deref()
            .unwrap_or(self.root.as_ref())
    }

    /// The directory parts of the file paths, relative to the partition base directory.
    fn partition_paths(&self) -> Vec<String> {
        let base = self.partition_base_dir();
        self.files
            .iter()
            .filter_map(|file| {
                let segments = strip_base(&file.path, base)?;
                let (_, directories) = segments.split_last()?;
                Some(directories.join("/"))
            })
            .collect()
    }

    /// Returns the schema of the partition fields.
    pub fn inspect_partition_schema(&self) -> DatasetResult<SchemaRef> {
        match &self.options.partition_scheme {
            PartitionSchemeOrDiscovery::Scheme(scheme) => Ok(scheme.schema().clone()),
            PartitionSchemeOrDiscovery::Discovery(discovery) => {
                let paths = self.partition_paths();
                let paths = paths.iter().map(|p| p.as_str()).collect::<Vec<_>>();
                Ok(discovery.inspect(&paths)?)
            }
        }
    }

    /// Returns the schema of the files merged with the schema of the partition fields.
    pub async fn inspect(&self) -> DatasetResult<SchemaRef> {
        let mut schemas = vec![];
        for file in self.files.iter() {
            let path = Path::parse(&file.path).map_err(object_store::Error::from)?;
            let source = FileSource::from_path(path, self.store.clone());
            schemas.push(self.format.inspect(&source).await?.as_ref().clone());
        }
        schemas.push(self.inspect_partition_schema()?.as_ref().clone());
        let schema = Schema::try_merge(schemas).map_err(DataFusionError::from)?;
        Ok(Arc::new(schema))
    }

    fn partition_scheme(
        &self,
        partition_schema: Option<SchemaRef>,
    ) -> DatasetResult<Arc<dyn PartitionScheme>> {
        match &self.options.partition_scheme {
            PartitionSchemeOrDiscovery::Scheme(scheme) => Ok(scheme.clone()),
            PartitionSchemeOrDiscovery::Discovery(discovery) => {
                let schema = match partition_schema {
                    Some(schema) => schema,
                    None => self.inspect_partition_schema()?,
                };
                Ok(discovery.finish(&schema)?)
            }
        }
    }

    /// Creates the data source. The partition schema is inspected
    /// from the listing unless one is given.
    pub fn finish(
        &self,
        partition_schema: Option<SchemaRef>,
    ) -> DatasetResult<Arc<FileSystemDataSource>> {
        let scheme = self.partition_scheme(partition_schema)?;
        let stats = add_implied_directories(self.files.clone());
        let forest = PathForest::make(stats)?;
        let base = self.partition_base_dir();
        let partitions = forest
            .nodes()
            .map(|node| {
                if !node.stats().is_directory() {
                    return Ok(trivially_true());
                }
                match strip_base(&node.stats().path, base) {
                    Some(segments) if !segments.is_empty() => {
                        Ok(scheme.parse_segment(node.stats().name(), segments.len() - 1)?)
                    }
                    _ => Ok(trivially_true()),
                }
            })
            .collect::<DatasetResult<Vec<_>>>()?;
        debug!(
            "finished discovery below '{}' with {} partition scheme",
            self.root,
            scheme.type_name()
        );
        FileSystemDataSource::make_from_forest(
            self.store.clone(),
            forest,
            partitions,
            trivially_true(),
            self.format.clone(),
        )
    }
}
