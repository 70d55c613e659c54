use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use datafusion_expr::Expr;
use lakepath_partition::expression::{and_, and_distinct, is_trivially_true, trivially_true};
use log::{debug, trace};
use object_store::path::Path;
use object_store::ObjectStore;

use crate::error::{DatasetError, DatasetResult};
use crate::file_source::{infer_compression, FileSource};
use crate::format::{FileFormat, ScanOptions};
use crate::forest::{FileStats, PathForest};
use crate::fragment::{DataFragment, DataFragmentIterator};

/// A collection of fragments that share a partition expression.
pub trait DataSource: Debug + Send + Sync {
    /// The name identifying the kind of data source.
    fn type_name(&self) -> &str;

    /// The predicate that holds for every row of the data source.
    fn source_partition(&self) -> &Expr;

    /// Returns the fragments of the data source lazily.
    /// Every call returns an independent iterator.
    fn get_fragments(&self, options: Arc<ScanOptions>) -> DataFragmentIterator<'_>;
}

/// A data source of the files of a listing, with one partition expression
/// for each file or directory.
///
/// The partition expressions do not need to cover every node of the listing.
/// Nodes without an expression are unconstrained.
#[derive(Debug)]
pub struct FileSystemDataSource {
    store: Arc<dyn ObjectStore>,
    forest: PathForest,
    partitions: Vec<Expr>,
    source_partition: Expr,
    format: Arc<dyn FileFormat>,
}

impl FileSystemDataSource {
    /// Creates a data source where all partition information is in `source_partition`.
    pub fn make(
        store: Arc<dyn ObjectStore>,
        stats: Vec<FileStats>,
        source_partition: Expr,
        format: Arc<dyn FileFormat>,
    ) -> DatasetResult<Arc<Self>> {
        let forest = PathForest::make(stats)?;
        Self::make_from_forest(store, forest, vec![], source_partition, format)
    }

    /// Creates a data source with partition expressions paired with `stats` by position.
    pub fn make_with_partitions(
        store: Arc<dyn ObjectStore>,
        stats: Vec<FileStats>,
        partitions: Vec<Expr>,
        source_partition: Expr,
        format: Arc<dyn FileFormat>,
    ) -> DatasetResult<Arc<Self>> {
        let partitions = pad_partitions(partitions, stats.len())?;
        let (forest, partitions) = PathForest::make_with_associated(stats, partitions)?;
        Self::make_from_forest(store, forest, partitions, source_partition, format)
    }

    /// Creates a data source with partition expressions index-aligned with `forest`.
    pub fn make_from_forest(
        store: Arc<dyn ObjectStore>,
        forest: PathForest,
        partitions: Vec<Expr>,
        source_partition: Expr,
        format: Arc<dyn FileFormat>,
    ) -> DatasetResult<Arc<Self>> {
        let partitions = pad_partitions(partitions, forest.len())?;
        let partitions = fold_partitions(&forest, partitions);
        debug!(
            "created file system data source with {} node(s) and {} format",
            forest.len(),
            format.type_name()
        );
        Ok(Arc::new(Self {
            store,
            forest,
            partitions,
            source_partition,
            format,
        }))
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn forest(&self) -> &PathForest {
        &self.forest
    }

    /// The partition expressions, index-aligned with the forest.
    pub fn partitions(&self) -> &[Expr] {
        &self.partitions
    }

    pub fn format(&self) -> &Arc<dyn FileFormat> {
        &self.format
    }

    fn make_fragment(
        &self,
        stats: &FileStats,
        partition: &Expr,
        options: &ScanOptions,
    ) -> DatasetResult<Arc<dyn DataFragment>> {
        let path = Path::parse(&stats.path).map_err(object_store::Error::from)?;
        let source = FileSource::from_path(path, self.store.clone())
            .with_compression(infer_compression(&stats.path));
        // the source partition is kept as a single term
        let partition_expression = if is_trivially_true(partition) {
            self.source_partition.clone()
        } else {
            and_([self.source_partition.clone(), partition.clone()])
        };
        trace!("fragment for '{}': {partition_expression}", stats.path);
        let options = Arc::new(options.clone().with_partition_expression(partition_expression));
        self.format.clone().make_fragment(source, options)
    }
}

impl DataSource for FileSystemDataSource {
    fn type_name(&self) -> &str {
        "filesystem"
    }

    fn source_partition(&self) -> &Expr {
        &self.source_partition
    }

    fn get_fragments(&self, options: Arc<ScanOptions>) -> DataFragmentIterator<'_> {
        Box::new(
            self.forest
                .nodes()
                .filter(|node| node.stats().is_file())
                .map(move |node| {
                    self.make_fragment(node.stats(), &self.partitions[node.index()], &options)
                }),
        )
    }
}

impl Display for FileSystemDataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:", self.type_name())?;
        writeln!(f, "  format: {}", self.format.type_name())?;
        writeln!(f, "  source partition: {}", self.source_partition)?;
        for node in self.forest.nodes() {
            let indent = "  ".repeat(node.ancestors().count() + 1);
            let suffix = if node.stats().is_directory() { "/" } else { "" };
            writeln!(
                f,
                "{indent}{}{suffix}: {}",
                node.stats().path,
                self.partitions[node.index()]
            )?;
        }
        Ok(())
    }
}

/// Pads the partitions with trivially-true expressions up to `len`.
fn pad_partitions(mut partitions: Vec<Expr>, len: usize) -> DatasetResult<Vec<Expr>> {
    if partitions.len() > len {
        return Err(DatasetError::invalid(format!(
            "{} partition expression(s) given for {len} listed path(s)",
            partitions.len()
        )));
    }
    partitions.resize_with(len, trivially_true);
    Ok(partitions)
}

/// Folds the expressions of the ancestor directories into the expression of each file.
/// The terms of the root-most ancestor come first and duplicated terms are kept once.
/// Directory nodes keep their own expressions.
fn fold_partitions(forest: &PathForest, partitions: Vec<Expr>) -> Vec<Expr> {
    forest
        .nodes()
        .map(|node| {
            let own = &partitions[node.index()];
            if node.stats().is_directory() || node.parent().is_none() {
                return own.clone();
            }
            let mut chain = node
                .ancestors()
                .map(|a| &partitions[a.index()])
                .collect::<Vec<_>>();
            chain.reverse();
            chain.push(own);
            and_distinct(chain)
        })
        .collect()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use datafusion::arrow::datatypes::Schema;
    use datafusion_expr::{ident, lit};
    use object_store::memory::InMemory;

    use super::*;
    use crate::fragment::FileDataFragment;
    use crate::test_utils::TestFormat;

    fn store() -> Arc<dyn ObjectStore> {
        Arc::new(InMemory::new())
    }

    fn format() -> Arc<dyn FileFormat> {
        Arc::new(TestFormat::new())
    }

    fn options() -> Arc<ScanOptions> {
        Arc::new(ScanOptions::new(Arc::new(Schema::empty())))
    }

    fn eq(name: &str, value: i32) -> Expr {
        ident(name).eq(lit(value))
    }

    fn listing() -> Vec<FileStats> {
        vec![
            FileStats::directory("2009"),
            FileStats::directory("2009/11"),
            FileStats::file("2009/11/part-0", 10),
            FileStats::file("2009/11/part-1", 10),
            FileStats::directory("2010"),
            FileStats::file("2010/part-0", 10),
        ]
    }

    fn collect(source: &FileSystemDataSource) -> Vec<FileDataFragment> {
        source
            .get_fragments(options())
            .map(|f| {
                f.unwrap()
                    .as_any()
                    .downcast_ref::<FileDataFragment>()
                    .unwrap()
                    .clone()
            })
            .collect()
    }

    fn fragment_paths(fragments: &[FileDataFragment]) -> Vec<String> {
        fragments
            .iter()
            .map(|f| f.source().path().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_source_partition_only() {
        let source_partition = eq("dataset", 1);
        let source =
            FileSystemDataSource::make(store(), listing(), source_partition.clone(), format())
                .unwrap();
        assert_eq!(source.type_name(), "filesystem");
        assert_eq!(source.source_partition(), &source_partition);
        assert_eq!(source.partitions().len(), source.forest().len());
        assert!(source.partitions().iter().all(is_trivially_true));

        let fragments = collect(&source);
        assert_eq!(
            fragment_paths(&fragments),
            vec!["2009/11/part-0", "2009/11/part-1", "2010/part-0"]
        );
        for fragment in fragments.iter() {
            assert_eq!(fragment.partition_expression(), &source_partition);
            assert_eq!(fragment.format().type_name(), "test");
        }
    }

    #[test]
    fn test_source_partition_keeps_its_shape() {
        let nested = eq("a", 1).and(eq("b", 2).and(eq("c", 3)));
        let repeated = eq("a", 1).and(eq("a", 1));
        for source_partition in [nested, repeated] {
            let source = FileSystemDataSource::make(
                store(),
                vec![FileStats::file("x/part-0", 1)],
                source_partition.clone(),
                format(),
            )
            .unwrap();
            let fragments = collect(&source);
            assert_eq!(fragments.len(), 1);
            assert_eq!(fragments[0].partition_expression(), &source_partition);
        }

        let source = FileSystemDataSource::make_with_partitions(
            store(),
            vec![FileStats::directory("x"), FileStats::file("x/part-0", 1)],
            vec![eq("a", 1), eq("d", 4)],
            eq("a", 1).and(eq("a", 1)),
            format(),
        )
        .unwrap();
        assert_eq!(
            collect(&source)[0].partition_expression(),
            &eq("a", 1)
                .and(eq("a", 1))
                .and(eq("a", 1).and(eq("d", 4)))
        );
    }

    #[test]
    fn test_partitions_paired_with_stats() {
        let partitions = vec![
            eq("year", 2009),
            eq("month", 11),
            trivially_true(),
            eq("part", 1),
            eq("year", 2010),
        ];
        let source = FileSystemDataSource::make_with_partitions(
            store(),
            listing(),
            partitions,
            trivially_true(),
            format(),
        )
        .unwrap();

        // the last stat has no expression of its own
        assert_eq!(source.partitions().len(), 6);
        assert_eq!(source.partitions()[5], eq("year", 2010));

        let fragments = collect(&source);
        assert_eq!(
            fragments
                .iter()
                .map(|f| f.partition_expression().clone())
                .collect::<Vec<_>>(),
            vec![
                eq("year", 2009).and(eq("month", 11)),
                eq("year", 2009).and(eq("month", 11)).and(eq("part", 1)),
                eq("year", 2010),
            ]
        );
    }

    #[test]
    fn test_partitions_follow_sorted_stats() {
        let stats = vec![FileStats::file("b", 1), FileStats::file("a", 1)];
        let source = FileSystemDataSource::make_with_partitions(
            store(),
            stats,
            vec![eq("key", 2), eq("key", 1)],
            trivially_true(),
            format(),
        )
        .unwrap();
        let fragments = collect(&source);
        assert_eq!(fragment_paths(&fragments), vec!["a", "b"]);
        assert_eq!(fragments[0].partition_expression(), &eq("key", 1));
        assert_eq!(fragments[1].partition_expression(), &eq("key", 2));
    }

    #[test]
    fn test_folding_keeps_terms_once() {
        let forest = PathForest::make(listing()).unwrap();
        let partitions = vec![
            eq("year", 2009),
            eq("year", 2009).and(eq("month", 11)),
            eq("year", 2009).and(eq("month", 11)),
        ];
        let source = FileSystemDataSource::make_from_forest(
            store(),
            forest,
            partitions,
            eq("dataset", 1),
            format(),
        )
        .unwrap();
        // directories keep their own expressions
        assert_eq!(source.partitions()[0], eq("year", 2009));
        assert_eq!(source.partitions()[1], eq("year", 2009).and(eq("month", 11)));
        assert_eq!(source.partitions()[2], eq("year", 2009).and(eq("month", 11)));
        assert_eq!(source.partitions()[3], eq("year", 2009).and(eq("month", 11)));

        let fragments = collect(&source);
        assert_eq!(
            fragments[0].partition_expression(),
            &eq("dataset", 1).and(eq("year", 2009).and(eq("month", 11)))
        );
        assert_eq!(fragments[2].partition_expression(), &eq("dataset", 1));
    }

    #[test]
    fn test_too_many_partitions() {
        let result = FileSystemDataSource::make_with_partitions(
            store(),
            vec![FileStats::file("a", 1)],
            vec![eq("a", 1), eq("a", 2)],
            trivially_true(),
            format(),
        );
        assert!(matches!(result, Err(DatasetError::InvalidArgument(_))));
    }

    #[test]
    fn test_partial_iteration() {
        let source =
            FileSystemDataSource::make(store(), listing(), eq("dataset", 1), format()).unwrap();
        let before = source.to_string();
        let mut fragments = source.get_fragments(options());
        assert!(fragments.next().is_some());
        drop(fragments);
        assert_eq!(source.to_string(), before);

        let first = collect(&source);
        let second = collect(&source);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_iteration() {
        let source =
            FileSystemDataSource::make(store(), listing(), eq("dataset", 1), format()).unwrap();
        let expected = collect(&source);
        std::thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| scope.spawn(|| collect(&source)))
                .collect::<Vec<_>>();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_display() {
        let source = FileSystemDataSource::make_with_partitions(
            store(),
            vec![FileStats::directory("2009"), FileStats::file("2009/part-0", 1)],
            vec![eq("year", 2009)],
            trivially_true(),
            format(),
        )
        .unwrap();
        let text = source.to_string();
        assert!(text.starts_with("filesystem:\n  format: test\n"));
        assert!(text.contains("2009/: "));
        assert!(text.contains("    2009/part-0: "));
        assert_eq!(text, source.to_string());
    }
}
