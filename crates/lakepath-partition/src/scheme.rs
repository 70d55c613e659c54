use std::fmt::Debug;
use std::sync::Arc;

use datafusion::arrow::datatypes::{Schema, SchemaRef};
use datafusion_expr::Expr;
use log::trace;

use crate::error::PartitionResult;
use crate::expression::{and_, is_trivially_true, trivially_true};
use crate::path::split_path;

/// A strategy for parsing partition expressions from the segments of a path.
///
/// For example, the segment `foo=5` might be parsed to an equality expression
/// between the field `foo` and the value `5`. Some schemes keep the field names
/// elsewhere (e.g. in a metadata store), so that `2009/11` could be parsed when
/// the partition fields are known to be `year` and `month`.
///
/// Implementations are immutable and can be shared between threads.
pub trait PartitionScheme: Debug + Send + Sync {
    /// The name identifying the kind of partition scheme.
    fn type_name(&self) -> &str;

    /// The schema of the partition fields.
    fn schema(&self) -> &SchemaRef;

    /// Parses one path segment, given its index within the path.
    ///
    /// A segment that carries no partition information yields
    /// the trivially-true expression.
    fn parse_segment(&self, segment: &str, index: usize) -> PartitionResult<Expr>;

    /// Parses a relative path into the conjunction of its segments' expressions.
    fn parse(&self, path: &str) -> PartitionResult<Expr> {
        let mut exprs = vec![];
        for (index, segment) in split_path(path).enumerate() {
            let expr = self.parse_segment(segment, index)?;
            if is_trivially_true(&expr) {
                continue;
            }
            exprs.push(expr);
        }
        trace!(
            "{} partition scheme parsed {} constraint(s) from '{path}'",
            self.type_name(),
            exprs.len()
        );
        Ok(and_(exprs))
    }
}

/// The scheme that never constrains anything.
#[derive(Debug, Clone)]
pub struct DefaultPartitionScheme {
    schema: SchemaRef,
}

impl DefaultPartitionScheme {
    pub fn new() -> Self {
        Self {
            schema: Arc::new(Schema::empty()),
        }
    }
}

impl Default for DefaultPartitionScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionScheme for DefaultPartitionScheme {
    fn type_name(&self) -> &str {
        "default"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn parse_segment(&self, _segment: &str, _index: usize) -> PartitionResult<Expr> {
        Ok(trivially_true())
    }
}

pub fn default_partition_scheme() -> Arc<dyn PartitionScheme> {
    Arc::new(DefaultPartitionScheme::new())
}
