use std::sync::Arc;

use datafusion::arrow::datatypes::SchemaRef;
use datafusion_expr::Expr;

use crate::discovery::{HivePartitionSchemeDiscovery, PartitionSchemeDiscovery};
use crate::error::PartitionResult;
use crate::keys::{PartitionKey, PartitionKeysScheme};
use crate::scheme::PartitionScheme;

/// The multi-level directory partitioning originating from Apache Hive,
/// where each directory name has the form `key=value`.
///
/// Field order is irrelevant, and segments without `=` or with unknown keys
/// are ignored. Given the schema `<year: int32, day: int32>`, the path
/// `day=321/ignored=3.4/year=2009` parses to `day = 321 AND year = 2009`.
#[derive(Debug, Clone)]
pub struct HivePartitionScheme {
    schema: SchemaRef,
}

impl HivePartitionScheme {
    pub fn new(schema: SchemaRef) -> Self {
        Self { schema }
    }

    /// Splits a segment on its first `=`.
    pub fn parse_hive_key(segment: &str) -> Option<PartitionKey> {
        let (name, value) = segment.split_once('=')?;
        Some(PartitionKey::new(name, value))
    }

    pub fn make_discovery() -> Arc<dyn PartitionSchemeDiscovery> {
        Arc::new(HivePartitionSchemeDiscovery)
    }
}

impl PartitionScheme for HivePartitionScheme {
    fn type_name(&self) -> &str {
        "hive"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn parse_segment(&self, segment: &str, index: usize) -> PartitionResult<Expr> {
        self.parse_key_segment(segment, index)
    }
}

impl PartitionKeysScheme for HivePartitionScheme {
    fn parse_key(&self, segment: &str, _index: usize) -> Option<PartitionKey> {
        Self::parse_hive_key(segment)
    }
}
