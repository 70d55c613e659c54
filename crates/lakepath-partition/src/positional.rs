use std::sync::Arc;

use datafusion::arrow::datatypes::SchemaRef;
use datafusion_expr::Expr;

use crate::discovery::{PartitionSchemeDiscovery, SchemaPartitionSchemeDiscovery};
use crate::error::PartitionResult;
use crate::keys::{PartitionKey, PartitionKeysScheme};
use crate::scheme::PartitionScheme;

/// Parses one segment of a path for each field of its schema, in order.
///
/// Given the schema `<year: int32, month: int32>`, the path `2009/11` parses to
/// `year = 2009 AND month = 11`. Segments beyond the last field are ignored.
#[derive(Debug, Clone)]
pub struct SchemaPartitionScheme {
    schema: SchemaRef,
}

impl SchemaPartitionScheme {
    pub fn new(schema: SchemaRef) -> Self {
        Self { schema }
    }

    /// Creates a discovery that infers the types of the given fields from sample paths.
    pub fn make_discovery(field_names: Vec<String>) -> Arc<dyn PartitionSchemeDiscovery> {
        Arc::new(SchemaPartitionSchemeDiscovery::new(field_names))
    }
}

impl PartitionScheme for SchemaPartitionScheme {
    fn type_name(&self) -> &str {
        "schema"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn parse_segment(&self, segment: &str, index: usize) -> PartitionResult<Expr> {
        self.parse_key_segment(segment, index)
    }
}

impl PartitionKeysScheme for SchemaPartitionScheme {
    fn parse_key(&self, segment: &str, index: usize) -> Option<PartitionKey> {
        let field = self.schema.fields().get(index)?;
        Some(PartitionKey::new(field.name(), segment))
    }
}
