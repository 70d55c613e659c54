use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use datafusion::arrow::datatypes::SchemaRef;
use datafusion_expr::Expr;

use crate::error::PartitionResult;
use crate::scheme::PartitionScheme;

pub type SegmentParser = Arc<dyn Fn(&str, usize) -> PartitionResult<Expr> + Send + Sync>;

/// A partition scheme whose segment parsing is provided by a closure.
#[derive(Clone)]
pub struct FunctionPartitionScheme {
    schema: SchemaRef,
    parser: SegmentParser,
    name: String,
}

impl FunctionPartitionScheme {
    pub fn new<F>(schema: SchemaRef, parser: F) -> Self
    where
        F: Fn(&str, usize) -> PartitionResult<Expr> + Send + Sync + 'static,
    {
        Self {
            schema,
            parser: Arc::new(parser),
            name: "function".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Debug for FunctionPartitionScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionPartitionScheme")
            .field("schema", &self.schema)
            .field("name", &self.name)
            .finish()
    }
}

impl PartitionScheme for FunctionPartitionScheme {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn parse_segment(&self, segment: &str, index: usize) -> PartitionResult<Expr> {
        (self.parser)(segment, index)
    }
}
