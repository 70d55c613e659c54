use std::collections::HashMap;

use datafusion::arrow::datatypes::SchemaRef;
use datafusion_expr::Expr;

use crate::error::PartitionResult;
use crate::expression::trivially_true;
use crate::scheme::PartitionScheme;

/// Expressions keyed by the exact segment text.
pub type SegmentDictionary = HashMap<String, Expr>;

/// Looks up partition expressions that were resolved ahead of time,
/// for example by a metadata catalog, with one dictionary per segment index.
#[derive(Debug, Clone)]
pub struct SegmentDictionaryPartitionScheme {
    schema: SchemaRef,
    dictionaries: Vec<SegmentDictionary>,
}

impl SegmentDictionaryPartitionScheme {
    pub fn new(schema: SchemaRef, dictionaries: Vec<SegmentDictionary>) -> Self {
        Self {
            schema,
            dictionaries,
        }
    }

    pub fn dictionaries(&self) -> &[SegmentDictionary] {
        &self.dictionaries
    }
}

impl PartitionScheme for SegmentDictionaryPartitionScheme {
    fn type_name(&self) -> &str {
        "segment_dictionary"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn parse_segment(&self, segment: &str, index: usize) -> PartitionResult<Expr> {
        Ok(self
            .dictionaries
            .get(index)
            .and_then(|dictionary| dictionary.get(segment))
            .cloned()
            .unwrap_or_else(trivially_true))
    }
}
