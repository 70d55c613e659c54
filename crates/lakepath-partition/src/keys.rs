use datafusion::arrow::datatypes::Schema;
use datafusion_expr::Expr;

use crate::error::PartitionResult;
use crate::expression::{equal, field_ref, scalar, trivially_true};
use crate::scalar::parse_scalar;
use crate::scheme::PartitionScheme;

/// A field name and the unconverted representation of its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub name: String,
    pub value: String,
}

impl PartitionKey {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Converts a key to an equality expression using the field type declared in `schema`.
/// Keys naming a field absent from `schema` are ignored.
pub fn convert_key(key: &PartitionKey, schema: &Schema) -> PartitionResult<Expr> {
    let Some((_, field)) = schema.column_with_name(&key.name) else {
        return Ok(trivially_true());
    };
    let value = parse_scalar(field.data_type(), &key.value)?;
    Ok(equal(field_ref(field.name()), scalar(value)))
}

/// A partition scheme that extracts at most one key from each segment.
pub trait PartitionKeysScheme: PartitionScheme {
    fn parse_key(&self, segment: &str, index: usize) -> Option<PartitionKey>;

    /// Extracts and converts the key of a segment.
    /// Segments without a key yield the trivially-true expression.
    fn parse_key_segment(&self, segment: &str, index: usize) -> PartitionResult<Expr> {
        match self.parse_key(segment, index) {
            Some(key) => convert_key(&key, self.schema()),
            None => Ok(trivially_true()),
        }
    }
}
