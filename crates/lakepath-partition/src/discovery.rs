use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use datafusion::arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use log::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::hive::HivePartitionScheme;
use crate::path::split_path;
use crate::positional::SchemaPartitionScheme;
use crate::scheme::PartitionScheme;

/// Creates a partition scheme when its schema must be inferred from sample paths.
///
/// Discovery happens in two phases: [`Self::inspect`] infers a schema from the
/// paths, and [`Self::finish`] builds the scheme for a schema, which may be the
/// inferred one or a schema merged with user declarations.
pub trait PartitionSchemeDiscovery: Debug + Send + Sync {
    /// Infers the schema of the partition fields from relative paths.
    fn inspect(&self, paths: &[&str]) -> PartitionResult<SchemaRef>;

    /// Creates a partition scheme using the provided schema.
    /// Fields of the schema may be dropped or reordered.
    fn finish(&self, schema: &SchemaRef) -> PartitionResult<Arc<dyn PartitionScheme>>;
}

/// Whether every value is a non-empty string of ASCII digits.
/// The range of the values is not checked.
fn all_integral(values: &[String]) -> bool {
    values
        .iter()
        .all(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
}

fn infer_field(name: &str, values: &[String]) -> Field {
    let data_type = if all_integral(values) {
        DataType::Int32
    } else {
        DataType::Utf8
    };
    Field::new(name, data_type, true)
}

/// Discovery for [`SchemaPartitionScheme`] with a fixed list of field names.
#[derive(Debug, Clone)]
pub struct SchemaPartitionSchemeDiscovery {
    field_names: Vec<String>,
}

impl SchemaPartitionSchemeDiscovery {
    pub fn new(field_names: Vec<String>) -> Self {
        Self { field_names }
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }
}

impl PartitionSchemeDiscovery for SchemaPartitionSchemeDiscovery {
    fn inspect(&self, paths: &[&str]) -> PartitionResult<SchemaRef> {
        let mut name_to_values: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for path in paths {
            for (name, segment) in self.field_names.iter().zip(split_path(path)) {
                name_to_values
                    .entry(name.as_str())
                    .or_default()
                    .push(segment.to_string());
            }
        }
        // A field that no path reaches stays out of the schema.
        let fields = self
            .field_names
            .iter()
            .filter_map(|name| {
                name_to_values
                    .get(name.as_str())
                    .map(|values| infer_field(name, values))
            })
            .collect::<Vec<_>>();
        debug!(
            "inferred positional partition schema from {} path(s): {fields:?}",
            paths.len()
        );
        Ok(Arc::new(Schema::new(fields)))
    }

    fn finish(&self, schema: &SchemaRef) -> PartitionResult<Arc<dyn PartitionScheme>> {
        let fields = self
            .field_names
            .iter()
            .map(|name| match schema.column_with_name(name) {
                Some((index, _)) => Ok(schema.fields()[index].clone()),
                None => {
                    let available = schema
                        .fields()
                        .iter()
                        .map(|f| f.name().as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    Err(PartitionError::type_error(format!(
                        "no field named '{name}' in schema [{available}]"
                    )))
                }
            })
            .collect::<PartitionResult<Vec<FieldRef>>>()?;
        let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
        Ok(Arc::new(SchemaPartitionScheme::new(Arc::new(schema))))
    }
}

/// Discovery for [`HivePartitionScheme`].
/// Inferred fields are ordered by name.
#[derive(Debug, Clone, Default)]
pub struct HivePartitionSchemeDiscovery;

impl PartitionSchemeDiscovery for HivePartitionSchemeDiscovery {
    fn inspect(&self, paths: &[&str]) -> PartitionResult<SchemaRef> {
        let mut name_to_values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for path in paths {
            for segment in split_path(path) {
                if let Some(key) = HivePartitionScheme::parse_hive_key(segment) {
                    name_to_values.entry(key.name).or_default().push(key.value);
                }
            }
        }
        let fields = name_to_values
            .iter()
            .map(|(name, values)| infer_field(name, values))
            .collect::<Vec<_>>();
        debug!(
            "inferred Hive partition schema from {} path(s): {fields:?}",
            paths.len()
        );
        Ok(Arc::new(Schema::new(fields)))
    }

    fn finish(&self, schema: &SchemaRef) -> PartitionResult<Arc<dyn PartitionScheme>> {
        Ok(Arc::new(HivePartitionScheme::new(schema.clone())))
    }
}

/// Either a ready partition scheme or a discovery that will produce one.
#[derive(Debug, Clone)]
pub enum PartitionSchemeOrDiscovery {
    Scheme(Arc<dyn PartitionScheme>),
    Discovery(Arc<dyn PartitionSchemeDiscovery>),
}

impl PartitionSchemeOrDiscovery {
    pub fn scheme(&self) -> Option<&Arc<dyn PartitionScheme>> {
        match self {
            Self::Scheme(scheme) => Some(scheme),
            Self::Discovery(_) => None,
        }
    }

    pub fn discovery(&self) -> Option<&Arc<dyn PartitionSchemeDiscovery>> {
        match self {
            Self::Scheme(_) => None,
            Self::Discovery(discovery) => Some(discovery),
        }
    }
}

impl Default for PartitionSchemeOrDiscovery {
    fn default() -> Self {
        Self::Scheme(crate::scheme::default_partition_scheme())
    }
}

impl From<Arc<dyn PartitionScheme>> for PartitionSchemeOrDiscovery {
    fn from(scheme: Arc<dyn PartitionScheme>) -> Self {
        Self::Scheme(scheme)
    }
}

impl From<Arc<dyn PartitionSchemeDiscovery>> for PartitionSchemeOrDiscovery {
    fn from(discovery: Arc<dyn PartitionSchemeDiscovery>) -> Self {
        Self::Discovery(discovery)
    }
}
