//! Partition schemes map the segments of a relative file path to partition
//! expressions, i.e. conjunctions of `field = value` predicates that hold for
//! every row stored below that path.
//!
//! Paths are consumed from left to right and must be relative to the root of
//! the partitioned dataset.

mod discovery;
mod error;
pub mod expression;
mod function;
mod hive;
mod keys;
pub mod path;
mod positional;
pub mod scalar;
mod scheme;
mod segment_dictionary;

pub use discovery::{
    HivePartitionSchemeDiscovery, PartitionSchemeDiscovery, PartitionSchemeOrDiscovery,
    SchemaPartitionSchemeDiscovery,
};
pub use error::{PartitionError, PartitionResult};
pub use function::{FunctionPartitionScheme, SegmentParser};
pub use hive::HivePartitionScheme;
pub use keys::{convert_key, PartitionKey, PartitionKeysScheme};
pub use positional::SchemaPartitionScheme;
pub use scheme::{default_partition_scheme, DefaultPartitionScheme, PartitionScheme};
pub use segment_dictionary::{SegmentDictionary, SegmentDictionaryPartitionScheme};
