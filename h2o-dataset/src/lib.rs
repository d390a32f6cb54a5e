//! Dataset naming and schema declarations for the H2O db-benchmark suite.

pub mod error;
pub mod locator;
pub mod schema;
pub mod size;

pub use error::{Error, Result};
pub use locator::{resolve, resolve_str, DatasetPaths};
pub use schema::{LogicalType, TableSchema};
pub use size::SizeTag;
