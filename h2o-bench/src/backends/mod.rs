//! Engine adapters implementing [`crate::backend::Backend`]

pub mod datafusion_df;
pub mod datafusion_sql;
#[cfg(feature = "polars")]
pub mod polars_df;

use datafusion::prelude::{CsvReadOptions, SessionConfig, SessionContext};
use datafusion::arrow::datatypes::Schema;

use crate::backend::BackendOptions;

/// Session shared by both DataFusion backends.
///
/// The experimental group-by mode turns off hash repartitioning before the
/// final aggregation, so every group is merged in a single stage.
pub(crate) fn session_context(options: &BackendOptions) -> SessionContext {
    let config = SessionConfig::new().with_repartition_aggregations(!options.experimental_groupby);
    SessionContext::new_with_config(config)
}

/// CSV options typing every column from the declared schema
pub(crate) fn csv_options(schema: &Schema) -> CsvReadOptions<'_> {
    CsvReadOptions::new().has_header(true).schema(schema)
}
