//! Polars backend.
//!
//! Tables are read eagerly; every query is a lazy plan over the loaded
//! frames and runs on collect. Polars work is CPU bound and uses its own
//! thread pool, so it is moved off the async runtime with
//! `spawn_blocking`.

use async_trait::async_trait;
use h2o_dataset::{DatasetPaths, LogicalType, TableSchema};
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::backend::{
    Backend, BackendOptions, GroupbyQuery, JoinQuery, JoinTables, QueryCatalog, QueryName,
};
use crate::error::{Error, Result};

/// Convert a logical column type to the Polars type used for CSV ingestion
pub fn logical_to_polars_type(logical_type: &LogicalType) -> DataType {
    match logical_type {
        LogicalType::Categorical => DataType::Categorical(None, Default::default()),
        LogicalType::Int32 => DataType::Int32,
        LogicalType::Float64 => DataType::Float64,
    }
}

pub fn create_polars_schema(table: &TableSchema) -> Schema {
    let mut schema = Schema::with_capacity(table.len());
    for (name, logical_type) in table.columns() {
        schema.with_column(name.into(), logical_to_polars_type(&logical_type));
    }
    schema
}

pub struct PolarsBackend {
    groupby: QueryCatalog<GroupbyQuery<Self>>,
    join: QueryCatalog<JoinQuery<Self>>,
    // Categorical join keys only compare equal under one global string cache
    _string_cache: StringCacheHolder,
}

impl PolarsBackend {
    pub fn new(options: BackendOptions) -> Result<Self> {
        if options.experimental_groupby {
            debug!("polars has no experimental group-by mode, ignoring flag");
        }

        let groupby: [(QueryName, GroupbyQuery<Self>); 10] = [
            ("q01", groupby_q1),
            ("q02", groupby_q2),
            ("q03", groupby_q3),
            ("q04", groupby_q4),
            ("q05", groupby_q5),
            ("q06", groupby_q6),
            ("q07", groupby_q7),
            ("q08", groupby_q8),
            ("q09", groupby_q9),
            ("q10", groupby_q10),
        ];
        let join: [(QueryName, JoinQuery<Self>); 5] = [
            ("q01", join_q1),
            ("q02", join_q2),
            ("q03", join_q3),
            ("q04", join_q4),
            ("q05", join_q5),
        ];

        Ok(Self {
            groupby: QueryCatalog::new(groupby)?,
            join: QueryCatalog::new(join)?,
            _string_cache: StringCacheHolder::hold(),
        })
    }

    async fn read_table(&self, path: &std::path::Path, table: &TableSchema) -> Result<DataFrame> {
        let schema = create_polars_schema(table);
        let path = path.to_path_buf();

        debug!(table = table.name, path = %path.display(), "reading csv");
        blocking(move || read_csv(path, schema)).await
    }
}

fn read_csv(path: PathBuf, schema: Schema) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_schema(Some(Arc::new(schema)))
        .try_into_reader_with_file_path(Some(path))?
        .finish()
}

/// Run a Polars computation on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> PolarsResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("polars task failed: {}", e)))?
        .map_err(Error::from)
}

#[async_trait]
impl Backend for PolarsBackend {
    type Frame = DataFrame;
    type Output = LazyFrame;
    type Materialized = DataFrame;

    fn name(&self) -> &'static str {
        "polars"
    }

    async fn load_groupby_data(&self, paths: &DatasetPaths) -> Result<DataFrame> {
        self.read_table(&paths.groupby, &TableSchema::groupby()).await
    }

    async fn load_join_data(&self, paths: &DatasetPaths) -> Result<JoinTables<DataFrame>> {
        Ok(JoinTables {
            df: self.read_table(&paths.join_df, &TableSchema::join_driver()).await?,
            small: self.read_table(&paths.join_small, &TableSchema::join_small()).await?,
            medium: self.read_table(&paths.join_medium, &TableSchema::join_medium()).await?,
            big: self.read_table(&paths.join_big, &TableSchema::join_big()).await?,
        })
    }

    /// The CSV reader is eager; only the chunks are merged here
    async fn trigger_loading(&self, frame: DataFrame) -> Result<DataFrame> {
        blocking(move || {
            let mut frame = frame;
            frame.as_single_chunk_par();
            Ok(frame)
        })
        .await
    }

    async fn trigger_execution(&self, output: LazyFrame) -> Result<DataFrame> {
        blocking(move || output.collect()).await
    }

    fn row_count(materialized: &DataFrame) -> usize {
        materialized.height()
    }

    fn groupby_queries(&self) -> &QueryCatalog<GroupbyQuery<Self>> {
        &self.groupby
    }

    fn join_queries(&self) -> &QueryCatalog<JoinQuery<Self>> {
        &self.join
    }
}

fn groupby_q1(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone().lazy().group_by([col("id1")]).agg([col("v1").sum()]))
}

fn groupby_q2(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .group_by([col("id1"), col("id2")])
        .agg([col("v1").sum()]))
}

fn groupby_q3(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .group_by([col("id3")])
        .agg([col("v1").sum(), col("v3").mean()]))
}

fn groupby_q4(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .group_by([col("id4")])
        .agg([col("v1").mean(), col("v2").mean(), col("v3").mean()]))
}

fn groupby_q5(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .group_by([col("id6")])
        .agg([col("v1").sum(), col("v2").sum(), col("v3").sum()]))
}

fn groupby_q6(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone().lazy().group_by([col("id4"), col("id5")]).agg([
        col("v3").median().alias("median_v3"),
        col("v3").std(1).alias("sd_v3"),
    ]))
}

fn groupby_q7(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .group_by([col("id3")])
        .agg([(col("v1").max() - col("v2").min()).alias("range_v1_v2")]))
}

/// Two largest `v3` per `id6`
fn groupby_q8(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .filter(col("v3").is_not_null())
        .sort(
            ["v3"],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .group_by([col("id6")])
        .head(Some(2))
        .select([col("id6"), col("v3")]))
}

fn groupby_q9(x: &DataFrame) -> Result<LazyFrame> {
    let r = pearson_corr(col("v1"), col("v2"));
    Ok(x.clone()
        .lazy()
        .group_by([col("id2"), col("id4")])
        .agg([(r.clone() * r).alias("r2")]))
}

fn groupby_q10(x: &DataFrame) -> Result<LazyFrame> {
    Ok(x.clone()
        .lazy()
        .group_by([
            col("id1"),
            col("id2"),
            col("id3"),
            col("id4"),
            col("id5"),
            col("id6"),
        ])
        .agg([col("v3").sum(), col("v1").count().alias("count")]))
}

fn join_q1(data: &JoinTables<DataFrame>) -> Result<LazyFrame> {
    Ok(data
        .df
        .clone()
        .lazy()
        .inner_join(data.small.clone().lazy(), col("id1"), col("id1")))
}

fn join_q2(data: &JoinTables<DataFrame>) -> Result<LazyFrame> {
    Ok(data
        .df
        .clone()
        .lazy()
        .inner_join(data.medium.clone().lazy(), col("id2"), col("id2")))
}

fn join_q3(data: &JoinTables<DataFrame>) -> Result<LazyFrame> {
    Ok(data
        .df
        .clone()
        .lazy()
        .left_join(data.medium.clone().lazy(), col("id2"), col("id2")))
}

fn join_q4(data: &JoinTables<DataFrame>) -> Result<LazyFrame> {
    Ok(data
        .df
        .clone()
        .lazy()
        .inner_join(data.medium.clone().lazy(), col("id5"), col("id5")))
}

fn join_q5(data: &JoinTables<DataFrame>) -> Result<LazyFrame> {
    Ok(data
        .df
        .clone()
        .lazy()
        .inner_join(data.big.clone().lazy(), col("id3"), col("id3")))
}
