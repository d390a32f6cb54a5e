//! DataFusion backend built on the DataFrame API.
//!
//! Queries only build logical plans; nothing runs until
//! `trigger_execution` collects the result.

use async_trait::async_trait;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::functions_aggregate::expr_fn::{avg, corr, count, max, median, min, stddev, sum};
use datafusion::functions_window::expr_fn::row_number;
use datafusion::logical_expr::{cast, ExprFunctionExt, JoinType, LogicalPlanBuilder};
use datafusion::prelude::{col, lit, DataFrame, SessionContext};
use h2o_dataset::{DatasetPaths, TableSchema};
use std::path::Path;
use tracing::debug;

use crate::backend::{
    Backend, BackendOptions, GroupbyQuery, JoinQuery, JoinTables, QueryCatalog, QueryName,
};
use crate::backends::{csv_options, session_context};
use crate::error::{Error, Result};
use crate::schema::create_arrow_schema;

pub struct DataFusionBackend {
    ctx: SessionContext,
    groupby: QueryCatalog<GroupbyQuery<Self>>,
    join: QueryCatalog<JoinQuery<Self>>,
}

impl DataFusionBackend {
    pub fn new(options: BackendOptions) -> Result<Self> {
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
            ctx: session_context(&options),
            groupby: QueryCatalog::new(groupby)?,
            join: QueryCatalog::new(join)?,
        })
    }

    async fn read_table(&self, path: &Path, table: &TableSchema) -> Result<DataFrame> {
        let schema = create_arrow_schema(table);
        let path = path
            .to_str()
            .ok_or_else(|| Error::Config(format!("non UTF-8 path: {}", path.display())))?;

        debug!(table = table.name, path, columns = ?table.column_names(), "reading csv");
        Ok(self.ctx.read_csv(path, csv_options(&schema)).await?)
    }
}

#[async_trait]
impl Backend for DataFusionBackend {
    type Frame = DataFrame;
    type Output = DataFrame;
    type Materialized = Vec<RecordBatch>;

    fn name(&self) -> &'static str {
        "datafusion"
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

    /// Scan the CSV into an in-memory table
    async fn trigger_loading(&self, frame: DataFrame) -> Result<DataFrame> {
        Ok(frame.cache().await?)
    }

    async fn trigger_execution(&self, output: DataFrame) -> Result<Vec<RecordBatch>> {
        Ok(output.collect().await?)
    }

    fn row_count(materialized: &Vec<RecordBatch>) -> usize {
        materialized.iter().map(|b| b.num_rows()).sum()
    }

    fn groupby_queries(&self) -> &QueryCatalog<GroupbyQuery<Self>> {
        &self.groupby
    }

    fn join_queries(&self) -> &QueryCatalog<JoinQuery<Self>> {
        &self.join
    }
}

fn groupby_q1(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone()
        .aggregate(vec![col("id1")], vec![sum(col("v1")).alias("v1")])?)
}

fn groupby_q2(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone()
        .aggregate(vec![col("id1"), col("id2")], vec![sum(col("v1")).alias("v1")])?)
}

fn groupby_q3(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone().aggregate(
        vec![col("id3")],
        vec![sum(col("v1")).alias("v1"), avg(col("v3")).alias("v3")],
    )?)
}

fn groupby_q4(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone().aggregate(
        vec![col("id4")],
        vec![
            avg(col("v1")).alias("v1"),
            avg(col("v2")).alias("v2"),
            avg(col("v3")).alias("v3"),
        ],
    )?)
}

fn groupby_q5(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone().aggregate(
        vec![col("id6")],
        vec![
            sum(col("v1")).alias("v1"),
            sum(col("v2")).alias("v2"),
            sum(col("v3")).alias("v3"),
        ],
    )?)
}

fn groupby_q6(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone().aggregate(
        vec![col("id4"), col("id5")],
        vec![
            median(col("v3")).alias("median_v3"),
            stddev(col("v3")).alias("sd_v3"),
        ],
    )?)
}

fn groupby_q7(x: &DataFrame) -> Result<DataFrame> {
    Ok(x.clone()
        .aggregate(
            vec![col("id3")],
            vec![max(col("v1")).alias("max_v1"), min(col("v2")).alias("min_v2")],
        )?
        .select(vec![
            col("id3"),
            (col("max_v1") - col("min_v2")).alias("range_v1_v2"),
        ])?)
}

/// Two largest `v3` per `id6`
fn groupby_q8(x: &DataFrame) -> Result<DataFrame> {
    let row_no = row_number()
        .partition_by(vec![col("id6")])
        .order_by(vec![col("v3").sort(false, false)])
        .build()?
        .alias("row_no");

    Ok(x.clone()
        .filter(col("v3").is_not_null())?
        .select(vec![col("id6"), col("v3"), row_no])?
        .filter(col("row_no").lt_eq(lit(2u64)))?
        .select_columns(&["id6", "v3"])?)
}

fn groupby_q9(x: &DataFrame) -> Result<DataFrame> {
    let r = corr(
        cast(col("v1"), DataType::Float64),
        cast(col("v2"), DataType::Float64),
    );

    Ok(x.clone()
        .aggregate(vec![col("id2"), col("id4")], vec![r.alias("r")])?
        .select(vec![
            col("id2"),
            col("id4"),
            (col("r") * col("r")).alias("r2"),
        ])?)
}

fn groupby_q10(x: &DataFrame) -> Result<DataFrame> {
    let keys = ["id1", "id2", "id3", "id4", "id5", "id6"]
        .into_iter()
        .map(col)
        .collect();

    Ok(x.clone().aggregate(
        keys,
        vec![sum(col("v3")).alias("v3"), count(col("v1")).alias("count")],
    )?)
}

/// Put `df` under the table qualifier `name`
fn qualified(df: &DataFrame, name: &str) -> Result<DataFrame> {
    let (state, plan) = df.clone().into_parts();
    let plan = LogicalPlanBuilder::from(plan).alias(name)?.build()?;
    Ok(DataFrame::new(state, plan))
}

/// Equi-join of the driver table with one counterpart.
///
/// Both sides come from anonymous scans, so they are aliased first to keep
/// shared column names apart.
fn join_with(left: &DataFrame, right: &DataFrame, right_name: &str, key: &str, how: JoinType) -> Result<DataFrame> {
    let left = qualified(left, "x")?;
    let right = qualified(right, right_name)?;
    Ok(left.join(right, how, &[key], &[key], None)?)
}

fn join_q1(data: &JoinTables<DataFrame>) -> Result<DataFrame> {
    join_with(&data.df, &data.small, "small", "id1", JoinType::Inner)
}

fn join_q2(data: &JoinTables<DataFrame>) -> Result<DataFrame> {
    join_with(&data.df, &data.medium, "medium", "id2", JoinType::Inner)
}

fn join_q3(data: &JoinTables<DataFrame>) -> Result<DataFrame> {
    join_with(&data.df, &data.medium, "medium", "id2", JoinType::Left)
}

fn join_q4(data: &JoinTables<DataFrame>) -> Result<DataFrame> {
    join_with(&data.df, &data.medium, "medium", "id5", JoinType::Inner)
}

fn join_q5(data: &JoinTables<DataFrame>) -> Result<DataFrame> {
    join_with(&data.df, &data.big, "big", "id3", JoinType::Inner)
}
