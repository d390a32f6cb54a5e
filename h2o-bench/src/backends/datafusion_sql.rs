//! DataFusion backend driven by SQL text.
//!
//! Loaded tables are registered in the session under fixed names and
//! replaced by in-memory copies when loading is triggered. A query only
//! produces a [`SqlStatement`]; planning and execution both happen in
//! `trigger_execution`.

use async_trait::async_trait;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::SessionContext;
use h2o_dataset::{DatasetPaths, TableSchema};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::backend::{
    Backend, BackendOptions, GroupbyQuery, JoinQuery, JoinTables, QueryCatalog, QueryName,
};
use crate::backends::{csv_options, session_context};
use crate::error::{Error, Result};
use crate::schema::create_arrow_schema;

const GROUPBY_TABLE: &str = "x";

/// A table registered in the backend's session
#[derive(Clone)]
pub struct SqlTable {
    ctx: SessionContext,
    name: &'static str,
}

impl SqlTable {
    fn statement(&self, sql: &'static str) -> Result<SqlStatement> {
        Ok(SqlStatement {
            ctx: self.ctx.clone(),
            sql,
        })
    }
}

impl fmt::Debug for SqlTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlTable").field("name", &self.name).finish()
    }
}

/// SQL text bound to the session it runs in
pub struct SqlStatement {
    ctx: SessionContext,
    sql: &'static str,
}

impl SqlStatement {
    pub fn sql(&self) -> &str {
        self.sql
    }
}

pub struct DataFusionSqlBackend {
    ctx: SessionContext,
    groupby: QueryCatalog<GroupbyQuery<Self>>,
    join: QueryCatalog<JoinQuery<Self>>,
}

impl DataFusionSqlBackend {
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

    async fn register(&self, name: &'static str, path: &Path, table: &TableSchema) -> Result<SqlTable> {
        let schema = create_arrow_schema(table);
        let path = path
            .to_str()
            .ok_or_else(|| Error::Config(format!("non UTF-8 path: {}", path.display())))?;

        debug!(table = name, path, "registering csv");
        // A second run on the same backend replaces the previous registration
        self.ctx.deregister_table(name)?;
        self.ctx.register_csv(name, path, csv_options(&schema)).await?;

        Ok(SqlTable {
            ctx: self.ctx.clone(),
            name,
        })
    }
}

#[async_trait]
impl Backend for DataFusionSqlBackend {
    type Frame = SqlTable;
    type Output = SqlStatement;
    type Materialized = Vec<RecordBatch>;

    fn name(&self) -> &'static str {
        "datafusion-sql"
    }

    async fn load_groupby_data(&self, paths: &DatasetPaths) -> Result<SqlTable> {
        self.register(GROUPBY_TABLE, &paths.groupby, &TableSchema::groupby())
            .await
    }

    async fn load_join_data(&self, paths: &DatasetPaths) -> Result<JoinTables<SqlTable>> {
        Ok(JoinTables {
            df: self
                .register("df", &paths.join_df, &TableSchema::join_driver())
                .await?,
            small: self
                .register("small", &paths.join_small, &TableSchema::join_small())
                .await?,
            medium: self
                .register("medium", &paths.join_medium, &TableSchema::join_medium())
                .await?,
            big: self
                .register("big", &paths.join_big, &TableSchema::join_big())
                .await?,
        })
    }

    /// Swap the CSV registration for an in-memory copy of the table
    async fn trigger_loading(&self, frame: SqlTable) -> Result<SqlTable> {
        let cached = frame.ctx.table(frame.name).await?.cache().await?;
        frame.ctx.deregister_table(frame.name)?;
        frame.ctx.register_table(frame.name, cached.into_view())?;
        Ok(frame)
    }

    async fn trigger_execution(&self, output: SqlStatement) -> Result<Vec<RecordBatch>> {
        debug!(sql = output.sql(), "executing statement");
        let df = output.ctx.sql(output.sql).await?;
        Ok(df.collect().await?)
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

fn groupby_q1(x: &SqlTable) -> Result<SqlStatement> {
    x.statement("SELECT id1, SUM(v1) AS v1 FROM x GROUP BY id1")
}

fn groupby_q2(x: &SqlTable) -> Result<SqlStatement> {
    x.statement("SELECT id1, id2, SUM(v1) AS v1 FROM x GROUP BY id1, id2")
}

fn groupby_q3(x: &SqlTable) -> Result<SqlStatement> {
    x.statement("SELECT id3, SUM(v1) AS v1, AVG(v3) AS v3 FROM x GROUP BY id3")
}

fn groupby_q4(x: &SqlTable) -> Result<SqlStatement> {
    x.statement("SELECT id4, AVG(v1) AS v1, AVG(v2) AS v2, AVG(v3) AS v3 FROM x GROUP BY id4")
}

fn groupby_q5(x: &SqlTable) -> Result<SqlStatement> {
    x.statement("SELECT id6, SUM(v1) AS v1, SUM(v2) AS v2, SUM(v3) AS v3 FROM x GROUP BY id6")
}

fn groupby_q6(x: &SqlTable) -> Result<SqlStatement> {
    x.statement(
        "SELECT id4, id5, MEDIAN(v3) AS median_v3, STDDEV(v3) AS sd_v3 \
         FROM x GROUP BY id4, id5",
    )
}

fn groupby_q7(x: &SqlTable) -> Result<SqlStatement> {
    x.statement("SELECT id3, MAX(v1) - MIN(v2) AS range_v1_v2 FROM x GROUP BY id3")
}

fn groupby_q8(x: &SqlTable) -> Result<SqlStatement> {
    x.statement(
        "SELECT id6, v3 FROM (\
           SELECT id6, v3, ROW_NUMBER() OVER (PARTITION BY id6 ORDER BY v3 DESC) AS row_no \
           FROM x WHERE v3 IS NOT NULL\
         ) AS ranked WHERE row_no <= 2",
    )
}

fn groupby_q9(x: &SqlTable) -> Result<SqlStatement> {
    x.statement(
        "SELECT id2, id4, POWER(CORR(CAST(v1 AS DOUBLE), CAST(v2 AS DOUBLE)), 2) AS r2 \
         FROM x GROUP BY id2, id4",
    )
}

fn groupby_q10(x: &SqlTable) -> Result<SqlStatement> {
    x.statement(
        "SELECT id1, id2, id3, id4, id5, id6, SUM(v3) AS v3, COUNT(v1) AS count \
         FROM x GROUP BY id1, id2, id3, id4, id5, id6",
    )
}

fn join_q1(data: &JoinTables<SqlTable>) -> Result<SqlStatement> {
    data.df.statement("SELECT * FROM df JOIN small USING (id1)")
}

fn join_q2(data: &JoinTables<SqlTable>) -> Result<SqlStatement> {
    data.df.statement("SELECT * FROM df JOIN medium USING (id2)")
}

fn join_q3(data: &JoinTables<SqlTable>) -> Result<SqlStatement> {
    data.df.statement("SELECT * FROM df LEFT JOIN medium USING (id2)")
}

fn join_q4(data: &JoinTables<SqlTable>) -> Result<SqlStatement> {
    data.df.statement("SELECT * FROM df JOIN medium USING (id5)")
}

fn join_q5(data: &JoinTables<SqlTable>) -> Result<SqlStatement> {
    data.df.statement("SELECT * FROM df JOIN big USING (id3)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogues_match_default_backend() {
        let sql = DataFusionSqlBackend::new(BackendOptions::default()).unwrap();
        let df = crate::backends::datafusion_df::DataFusionBackend::new(BackendOptions::default()).unwrap();

        assert_eq!(sql.groupby_queries().names(), df.groupby_queries().names());
        assert_eq!(sql.join_queries().names(), df.join_queries().names());
    }

    #[test]
    fn test_statements_reference_registered_tables() {
        let backend = DataFusionSqlBackend::new(BackendOptions::default()).unwrap();
        let table = SqlTable {
            ctx: backend.ctx.clone(),
            name: GROUPBY_TABLE,
        };

        for q in backend.groupby_queries() {
            let statement = (q.query)(&table).unwrap();
            assert!(statement.sql().contains("FROM x"), "{}: {}", q.name, statement.sql());
        }
    }
}
