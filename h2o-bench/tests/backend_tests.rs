mod common;

use common::{write_fixture, GROUPBY_ROWS, JOIN_ROWS};
use datafusion::arrow::array::{Array, Float64Array};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::record_batch::RecordBatch;
use h2o_bench::backends::datafusion_df::DataFusionBackend;
use h2o_bench::backends::datafusion_sql::DataFusionSqlBackend;
use h2o_bench::{Backend, BackendOptions, JoinTables, RunConfig};
use h2o_dataset::DatasetPaths;

/// Numeric access to a materialized result
trait ResultColumns {
    fn f64_values(&self, column: &str) -> Vec<Option<f64>>;
}

impl ResultColumns for Vec<RecordBatch> {
    fn f64_values(&self, column: &str) -> Vec<Option<f64>> {
        self.iter()
            .flat_map(|batch| {
                let array = batch
                    .column_by_name(column)
                    .unwrap_or_else(|| panic!("Missing column {}", column));
                let array = cast(array, &DataType::Float64).expect("Failed to cast column");
                let values = array
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .expect("Not a float column");
                values.iter().collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(feature = "polars")]
impl ResultColumns for polars::prelude::DataFrame {
    fn f64_values(&self, column: &str) -> Vec<Option<f64>> {
        let values = self
            .column(column)
            .unwrap_or_else(|_| panic!("Missing column {}", column))
            .cast(&polars::prelude::DataType::Float64)
            .expect("Failed to cast column");
        values
            .as_materialized_series()
            .f64()
            .expect("Not a float column")
            .into_iter()
            .collect()
    }
}

/// Non-null finite values of `column`, ascending
fn sorted<R: ResultColumns>(result: &R, column: &str) -> Vec<f64> {
    let mut values: Vec<f64> = result
        .f64_values(column)
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

fn assert_values<R: ResultColumns>(result: &R, column: &str, expected: &[f64], context: &str) {
    let actual = sorted(result, column);
    assert_eq!(actual.len(), expected.len(), "{} {}: {:?}", context, column, actual);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{} {}: {:?} != {:?}", context, column, actual, expected);
    }
}

fn check_groupby_values<R: ResultColumns>(name: &str, result: &R) {
    let context = format!("groupby {}", name);
    let context = context.as_str();
    match name {
        "q01" => assert_values(result, "v1", &[3.0, 7.0, 11.0], context),
        "q02" => assert_values(result, "v1", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], context),
        "q03" => {
            assert_values(result, "v1", &[3.0, 7.0, 11.0], context);
            assert_values(result, "v3", &[2.0, 4.0, 6.0], context);
        }
        "q04" => {
            assert_values(result, "v1", &[3.0, 4.0], context);
            assert_values(result, "v2", &[2.0, 3.0], context);
            assert_values(result, "v3", &[3.5, 4.5], context);
        }
        "q05" => {
            assert_values(result, "v1", &[6.0, 6.0, 9.0], context);
            assert_values(result, "v2", &[0.0, 3.0, 12.0], context);
            assert_values(result, "v3", &[6.5, 7.5, 10.0], context);
        }
        "q06" => {
            assert_values(result, "median_v3", &[2.5, 3.5, 3.5, 5.5], context);
            // Single-row groups have no sample deviation
            assert_values(result, "sd_v3", &[2f64.sqrt(), 8f64.sqrt()], context);
        }
        "q07" => assert_values(result, "range_v1_v2", &[-2.0, 2.0, 6.0], context),
        "q08" => assert_values(result, "v3", &[2.5, 3.5, 4.5, 5.5, 6.5], context),
        "q09" => assert_values(result, "r2", &[1.0, 1.0], context),
        "q10" => {
            assert_values(result, "count", &[1.0; 6], context);
            assert_values(result, "v3", &[1.5, 2.5, 3.5, 4.5, 5.5, 6.5], context);
        }
        _ => panic!("No expected values for {}", context),
    }
}

fn check_join_values<R: ResultColumns>(name: &str, result: &R) {
    let context = format!("join {}", name);
    let context = context.as_str();
    match name {
        "q01" => {
            assert_values(result, "v1", &[1.0, 2.0], context);
            assert_values(result, "v2", &[10.0, 20.0], context);
        }
        "q02" | "q04" => assert_values(result, "v2", &[10.0, 20.0, 30.0], context),
        "q03" => {
            assert_values(result, "v2", &[10.0, 20.0, 30.0], context);
            let nulls = result.f64_values("v2").iter().filter(|v| v.is_none()).count();
            assert_eq!(nulls, 1, "{}: unmatched driver rows keep a null v2", context);
        }
        "q05" => assert_values(result, "v2", &[10.0, 20.0], context),
        _ => panic!("No expected values for {}", context),
    }
}

/// Run every catalogued query by hand and compare result sizes and values
async fn check_results<B>(backend: &B, paths: &DatasetPaths)
where
    B: Backend,
    B::Materialized: ResultColumns,
{
    let frame = backend
        .load_groupby_data(paths)
        .await
        .expect("Failed to load groupby data");
    let frame = backend.trigger_loading(frame).await.expect("Failed to trigger loading");

    for (name, expected) in GROUPBY_ROWS {
        let query = backend.groupby_queries().get(name).expect("Missing groupby query");
        let output = query(&frame).expect("Failed to build query");
        let result = backend
            .trigger_execution(output)
            .await
            .unwrap_or_else(|e| panic!("groupby {} failed: {}", name, e));
        assert_eq!(B::row_count(&result), expected, "groupby {}", name);
        check_groupby_values(name, &result);
    }

    let loaded = backend.load_join_data(paths).await.expect("Failed to load join data");
    let tables = JoinTables {
        df: backend.trigger_loading(loaded.df).await.unwrap(),
        small: backend.trigger_loading(loaded.small).await.unwrap(),
        medium: backend.trigger_loading(loaded.medium).await.unwrap(),
        big: backend.trigger_loading(loaded.big).await.unwrap(),
    };

    for (name, expected) in JOIN_ROWS {
        let query = backend.join_queries().get(name).expect("Missing join query");
        let output = query(&tables).expect("Failed to build query");
        let result = backend
            .trigger_execution(output)
            .await
            .unwrap_or_else(|e| panic!("join {} failed: {}", name, e));
        assert_eq!(B::row_count(&result), expected, "join {}", name);
        check_join_values(name, &result);
    }
}

#[tokio::test]
async fn test_datafusion_queries() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture(dir.path());

    let backend = DataFusionBackend::new(BackendOptions::default()).unwrap();
    check_results(&backend, &paths).await;
}

#[tokio::test]
async fn test_datafusion_experimental_groupby_gives_same_results() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture(dir.path());

    let backend = DataFusionBackend::new(BackendOptions {
        experimental_groupby: true,
    })
    .unwrap();
    check_results(&backend, &paths).await;
}

#[tokio::test]
async fn test_datafusion_sql_queries() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture(dir.path());

    let backend = DataFusionSqlBackend::new(BackendOptions::default()).unwrap();
    check_results(&backend, &paths).await;
}

#[cfg(feature = "polars")]
#[tokio::test]
async fn test_polars_queries() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture(dir.path());

    let backend = h2o_bench::backends::polars_df::PolarsBackend::new(BackendOptions::default()).unwrap();
    check_results(&backend, &paths).await;
}

#[tokio::test]
async fn test_sql_backend_can_run_twice() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture(dir.path());
    let task = h2o_bench::TaskSelector::parse("q01").unwrap();

    let backend = DataFusionSqlBackend::new(BackendOptions::default()).unwrap();
    let first = h2o_bench::run(&backend, &paths, &task).await.expect("First run failed");
    let second = h2o_bench::run(&backend, &paths, &task).await.expect("Second run failed");

    assert_eq!(first.labels(), second.labels());
}

async fn run_selected(backend: &str, task: &str) -> Vec<String> {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let config = RunConfig {
        data_file: dir.path().to_path_buf(),
        backend: backend.to_string(),
        task: task.to_string(),
        ..RunConfig::default()
    };

    let log = h2o_bench::run_benchmark(&config)
        .await
        .unwrap_or_else(|e| panic!("{} run failed: {}", backend, e));
    log.labels().into_iter().map(String::from).collect()
}

#[tokio::test]
async fn test_end_to_end_selection_for_every_backend() {
    let expected = vec![
        "groupby",
        "groupby.load_data",
        "groupby.ops",
        "groupby.ops.q01",
        "groupby.ops.q05",
        "join",
        "join.load_data",
        "join.ops",
        "join.ops.q01",
        "join.ops.q05",
    ];

    for backend in h2o_bench::registry::available_backends() {
        assert_eq!(run_selected(backend, "q0[15]").await, expected, "{}", backend);
    }
}

#[tokio::test]
async fn test_legacy_identifier_runs_default_backend() {
    let labels = run_selected("pandas", "join").await;

    assert_eq!(labels.len(), 3 + 5);
    assert!(labels.iter().all(|l| l.starts_with("join")));
}
