//! Run orchestration: resolve, load, trigger, time.
//!
//! Each workload is timed as `<workload>` with two children, `load_data`
//! (load plus forced materialization) and `ops` (one child per query).
//! A workload whose filtered query set is empty is skipped entirely.

use async_trait::async_trait;
use h2o_dataset::DatasetPaths;
use std::future::Future;
use tracing::{debug, info};

use crate::backend::{Backend, JoinTables, Workload};
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::registry;
use crate::task::{QueryView, TaskSelector};
use crate::timer::{MeasurementLog, Timer};

const LOAD_SCOPE: &str = "load_data";
const OPS_SCOPE: &str = "ops";

/// Object-safe face of [`Backend`], handed out by the registry
#[async_trait]
pub trait BenchmarkBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Declared query names of a workload, in catalogue order
    fn query_names(&self, workload: Workload) -> Vec<&'static str>;

    async fn run(&self, paths: &DatasetPaths, task: &TaskSelector) -> Result<MeasurementLog>;
}

#[async_trait]
impl<B: Backend> BenchmarkBackend for B {
    fn name(&self) -> &'static str {
        Backend::name(self)
    }

    fn query_names(&self, workload: Workload) -> Vec<&'static str> {
        match workload {
            Workload::Groupby => self.groupby_queries().names(),
            Workload::Join => self.join_queries().names(),
        }
    }

    async fn run(&self, paths: &DatasetPaths, task: &TaskSelector) -> Result<MeasurementLog> {
        run(self, paths, task).await
    }
}

/// Run a whole benchmark from configuration
pub async fn run_benchmark(config: &RunConfig) -> Result<MeasurementLog> {
    let size = config.size()?;
    let task = TaskSelector::parse(&config.task)?;

    let paths = h2o_dataset::resolve(&config.data_file, size)?;
    debug!(?paths, "resolved dataset paths");

    let factory = registry::resolve(&config.backend)?;
    let backend = factory(&config.backend_options())?;
    info!(
        backend = backend.name(),
        requested = %config.backend,
        %size,
        %task,
        "starting benchmark"
    );

    backend.run(&paths, &task).await
}

/// Run the selected workloads of `backend` against `paths`
pub async fn run<B: Backend>(backend: &B, paths: &DatasetPaths, task: &TaskSelector) -> Result<MeasurementLog> {
    let mut timer = Timer::new();

    let groupby = task.filter(Workload::Groupby, backend.groupby_queries());
    let load = async {
        let frame = backend.load_groupby_data(paths).await?;
        backend.trigger_loading(frame).await
    };
    run_phase(backend, groupby, load, &mut timer).await?;

    // The four tables are loaded and forced before any query runs
    let join = task.filter(Workload::Join, backend.join_queries());
    let load = async {
        let loaded = backend.load_join_data(paths).await?;
        Ok::<_, Error>(JoinTables {
            df: backend.trigger_loading(loaded.df).await?,
            small: backend.trigger_loading(loaded.small).await?,
            medium: backend.trigger_loading(loaded.medium).await?,
            big: backend.trigger_loading(loaded.big).await?,
        })
    };
    run_phase(backend, join, load, &mut timer).await?;

    timer.finish()
}

/// Time one workload: `load` under `load_data`, then every query under `ops`.
///
/// Returns without touching the timer, and without polling `load`, if no
/// query is selected.
async fn run_phase<B, I, L>(
    backend: &B,
    queries: QueryView<'_, fn(&I) -> Result<B::Output>>,
    load: L,
    timer: &mut Timer,
) -> Result<()>
where
    B: Backend,
    I: Send + Sync,
    L: Future<Output = Result<I>> + Send,
{
    let workload = queries.workload;
    if queries.is_empty() {
        debug!(backend = Backend::name(backend), %workload, "no queries selected, skipping");
        return Ok(());
    }

    timer.enter(workload.label());

    timer.enter(LOAD_SCOPE);
    let input = load.await?;
    let load_time = timer.exit()?;
    info!(%workload, elapsed = ?load_time, "data loaded");

    timer.enter(OPS_SCOPE);
    for q in queries.iter() {
        timer.enter(q.name);
        let output = (q.query)(&input)?;
        let result = backend.trigger_execution(output).await?;
        let elapsed = timer.exit()?;

        info!(%workload, query = q.name, rows = B::row_count(&result), ?elapsed, "query finished");
        // Free the result before the next query's timer starts
        drop(result);
    }
    timer.exit()?;

    timer.exit()?;
    Ok(())
}
