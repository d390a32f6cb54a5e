//! Harness for the H2O db-benchmark group-by and join workloads.
//!
//! A [`Backend`] adapts one execution engine; the [`registry`] maps backend
//! identifiers to factories and [`run_benchmark`] drives a whole run,
//! producing a [`MeasurementLog`] of nested phase and query timings.

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod registry;
pub mod runner;
pub mod schema;
pub mod task;
pub mod timer;

pub use backend::{Backend, BackendOptions, JoinTables, QueryCatalog, Workload};
pub use config::{BenchmarkReport, RunConfig};
pub use error::{Error, Result};
pub use runner::{run, run_benchmark, BenchmarkBackend};
pub use task::TaskSelector;
pub use timer::{MeasurementLog, Timer};
