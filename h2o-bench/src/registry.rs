//! Backend identifier resolution.
//!
//! A fixed table of overrides is consulted first; every other identifier
//! (including the historical pandas mode names) gets the default backend.

use crate::backend::BackendOptions;
use crate::backends::datafusion_df::DataFusionBackend;
use crate::backends::datafusion_sql::DataFusionSqlBackend;
use crate::error::{Error, Result};
use crate::runner::BenchmarkBackend;

pub type BackendFactory = fn(&BackendOptions) -> Result<Box<dyn BenchmarkBackend>>;

pub const DEFAULT_BACKEND: &str = "datafusion";

struct BackendEntry {
    name: &'static str,
    /// `None` when the backend was left out of this build
    factory: Option<BackendFactory>,
}

const OVERRIDES: &[BackendEntry] = &[
    BackendEntry {
        name: "datafusion-sql",
        factory: Some(new_datafusion_sql),
    },
    BackendEntry {
        name: "polars",
        factory: POLARS_FACTORY,
    },
];

#[cfg(feature = "polars")]
const POLARS_FACTORY: Option<BackendFactory> = Some(new_polars);
#[cfg(not(feature = "polars"))]
const POLARS_FACTORY: Option<BackendFactory> = None;

/// Map a backend identifier to its factory
pub fn resolve(identifier: &str) -> Result<BackendFactory> {
    match OVERRIDES.iter().find(|entry| entry.name == identifier) {
        Some(entry) => entry.factory.ok_or_else(|| {
            Error::Config(format!(
                "backend '{}' is not available in this build (enable the '{}' feature)",
                entry.name, entry.name
            ))
        }),
        None => Ok(new_datafusion),
    }
}

/// Name of the backend `identifier` resolves to
pub fn canonical_name(identifier: &str) -> &'static str {
    OVERRIDES
        .iter()
        .find(|entry| entry.name == identifier)
        .map(|entry| entry.name)
        .unwrap_or(DEFAULT_BACKEND)
}

/// Identifiers that resolve to a distinct backend in this build
pub fn available_backends() -> Vec<&'static str> {
    std::iter::once(DEFAULT_BACKEND)
        .chain(
            OVERRIDES
                .iter()
                .filter(|entry| entry.factory.is_some())
                .map(|entry| entry.name),
        )
        .collect()
}

fn new_datafusion(options: &BackendOptions) -> Result<Box<dyn BenchmarkBackend>> {
    Ok(Box::new(DataFusionBackend::new(*options)?))
}

fn new_datafusion_sql(options: &BackendOptions) -> Result<Box<dyn BenchmarkBackend>> {
    Ok(Box::new(DataFusionSqlBackend::new(*options)?))
}

#[cfg(feature = "polars")]
fn new_polars(options: &BackendOptions) -> Result<Box<dyn BenchmarkBackend>> {
    Ok(Box::new(crate::backends::polars_df::PolarsBackend::new(*options)?))
}
