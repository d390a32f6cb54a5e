use h2o_dataset::SizeTag;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::BackendOptions;
use crate::error::Result;
use crate::registry::DEFAULT_BACKEND;
use crate::timer::MeasurementLog;

/// Parameters of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding the generated CSV files
    pub data_file: PathBuf,
    /// Backend identifier; unknown identifiers fall back to the default backend
    #[serde(alias = "pandas_mode")]
    pub backend: String,
    /// `small`, `medium` or `large` (`big` is accepted too)
    pub size: String,
    /// `all`, `groupby`, `join` or a query-name regex
    pub task: String,
    #[serde(alias = "modin_exp_gb")]
    pub exp_groupby: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("."),
            backend: DEFAULT_BACKEND.to_string(),
            size: SizeTag::Small.to_string(),
            task: "all".to_string(),
            exp_groupby: false,
        }
    }
}

impl RunConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn size(&self) -> Result<SizeTag> {
        Ok(self.size.parse::<SizeTag>()?)
    }

    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            experimental_groupby: self.exp_groupby,
        }
    }
}

/// Final report handed to whoever collects benchmark results
#[derive(Debug, Serialize)]
pub struct BenchmarkReport<'a> {
    pub backend: &'a str,
    pub config: &'a RunConfig,
    pub measurements: &'a MeasurementLog,
}

impl BenchmarkReport<'_> {
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
