//! H2O db-benchmark runner

use clap::Parser;
use h2o_bench::{registry, run_benchmark, BenchmarkReport, Result, RunConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the generated CSV files
    #[arg(long, env = "H2O_DATA_DIR")]
    data_file: Option<PathBuf>,

    /// Backend identifier; unknown identifiers run the default backend
    #[arg(long, visible_alias = "pandas-mode")]
    backend: Option<String>,

    /// Dataset size: small, medium, large (or big)
    #[arg(long)]
    size: Option<String>,

    /// all, groupby, join or a regex over query names
    #[arg(long)]
    task: Option<String>,

    /// Use the backend's experimental group-by mode
    #[arg(long, visible_alias = "modin-exp-gb", default_value_t = false)]
    exp_groupby: bool,

    /// JSON run configuration; flags given on the command line take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a JSON report here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the backends compiled into this build and exit
    #[arg(long, default_value_t = false)]
    list_backends: bool,
}

impl Args {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(data_file) = self.data_file {
            config.data_file = data_file;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(task) = self.task {
            config.task = task;
        }
        if self.exp_groupby {
            config.exp_groupby = true;
        }
        Ok(config)
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("h2o_bench=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let output = args.output.clone();
    let config = args.into_config()?;
    info!(?config, "run configuration");

    let measurements = run_benchmark(&config).await?;
    print!("{}", measurements);

    if let Some(path) = output {
        let report = BenchmarkReport {
            backend: registry::canonical_name(&config.backend),
            config: &config,
            measurements: &measurements,
        };
        report.write_json(&path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    if args.list_backends {
        for name in registry::available_backends() {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("benchmark failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
