//! Run one backend against a local dataset and print the timings.
//!
//! Usage: `cargo run --example run_backend -- <data dir> [backend] [task]`

use h2o_bench::{registry, run_benchmark, RunConfig};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let data_file = args.next().unwrap_or_else(|| "/tmp/h2o".to_string());

    let config = RunConfig {
        data_file: data_file.into(),
        backend: args.next().unwrap_or_else(|| registry::DEFAULT_BACKEND.to_string()),
        task: args.next().unwrap_or_else(|| "all".to_string()),
        ..RunConfig::default()
    };

    println!("=== H2O Benchmark ===");
    println!("Backend: {}", registry::canonical_name(&config.backend));
    println!("Data:    {}\n", config.data_file.display());

    let log = run_benchmark(&config).await?;
    print!("{}", log);

    for phase in ["groupby", "join"] {
        if let Some(total) = log.get(phase) {
            println!("{} queries: {:?}", phase, log.children_total(&format!("{}.ops", phase)));
            println!("{} total:   {:?}", phase, total);
        }
    }

    Ok(())
}
